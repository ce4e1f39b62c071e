/*!
cpu/mod.rs - public facade over the 6502 CPU implementation.

This is the *only* CPU implementation in the crate. The teacher's original
legacy `Cpu6502`/`cpu6502.rs` monolith (no cycle counting) and this modular
`cpu/` tree used to coexist; per the resolved design note, the richer
modular tree is authoritative and the legacy path is gone.
*/

pub mod addressing;
pub mod dispatch;
pub mod execute;
pub mod state;
pub mod table;

pub use dispatch::CpuError;
pub use state::{
    CpuState, BREAK1, BREAK2, CARRY, DECIMAL, IRQ_DISABLE, NEGATIVE, OVERFLOW, ZERO,
};

use crate::bus::Bus;

/// Owns CPU architectural state and exposes `reset`/`step` to `Machine`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cpu {
    state: CpuState,
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self, bus: &mut Bus) {
        self.state.reset(bus);
    }

    /// Run a single instruction (or service a pending NMI). Returns the
    /// number of CPU cycles consumed.
    pub fn step(&mut self, bus: &mut Bus) -> Result<u32, CpuError> {
        dispatch::step(&mut self.state, bus)
    }

    pub fn halted(&self) -> bool {
        self.state.halted
    }

    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    pub fn cycles(&self) -> u64 {
        self.state.cycles
    }

    pub fn a(&self) -> u8 {
        self.state.a
    }

    pub fn x(&self) -> u8 {
        self.state.x
    }

    pub fn y(&self) -> u8 {
        self.state.y
    }

    pub fn sp(&self) -> u8 {
        self.state.sp
    }

    pub fn status(&self) -> u8 {
        self.state.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge;
    use crate::test_utils::build_nrom_with_prg;

    #[test]
    fn cpu_facade_runs_a_simple_program() {
        let rom = build_nrom_with_prg(&[0xA9, 0x42, 0xEA], 1, 1, None);
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a(), 0x42);
    }
}
