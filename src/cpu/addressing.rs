/*!
addressing.rs - 6502 addressing mode resolution.

Overview
========
Provides the `AddrMode` enum (one variant per addressing mode in the 6502
instruction set) and `resolve`, which consumes operand bytes from the
instruction stream via `CpuState::fetch_*`, computes the effective address
(or immediate value, or nothing), and reports whether the computation
crossed a page boundary (for the dispatcher to apply the +1 cycle penalty
on pure reads).

Scope & Responsibilities
========================
- Pure address / operand resolution. Does not tick the bus or decide
  whether a page-cross penalty actually applies to the current opcode
  (store and RMW instructions never take the penalty even though they use
  an indexed mode) - that decision belongs to `table.rs` / `dispatch.rs`.
- Implements the 6502 JMP (indirect) page-wrap bug faithfully.

Caller Assumptions
==================
- `cpu.pc` points at the first operand byte (the opcode byte itself has
  already been fetched) when `resolve` is invoked.
*/

use crate::bus::Bus;
use crate::cpu::state::CpuState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    Implicit,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
}

impl AddrMode {
    /// Number of operand bytes following the opcode.
    pub const fn operand_len(self) -> u16 {
        match self {
            AddrMode::Implicit | AddrMode::Accumulator => 0,
            AddrMode::Immediate
            | AddrMode::ZeroPage
            | AddrMode::ZeroPageX
            | AddrMode::ZeroPageY
            | AddrMode::Relative
            | AddrMode::IndirectX
            | AddrMode::IndirectY => 1,
            AddrMode::Absolute | AddrMode::AbsoluteX | AddrMode::AbsoluteY | AddrMode::Indirect => {
                2
            }
        }
    }

    /// Whether this mode is capable of a page-cross penalty at all (applied
    /// by the dispatcher only for pure-read instructions).
    pub const fn can_page_cross(self) -> bool {
        matches!(
            self,
            AddrMode::AbsoluteX | AddrMode::AbsoluteY | AddrMode::IndirectY | AddrMode::Relative
        )
    }
}

/// The resolved operand: either a concrete memory address, an immediate
/// value, or nothing (implicit/accumulator).
#[derive(Debug, Clone, Copy)]
pub enum Operand {
    None,
    Accumulator,
    Immediate(u8),
    Address(u16),
}

impl Operand {
    pub fn address(self) -> u16 {
        match self {
            Operand::Address(a) => a,
            _ => panic!("operand has no effective address"),
        }
    }
}

/// Resolve `mode`'s operand against current CPU/bus state.
///
/// Returns `(operand, page_crossed)`. `page_crossed` is meaningful only for
/// modes where `AddrMode::can_page_cross` is true; callers must not apply the
/// penalty for store/RMW instructions regardless of this flag.
pub fn resolve(mode: AddrMode, cpu: &mut CpuState, bus: &mut Bus) -> (Operand, bool) {
    match mode {
        AddrMode::Implicit => (Operand::None, false),
        AddrMode::Accumulator => (Operand::Accumulator, false),
        AddrMode::Immediate => {
            let v = cpu.fetch_u8(bus);
            (Operand::Immediate(v), false)
        }
        AddrMode::ZeroPage => {
            let zp = cpu.fetch_u8(bus) as u16;
            (Operand::Address(zp), false)
        }
        AddrMode::ZeroPageX => {
            let zp = cpu.fetch_u8(bus);
            let addr = zp.wrapping_add(cpu.x) as u16;
            (Operand::Address(addr), false)
        }
        AddrMode::ZeroPageY => {
            let zp = cpu.fetch_u8(bus);
            let addr = zp.wrapping_add(cpu.y) as u16;
            (Operand::Address(addr), false)
        }
        AddrMode::Relative => {
            let offset = cpu.fetch_u8(bus) as i8;
            // PC after reading this operand byte is "PC_after".
            let base = cpu.pc;
            let target = base.wrapping_add(offset as i16 as u16);
            let crossed = (base & 0xFF00) != (target & 0xFF00);
            (Operand::Address(target), crossed)
        }
        AddrMode::Absolute => {
            let addr = cpu.fetch_u16(bus);
            (Operand::Address(addr), false)
        }
        AddrMode::AbsoluteX => {
            let base = cpu.fetch_u16(bus);
            let addr = base.wrapping_add(cpu.x as u16);
            let crossed = (base & 0xFF00) != (addr & 0xFF00);
            (Operand::Address(addr), crossed)
        }
        AddrMode::AbsoluteY => {
            let base = cpu.fetch_u16(bus);
            let addr = base.wrapping_add(cpu.y as u16);
            let crossed = (base & 0xFF00) != (addr & 0xFF00);
            (Operand::Address(addr), crossed)
        }
        AddrMode::Indirect => {
            let ptr = cpu.fetch_u16(bus);
            let addr = read_u16_page_wrap_bug(bus, ptr);
            (Operand::Address(addr), false)
        }
        AddrMode::IndirectX => {
            let zp = cpu.fetch_u8(bus);
            let ptr = zp.wrapping_add(cpu.x);
            let addr = read_u16_zp_wrap(bus, ptr);
            (Operand::Address(addr), false)
        }
        AddrMode::IndirectY => {
            let zp = cpu.fetch_u8(bus);
            let base = read_u16_zp_wrap(bus, zp);
            let addr = base.wrapping_add(cpu.y as u16);
            let crossed = (base & 0xFF00) != (addr & 0xFF00);
            (Operand::Address(addr), crossed)
        }
    }
}

/// Read a little-endian word from zero page at `base`, wrapping within page 0
/// (so a base of 0xFF reads bytes at 0xFF and 0x00, not 0x100).
fn read_u16_zp_wrap(bus: &mut Bus, base: u8) -> u16 {
    let lo = bus.read(base as u16) as u16;
    let hi = bus.read(base.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}

/// Read a little-endian word at `addr`, reproducing the 6502 JMP (indirect)
/// page-wrap bug: when the low byte of `addr` is 0xFF, the high byte is
/// fetched from the *same page's* 0x00 offset instead of crossing into the
/// next page.
fn read_u16_page_wrap_bug(bus: &mut Bus, addr: u16) -> u16 {
    let lo = bus.read(addr) as u16;
    let hi_addr = if addr & 0x00FF == 0x00FF {
        addr & 0xFF00
    } else {
        addr.wrapping_add(1)
    };
    let hi = bus.read(hi_addr) as u16;
    (hi << 8) | lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge;
    use crate::test_utils::build_nrom_with_prg;

    fn setup(prg: &[u8]) -> (CpuState, Bus) {
        let rom = build_nrom_with_prg(prg, 1, 1, None);
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = CpuState::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    #[test]
    fn zero_page_x_wraps_within_page() {
        let (mut cpu, mut bus) = setup(&[0x00, 0xFF]);
        cpu.pc = 0x8000;
        cpu.x = 0xFF;
        let (op, crossed) = resolve(AddrMode::ZeroPageX, &mut cpu, &mut bus);
        assert!(!crossed);
        match op {
            Operand::Address(a) => assert_eq!(a, 0x00FF),
            _ => panic!("expected address"),
        }
    }

    #[test]
    fn absolute_x_detects_page_cross() {
        let (mut cpu, mut bus) = setup(&[0xFF, 0x00]); // base $00FF
        cpu.pc = 0x8000;
        cpu.x = 0x01;
        let (op, crossed) = resolve(AddrMode::AbsoluteX, &mut cpu, &mut bus);
        assert!(crossed);
        match op {
            Operand::Address(a) => assert_eq!(a, 0x0100),
            _ => panic!("expected address"),
        }
    }

    #[test]
    fn indirect_jmp_page_wrap_bug() {
        let (_cpu, mut bus) = setup(&[0xEA]);
        bus.write(0x30FF, 0x40);
        bus.write(0x3000, 0x80); // NOT 0x3100
        bus.write(0x3100, 0x12);
        let addr = read_u16_page_wrap_bug(&mut bus, 0x30FF);
        assert_eq!(addr, 0x8040);
    }

    #[test]
    fn indirect_x_wraps_in_zero_page() {
        let (mut cpu, mut bus) = setup(&[0x00]);
        bus.write(0x00FF, 0x34);
        bus.write(0x0000, 0x12);
        cpu.pc = 0x8000;
        cpu.x = 0xFF;
        let (op, crossed) = resolve(AddrMode::IndirectX, &mut cpu, &mut bus);
        assert!(!crossed);
        match op {
            Operand::Address(a) => assert_eq!(a, 0x1234),
            _ => panic!("expected address"),
        }
    }

    #[test]
    fn relative_branch_page_cross_detection() {
        let (mut cpu, mut bus) = setup(&[0x7F]);
        cpu.pc = 0x80FE; // after reading operand PC will be 0x80FF, +0x7F crosses page
        let (_op, crossed) = resolve(AddrMode::Relative, &mut cpu, &mut bus);
        assert!(crossed);
    }
}
