/*!
`Machine`: the top-level facade a host (CLI demo, integration test) drives
instead of wiring `Cpu`/`Bus`/`Cartridge` together by hand.
*/

use crate::bus::Bus;
use crate::cartridge::{Cartridge, CartridgeError};
use crate::config::RunConfig;
use crate::controller::Button;
use crate::cpu::Cpu;
use crate::error::NesError;

pub struct Machine {
    cpu: Cpu,
    bus: Bus,
    config: RunConfig,
    running: bool,
}

impl Machine {
    pub fn new(config: RunConfig) -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new(),
            config,
            running: true,
        }
    }

    /// Parse an iNES image, attach it, and reset the CPU at its reset vector.
    pub fn load(&mut self, rom_bytes: &[u8]) -> Result<(), CartridgeError> {
        let mut cart = Cartridge::from_ines_bytes(rom_bytes)?;
        if let Some(mirroring) = self.config.mirroring_override {
            tracing::debug!(?mirroring, "mirroring override applied");
            cart.set_mirroring(mirroring);
        }
        self.bus.attach_cartridge(cart);
        self.cpu.reset(&mut self.bus);
        self.running = true;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.running = true;
    }

    /// Cooperative shutdown flag: once a fatal error stops `run_until_frame`,
    /// or a host calls `stop`, this stays false until the next `load`/`reset`.
    pub fn running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Step the CPU until the PPU reports a completed frame, an instruction
    /// faults, a rejected PPU write is promoted to a fault (debug builds
    /// only), or (if configured) the cycle budget runs out.
    pub fn run_until_frame(&mut self) -> Result<(), NesError> {
        if !self.running {
            return Ok(());
        }

        let budget = self.config.cycle_budget;
        let start_cycles = self.cpu.cycles();
        loop {
            if let Err(err) = self.cpu.step(&mut self.bus) {
                self.running = false;
                return Err(err.into());
            }
            if let Some(fault) = self.bus.take_fault() {
                self.running = false;
                return Err(fault.into());
            }
            if self.bus.take_frame_complete() {
                return Ok(());
            }
            if let Some(budget) = budget {
                if self.cpu.cycles().saturating_sub(start_cycles) >= budget {
                    tracing::warn!(budget, "cycle budget exhausted before frame completed");
                    return Ok(());
                }
            }
        }
    }

    pub fn framebuffer(&self) -> &[u8] {
        self.bus.ppu().framebuffer()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.bus.controller_mut().set_button(button, pressed);
    }

    /// Set the full 8-bit button state at once; bit layout matches
    /// `Controller`'s A/B/Select/Start/Up/Down/Left/Right order.
    pub fn set_buttons(&mut self, mask: u8) {
        self.bus.controller_mut().set_state_mask(mask);
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_nrom_with_prg;

    #[test]
    fn load_and_run_until_frame_with_budget_stops() {
        let prg = vec![0xEA; 0x4000]; // NOP forever
        let rom = build_nrom_with_prg(&prg, 1, 1, None);
        let mut cfg = RunConfig::default();
        cfg.cycle_budget = Some(200);
        let mut machine = Machine::new(cfg);
        machine.load(&rom).unwrap();
        machine.run_until_frame().unwrap();
        assert!(machine.cpu().cycles() >= 200);
        assert!(machine.running());
    }

    #[test]
    fn set_button_reaches_controller_through_bus() {
        let rom = build_nrom_with_prg(&[0xEA], 1, 1, None);
        let mut machine = Machine::new(RunConfig::default());
        machine.load(&rom).unwrap();
        machine.set_button(Button::A, true);
        machine.bus_mut().controller_mut().write_strobe(1);
        machine.bus_mut().controller_mut().write_strobe(0);
        assert_eq!(machine.bus_mut().controller_mut().read() & 1, 1);
    }

    #[test]
    fn set_buttons_writes_the_full_mask_through_bus() {
        let rom = build_nrom_with_prg(&[0xEA], 1, 1, None);
        let mut machine = Machine::new(RunConfig::default());
        machine.load(&rom).unwrap();
        machine.set_buttons(0b0000_1001); // A + Start
        machine.bus_mut().controller_mut().write_strobe(1);
        machine.bus_mut().controller_mut().write_strobe(0);
        assert_eq!(machine.bus_mut().controller_mut().read() & 1, 1); // A
        assert_eq!(machine.bus_mut().controller_mut().read() & 1, 0); // B
        assert_eq!(machine.bus_mut().controller_mut().read() & 1, 0); // Select
        assert_eq!(machine.bus_mut().controller_mut().read() & 1, 1); // Start
    }

    #[test]
    fn unknown_opcode_stops_the_machine() {
        let rom = build_nrom_with_prg(&[0x02], 1, 1, None); // jam opcode
        let mut machine = Machine::new(RunConfig::default());
        machine.load(&rom).unwrap();
        assert!(machine.run_until_frame().is_err());
        assert!(!machine.running());
    }
}
