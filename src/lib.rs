#![doc = r#"
8-bit home-console emulator core.

Modules:
- apu: APU register placeholder ($4000-$4015, $4017)
- bus: address decoding, mirroring, OAM DMA, PPU ticking, NMI pickup
- cartridge: iNES v1 loader (mapper 0 / NROM only)
- config: `RunConfig`, loadable from TOML
- controller: NES controller shift-register abstraction
- cpu: 6502 core with cycle-accurate timing for documented + unofficial opcodes
- error: `NesError`, aggregating the per-subsystem error enums
- machine: `Machine` facade tying Cpu/Bus/Cartridge together for a host
- mapper: NROM (mapper 0) PRG ROM mapping
- ppu: register interface, VRAM/OAM/palette memory, dot-clock timing, rendering

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod machine;
pub mod mapper;
pub mod ppu;

pub use bus::Bus;
pub use cartridge::Cartridge;
pub use config::RunConfig;
pub use cpu::Cpu;
pub use error::NesError;
pub use machine::Machine;

#[cfg(test)]
pub mod test_utils;
