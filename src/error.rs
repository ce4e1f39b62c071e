/*!
Crate-level error aggregation.

Individual subsystems (`cpu`, `ppu`, `cartridge`) define their own
`thiserror` enums for the failures they can actually produce. `NesError`
folds those into one type for callers — `Machine::load`, in particular —
that cross more than one subsystem boundary.
*/

use thiserror::Error;

use crate::bus::BusError;
use crate::cartridge::CartridgeError;
use crate::cpu::CpuError;
use crate::ppu::PpuError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NesError {
    #[error(transparent)]
    Cpu(#[from] CpuError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error(transparent)]
    Ppu(#[from] PpuError),
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cartridge_error_converts_into_nes_error() {
        let err: NesError = CartridgeError::BadMagic.into();
        assert!(matches!(err, NesError::Cartridge(CartridgeError::BadMagic)));
    }
}
