/*!
iNES (v1) cartridge loader for mapper 0 (NROM).

Header layout: 16 bytes, magic `"NES\x1A"`, byte 4 = PRG banks (16 KiB each),
byte 5 = CHR banks (8 KiB each, 0 => 8 KiB CHR RAM), byte 6 bit 0 = mirroring
(0 horizontal, 1 vertical), bit 2 = trainer present (512 bytes, skipped),
byte 7 upper nibble || byte 6 upper nibble = mapper number. Only mapper 0 is
supported; anything else is a `CartridgeError::UnsupportedMapper`.
*/

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::mapper::Nrom;
use crate::ppu::Mirroring;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartridgeError {
    #[error("truncated iNES image: {0}")]
    Truncated(&'static str),
    #[error("bad iNES header magic (expected \"NES\\x1A\")")]
    BadMagic,
    #[error("unsupported mapper id {0} (only mapper 0 / NROM is supported)")]
    UnsupportedMapper(u16),
    #[error("NES 2.0 header format is not supported")]
    UnsupportedInesVersion,
}

pub struct Cartridge {
    mapper: Nrom,
    chr: Vec<u8>,
    mirroring: Mirroring,
    mapper_id: u16,
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("mapper_id", &self.mapper_id)
            .field("mirroring", &self.mirroring)
            .field("chr_len", &self.chr.len())
            .finish()
    }
}

impl Cartridge {
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < 16 {
            return Err(CartridgeError::Truncated("header"));
        }
        if &data[0..4] != b"NES\x1A" {
            return Err(CartridgeError::BadMagic);
        }

        let prg_16k_units = data[4] as usize;
        let chr_8k_units = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];

        if (flags7 & 0x0C) == 0x08 {
            return Err(CartridgeError::UnsupportedInesVersion);
        }

        let mapper_id = ((flags7 & 0xF0) as u16) | ((flags6 >> 4) as u16);
        if mapper_id != 0 {
            return Err(CartridgeError::UnsupportedMapper(mapper_id));
        }

        let mirroring = if (flags6 & 0b0000_0001) != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let has_trainer = (flags6 & 0b0000_0100) != 0;

        let mut offset = 16usize;
        if has_trainer {
            if data.len() < offset + 512 {
                return Err(CartridgeError::Truncated("trainer"));
            }
            offset += 512;
        }

        let prg_len = prg_16k_units * 16 * 1024;
        if data.len() < offset + prg_len {
            return Err(CartridgeError::Truncated("PRG ROM"));
        }
        let prg_rom = data[offset..offset + prg_len].to_vec();
        offset += prg_len;

        let chr = if chr_8k_units == 0 {
            vec![0; 8 * 1024]
        } else {
            let chr_len = chr_8k_units * 8 * 1024;
            if data.len() < offset + chr_len {
                return Err(CartridgeError::Truncated("CHR ROM"));
            }
            data[offset..offset + chr_len].to_vec()
        };

        tracing::debug!(mapper_id, prg_len, chr_len = chr.len(), ?mirroring, "cartridge parsed");

        Ok(Self {
            mapper: Nrom::new(prg_rom),
            chr,
            mirroring,
            mapper_id,
        })
    }

    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let bytes = fs::read(path).map_err(|_| CartridgeError::Truncated("file read failed"))?;
        Self::from_ines_bytes(&bytes)
    }

    pub fn cpu_read_prg_rom(&self, addr: u16) -> u8 {
        self.mapper.cpu_read(addr)
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Override the mirroring mode read from the iNES header, for carts
    /// whose header lies (or a user who wants to force the other mode).
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.mirroring = mirroring;
    }

    pub fn mapper_id(&self) -> u16 {
        self.mapper_id
    }

    /// Consume the cartridge's CHR copy, handing ownership to the PPU.
    pub fn take_chr(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.chr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_ines;

    #[test]
    fn parse_simple_nrom_32k_chr8k() {
        let flags6 = 0b0000_0001; // vertical mirroring
        let data = build_ines(2, 1, flags6, 0, 1, None);
        let cart = Cartridge::from_ines_bytes(&data).expect("parse");

        assert_eq!(cart.mapper_id(), 0);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        assert_eq!(cart.cpu_read_prg_rom(0x8000), 0xAA);
        assert_eq!(cart.cpu_read_prg_rom(0xFFFF), 0xAA);
    }

    #[test]
    fn parse_nrom_16k_chr_ram() {
        let data = build_ines(1, 0, 0, 0, 0, None);
        let cart = Cartridge::from_ines_bytes(&data).expect("parse");

        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        assert_eq!(cart.cpu_read_prg_rom(0x8000), cart.cpu_read_prg_rom(0xC000));
    }

    #[test]
    fn trainer_moves_data_offset() {
        let trainer = [0u8; 512];
        let flags6 = 0b0000_0100; // trainer present
        let data = build_ines(1, 1, flags6, 0, 1, Some(&trainer));
        let cart = Cartridge::from_ines_bytes(&data).expect("parse");
        assert_eq!(cart.mapper_id(), 0);
    }

    #[test]
    fn ines2_rejected() {
        let data = build_ines(1, 1, 0, 0b0000_1000, 1, None);
        let err = Cartridge::from_ines_bytes(&data).unwrap_err();
        assert_eq!(err, CartridgeError::UnsupportedInesVersion);
    }

    #[test]
    fn unsupported_mapper_rejected() {
        let flags6 = 0x10; // mapper low nibble = 1
        let data = build_ines(1, 1, flags6, 0, 1, None);
        let err = Cartridge::from_ines_bytes(&data).unwrap_err();
        assert_eq!(err, CartridgeError::UnsupportedMapper(1));
    }

    #[test]
    fn bad_magic_rejected() {
        let mut data = build_ines(1, 1, 0, 0, 1, None);
        data[0] = b'X';
        assert_eq!(Cartridge::from_ines_bytes(&data).unwrap_err(), CartridgeError::BadMagic);
    }

    #[test]
    fn truncated_header_rejected() {
        assert_eq!(
            Cartridge::from_ines_bytes(&[0u8; 4]).unwrap_err(),
            CartridgeError::Truncated("header")
        );
    }
}
