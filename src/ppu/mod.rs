/*!
PPU: CPU-visible register interface, VRAM/OAM/palette memory model, dot-clock
timing with vblank/NMI generation, and once-per-frame background+sprite
rendering into an RGB framebuffer.

The PPU owns its CHR data directly (copied in at cartridge-attach time) and
its own VRAM/palette/OAM; it has no back-reference to the bus or cartridge.
NMI is a polled, edge-triggered, consume-on-read flag (`take_nmi_request`)
that the bus surfaces to the CPU — see `DESIGN.md` for why this replaces the
teacher's `PpuBus` trait indirection.
*/

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) mod memory;
pub(crate) mod registers;
pub(crate) mod renderer;

/// Screen width in pixels.
pub const NES_WIDTH: usize = 256;
/// Screen height in pixels.
pub const NES_HEIGHT: usize = 240;
/// RGB bytes per pixel.
pub const BYTES_PER_PIXEL: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PpuError {
    #[error("write to CHR ROM space rejected at ${addr:04X}")]
    ChrWrite { addr: u16 },
    #[error("PPU address ${addr:04X} out of mapped range")]
    UnmappedRead { addr: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mirroring {
    #[default]
    Horizontal,
    Vertical,
}

/// Canonical NES master palette (RGB).
const NES_PALETTE: [[u8; 3]; 64] = [
    [0x75, 0x75, 0x75],
    [0x27, 0x1B, 0x8F],
    [0x00, 0x00, 0xAB],
    [0x47, 0x00, 0x9F],
    [0x8F, 0x00, 0x77],
    [0xAB, 0x00, 0x13],
    [0xA7, 0x00, 0x00],
    [0x7F, 0x0B, 0x00],
    [0x43, 0x2F, 0x00],
    [0x00, 0x47, 0x00],
    [0x00, 0x51, 0x00],
    [0x00, 0x3F, 0x17],
    [0x1B, 0x3F, 0x5F],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xBC, 0xBC, 0xBC],
    [0x00, 0x73, 0xEF],
    [0x23, 0x3B, 0xEF],
    [0x83, 0x00, 0xF3],
    [0xBF, 0x00, 0xBF],
    [0xE7, 0x00, 0x5B],
    [0xDB, 0x2B, 0x00],
    [0xCB, 0x4F, 0x0F],
    [0x8B, 0x73, 0x00],
    [0x00, 0x97, 0x00],
    [0x00, 0xAB, 0x00],
    [0x00, 0x93, 0x3B],
    [0x00, 0x83, 0x8B],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF],
    [0x3F, 0xBF, 0xFF],
    [0x5F, 0x97, 0xFF],
    [0xA7, 0x8B, 0xFD],
    [0xF7, 0x7B, 0xFF],
    [0xFF, 0x77, 0xB7],
    [0xFF, 0x77, 0x63],
    [0xFF, 0x9B, 0x3B],
    [0xF3, 0xBF, 0x3F],
    [0x83, 0xD3, 0x13],
    [0x4F, 0xDF, 0x4B],
    [0x58, 0xF8, 0x98],
    [0x00, 0xEB, 0xDB],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF],
    [0xAB, 0xE7, 0xFF],
    [0xC7, 0xD7, 0xFF],
    [0xD7, 0xCB, 0xFF],
    [0xFF, 0xC7, 0xFF],
    [0xFF, 0xC7, 0xDB],
    [0xFF, 0xBF, 0xB3],
    [0xFF, 0xDB, 0xAB],
    [0xFF, 0xE7, 0xA3],
    [0xE3, 0xFF, 0xA3],
    [0xAB, 0xF3, 0xBF],
    [0xB3, 0xFF, 0xCF],
    [0x9F, 0xFF, 0xF3],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
];

pub struct Ppu {
    // CPU-visible register mirrors
    ctrl: u8,     // $2000
    mask: u8,     // $2001
    status: u8,   // $2002 (bit7=vblank, bit6=sprite0 hit, bit5=sprite overflow)
    oam_addr: u8, // $2003

    // Write toggle + scroll latches
    write_toggle: bool,
    scroll_x: u8,
    scroll_y: u8,

    // VRAM addressing & buffered read
    vram_addr: u16,
    vram_buffer: u8,

    // 2 KiB nametable RAM, mirrored to 4 logical tables per `mirroring`.
    vram: [u8; 0x0800],
    // 32-byte palette RAM.
    palette: [u8; 32],
    // 8 KiB CHR, copied in from the cartridge at attach time. Read-only.
    chr: Vec<u8>,
    mirroring: Mirroring,

    // OAM (Object Attribute Memory): 64 sprites * 4 bytes
    oam: [u8; 256],

    // Timing: dot in 0..=340, scanline in 0..=261 (261 is pre-render)
    dot: u16,
    scanline: u16,
    frame_complete: bool,
    nmi_latch: bool,

    // Output framebuffer (RGB, 256x240)
    framebuffer: Vec<u8>,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            write_toggle: false,
            scroll_x: 0,
            scroll_y: 0,
            vram_addr: 0,
            vram_buffer: 0,
            vram: [0; 0x0800],
            palette: [0; 32],
            chr: vec![0; 0x2000],
            mirroring: Mirroring::Horizontal,
            oam: [0; 256],
            dot: 0,
            scanline: 261,
            frame_complete: false,
            nmi_latch: false,
            framebuffer: vec![0; NES_WIDTH * NES_HEIGHT * BYTES_PER_PIXEL],
        }
    }

    pub fn reset(&mut self) {
        self.ctrl = 0;
        self.mask = 0;
        self.status = 0;
        self.oam_addr = 0;
        self.write_toggle = false;
        self.scroll_x = 0;
        self.scroll_y = 0;
        self.vram_addr = 0;
        self.vram_buffer = 0;
        self.vram.fill(0);
        self.palette.fill(0);
        self.oam.fill(0);
        self.dot = 0;
        self.scanline = 261;
        self.frame_complete = false;
        self.nmi_latch = false;
        self.framebuffer.fill(0);
    }

    /// Copy in cartridge CHR data and its nametable mirroring mode. Called
    /// once when a cartridge is attached to the bus.
    pub fn attach_chr(&mut self, chr: Vec<u8>, mirroring: Mirroring) {
        self.chr = chr;
        self.mirroring = mirroring;
    }

    /// Read-only framebuffer slice (RGB, row-major, 3 bytes/pixel).
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    pub fn write_reg(&mut self, addr: u16, value: u8) -> Result<(), PpuError> {
        self.write_reg_inner(addr, value)
    }

    /// Read CPU-facing PPU register ($2000..$2007, mirrored every 8 bytes).
    pub fn read_reg(&mut self, addr: u16) -> u8 {
        self.read_reg_inner(addr)
    }

    /// OAM DMA copy (256 bytes), starting at the current OAMADDR.
    pub fn oam_dma_copy(&mut self, data: &[u8]) {
        self.oam_dma_copy_inner(data);
    }

    // Flag setters
    pub fn set_vblank(&mut self, on: bool) {
        if on {
            self.status |= 0x80;
        } else {
            self.status &= !0x80;
        }
    }
    pub fn set_sprite_zero_hit(&mut self, on: bool) {
        if on {
            self.status |= 0x40;
        } else {
            self.status &= !0x40;
        }
    }
    pub fn set_sprite_overflow(&mut self, on: bool) {
        if on {
            self.status |= 0x20;
        } else {
            self.status &= !0x20;
        }
    }

    // Flag queries
    pub fn vblank(&self) -> bool {
        (self.status & 0x80) != 0
    }
    pub fn sprite_zero_hit(&self) -> bool {
        (self.status & 0x40) != 0
    }
    pub fn sprite_overflow(&self) -> bool {
        (self.status & 0x20) != 0
    }
    pub fn nmi_enabled(&self) -> bool {
        (self.ctrl & 0x80) != 0
    }

    // VRAM/OAM convenience (raw, address-masked; no register side effects)
    pub fn peek_vram(&self, addr: u16) -> u8 {
        self.peek_vram_inner(addr)
    }
    pub fn poke_vram(&mut self, addr: u16, value: u8) -> Result<(), PpuError> {
        self.poke_vram_inner(addr, value)
    }
    pub fn peek_oam(&self, idx: usize) -> u8 {
        self.peek_oam_inner(idx)
    }
    pub fn poke_oam(&mut self, idx: usize, value: u8) {
        self.poke_oam_inner(idx, value);
    }

    // Frame completion & NMI latch
    pub fn frame_complete(&self) -> bool {
        self.frame_complete
    }
    pub fn take_frame_complete(&mut self) -> bool {
        let was = self.frame_complete;
        self.frame_complete = false;
        was
    }
    pub fn take_nmi_request(&mut self) -> bool {
        let was = self.nmi_latch;
        self.nmi_latch = false;
        was
    }

    pub fn get_ctrl(&self) -> u8 {
        self.ctrl
    }
    pub fn vram_increment_step(&self) -> u16 {
        if (self.ctrl & 0x04) != 0 { 32 } else { 1 }
    }
    pub fn get_vram_addr(&self) -> u16 {
        self.vram_addr
    }
    pub fn set_vram_addr(&mut self, a: u16) {
        self.vram_addr = a & 0x3FFF;
    }
    pub fn get_write_toggle(&self) -> bool {
        self.write_toggle
    }
    pub fn set_write_toggle(&mut self, on: bool) {
        self.write_toggle = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ppu_starts_in_pre_render_with_blank_framebuffer() {
        let p = Ppu::new();
        assert_eq!(p.framebuffer().len(), NES_WIDTH * NES_HEIGHT * BYTES_PER_PIXEL);
        assert!(p.framebuffer().iter().all(|&b| b == 0));
    }
}
