/*!
Dot-clock timing (`tick`) and once-per-frame background+sprite rendering
(`render_frame`).

Rendering is frame-level rather than per-dot: the background and sprite
planes are composed in one pass when the host asks for a frame, matching the
budget for this core (full per-dot pixel pipelines buy very little fidelity
here). Only the flags that must be observable mid-frame — vblank, NMI,
sprite-0-hit, sprite-overflow, OAM address forcing — are modeled by `tick`.
*/

use super::{BYTES_PER_PIXEL, NES_HEIGHT, NES_WIDTH, NES_PALETTE, Ppu};

impl Ppu {
    /// Advance one PPU dot (invoked 3x per CPU cycle by the bus).
    pub fn tick(&mut self) {
        self.dot = self.dot.wrapping_add(1);

        if self.dot == 1 {
            if self.scanline == 241 {
                self.set_vblank(true);
                if self.nmi_enabled() {
                    self.nmi_latch = true;
                }
                self.frame_complete = true;
            } else if self.scanline == 261 {
                self.set_vblank(false);
                self.set_sprite_zero_hit(false);
                self.set_sprite_overflow(false);
                self.nmi_latch = false;
            }
        }

        if (257..=320).contains(&self.dot) {
            self.oam_addr = 0;
        }

        self.update_sprite_zero_hit();

        if self.dot >= 341 {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline > 261 {
                self.scanline = 0;
            }
        }
    }

    /// Simplified, spec-literal sprite-0-hit rule: the current dot matches
    /// sprite 0's (x,y) exactly, both planes are enabled, and we're not in
    /// vblank (scanline < 241). This is a positional coincidence check, not
    /// a pixel-opacity overlap test.
    fn update_sprite_zero_hit(&mut self) {
        const BOTH_PLANES_ENABLED: u8 = 0x08 | 0x10;
        if self.mask & BOTH_PLANES_ENABLED != BOTH_PLANES_ENABLED {
            return;
        }
        if self.scanline >= 241 || !(1..=256).contains(&self.dot) {
            return;
        }
        let sprite0_y = self.oam[0] as u16;
        let sprite0_x = self.oam[3] as u16;
        if self.scanline == sprite0_y && (self.dot - 1) == sprite0_x {
            self.set_sprite_zero_hit(true);
        }
    }

    /// Render a full frame (background + sprite overlay) into the RGB
    /// framebuffer. Non-cycle-accurate: composes the whole 256x240 image in
    /// one pass, drawing on the current register/VRAM/OAM state.
    pub fn render_frame(&mut self) {
        let bg_pattern_base: u16 = if (self.ctrl & 0x10) != 0 { 0x1000 } else { 0x0000 };

        let mut rgb_cache = [[0u8; 3]; 64];
        for (i, c) in NES_PALETTE.iter().enumerate() {
            rgb_cache[i] = *c;
        }

        let mut bg_opaque = [false; NES_WIDTH * NES_HEIGHT];

        // Base nametable (0-3) from PPUCTRL bits 0-1, combined below with the
        // scroll-driven nametable crossing to pick one of the four 0x2000
        // aliases per tile.
        let base_select = (self.ctrl & 0x03) as u16;

        let show_background = (self.mask & 0x08) != 0;
        if show_background {
            for py in 0..NES_HEIGHT {
                let total_y = self.scroll_y as u32 + py as u32;
                let nt_y_bit = ((total_y / 240) & 1) as u16;
                let y_in_nt = (total_y % 240) as u16;
                let src_tile_y = y_in_nt / 8;
                let row_in_tile = y_in_nt % 8;
                let coarse_attr_y = src_tile_y / 4;
                let attr_row_quad_y = (src_tile_y % 4) / 2;

                // Cache the tile/attribute fetch across the 8 columns it
                // covers; only re-fetched when the source tile changes.
                let mut cached_tile_x: Option<u16> = None;
                let mut tile_id = 0u8;
                let mut palette_group = 0u8;
                let mut low_plane = 0u8;
                let mut high_plane = 0u8;

                for x in 0..NES_WIDTH {
                    let total_x = self.scroll_x as u32 + x as u32;
                    let nt_x_bit = ((total_x / 256) & 1) as u16;
                    let x_in_nt = (total_x % 256) as u16;
                    let src_tile_x = x_in_nt / 8;
                    let col_in_tile = x_in_nt % 8;

                    if cached_tile_x != Some(src_tile_x) {
                        let nt_select = base_select ^ (nt_y_bit * 2 + nt_x_bit);
                        let nt_base = 0x2000 + nt_select * 0x400;

                        let nt_index = nt_base + src_tile_y * 32 + src_tile_x;
                        tile_id = self.ppu_bus_read(nt_index);

                        let attr_index = nt_base + 0x3C0 + coarse_attr_y * 8 + (src_tile_x / 4);
                        let attr_byte = self.ppu_bus_read(attr_index);
                        let attr_quad_x = (src_tile_x % 4) / 2;
                        let quadrant = attr_row_quad_y * 2 + attr_quad_x;
                        palette_group = (attr_byte >> (quadrant * 2)) & 0x03;

                        let pattern_addr = bg_pattern_base + (tile_id as u16) * 16 + row_in_tile;
                        low_plane = self.ppu_bus_read(pattern_addr);
                        high_plane = self.ppu_bus_read(pattern_addr + 8);

                        cached_tile_x = Some(src_tile_x);
                    }

                    let shift = 7 - col_in_tile as u8;
                    let lo = (low_plane >> shift) & 1;
                    let hi = (high_plane >> shift) & 1;
                    let ci = (hi << 1) | lo;
                    let palette_entry = if ci == 0 {
                        self.ppu_bus_read(0x3F00)
                    } else {
                        let pal = 0x3F00 + (palette_group as u16) * 4 + ci as u16;
                        self.ppu_bus_read(pal)
                    } & 0x3F;

                    let fi = (py * NES_WIDTH + x) * BYTES_PER_PIXEL;
                    let rgb = rgb_cache[palette_entry as usize];
                    self.framebuffer[fi] = rgb[0];
                    self.framebuffer[fi + 1] = rgb[1];
                    self.framebuffer[fi + 2] = rgb[2];

                    if ci != 0 {
                        bg_opaque[py * NES_WIDTH + x] = true;
                    }
                }
            }
        }

        // Approximate sprite overflow: more than 8 sprites overlap a scanline.
        let mut scan_counts = [0u8; NES_HEIGHT];
        let sprite_height: i32 = if (self.ctrl & 0x20) != 0 { 16 } else { 8 };
        for s in 0..64 {
            let base = s * 4;
            let top = self.oam[base] as i32;
            let bottom = top + sprite_height;
            if bottom <= 0 || top >= NES_HEIGHT as i32 {
                continue;
            }
            let start = top.max(0) as usize;
            let end = bottom.min(NES_HEIGHT as i32) as usize;
            for count in scan_counts[start..end].iter_mut() {
                if *count < 250 {
                    *count += 1;
                    if *count > 8 {
                        self.set_sprite_overflow(true);
                        break;
                    }
                }
            }
        }

        if (self.mask & 0x10) == 0 {
            return;
        }

        // Sprite overlay, reverse OAM order so lower indices draw on top.
        for sprite_index in (0..64usize).rev() {
            let base = sprite_index * 4;
            let y = self.oam[base] as i16;
            let tile = self.oam[base + 1];
            let attr = self.oam[base + 2];
            let x = self.oam[base + 3] as i16;

            let flip_v = (attr & 0x80) != 0;
            let flip_h = (attr & 0x40) != 0;
            let priority_behind_bg = (attr & 0x20) != 0;
            let palette_index = (attr & 0x03) as u16;
            let height = if (self.ctrl & 0x20) != 0 { 16i16 } else { 8i16 };

            if x >= NES_WIDTH as i16 || y >= NES_HEIGHT as i16 || x < -height || y < -height {
                continue;
            }

            for row in 0..height {
                let sy = y + row;
                if sy < 0 || sy >= NES_HEIGHT as i16 {
                    continue;
                }

                let (addr_low, addr_high) = if height == 8 {
                    let base_sel: u16 = if (self.ctrl & 0x08) != 0 { 0x1000 } else { 0x0000 };
                    let eff_row = if flip_v { 7 - row } else { row } & 7;
                    let a = base_sel + (tile as u16) * 16 + eff_row as u16;
                    (a, a + 8)
                } else {
                    let table = (tile as u16 & 1) * 0x1000;
                    let base_tile = (tile & 0xFE) as u16;
                    let row_in_sprite = if flip_v { height - 1 - row } else { row };
                    let tile_select = if row_in_sprite < 8 { 0 } else { 1 };
                    let row_in_tile = (row_in_sprite & 7) as u16;
                    let a = table + (base_tile + tile_select) * 16 + row_in_tile;
                    (a, a + 8)
                };

                let low_plane = self.ppu_bus_read(addr_low);
                let high_plane = self.ppu_bus_read(addr_high);

                for col in 0..8i16 {
                    let sx = x + col;
                    if sx < 0 || sx >= NES_WIDTH as i16 {
                        continue;
                    }
                    let bit_index = if flip_h { col } else { 7 - col } as u8;
                    let lo = (low_plane >> bit_index) & 1;
                    let hi = (high_plane >> bit_index) & 1;
                    let ci = (hi << 1) | lo;
                    if ci == 0 {
                        continue;
                    }

                    let bg_is_opaque = bg_opaque[sy as usize * NES_WIDTH + sx as usize];
                    if priority_behind_bg && bg_is_opaque {
                        continue;
                    }

                    let pal_addr = 0x3F10 + palette_index * 4 + ci as u16;
                    let palette_entry = self.ppu_bus_read(pal_addr) & 0x3F;
                    let rgb = rgb_cache[palette_entry as usize];
                    let fi = (sy as usize * NES_WIDTH + sx as usize) * BYTES_PER_PIXEL;
                    self.framebuffer[fi] = rgb[0];
                    self.framebuffer[fi + 1] = rgb[1];
                    self.framebuffer[fi + 2] = rgb[2];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::Mirroring;

    #[test]
    fn vblank_and_nmi_raised_at_scanline_241_dot_1() {
        let mut p = Ppu::new();
        p.write_reg(0x2000, 0x80).unwrap();
        p.attach_chr(vec![0; 0x2000], Mirroring::Horizontal);

        // Drive ticks until scanline 241, dot 1.
        for _ in 0..(242 * 341 + 1) {
            p.tick();
        }
        assert!(p.vblank());
        assert!(p.take_nmi_request());
        assert!(p.take_frame_complete());
    }

    #[test]
    fn pre_render_line_clears_status_flags() {
        let mut p = Ppu::new();
        p.set_vblank(true);
        p.set_sprite_zero_hit(true);
        p.set_sprite_overflow(true);

        // Run to scanline 261, dot 1 (261*341 + 1 ticks from dot=0,scanline=0... but
        // we start at scanline=261 already, so drive a full frame plus one dot).
        for _ in 0..(262 * 341 + 1) {
            p.tick();
        }
        assert!(!p.vblank());
        assert!(!p.sprite_zero_hit());
        assert!(!p.sprite_overflow());
    }

    #[test]
    fn sprite_zero_hit_is_positional() {
        let mut p = Ppu::new();
        p.write_reg(0x2001, 0x18).unwrap(); // show background + sprites
        p.poke_oam(0, 10); // sprite0 y
        p.poke_oam(3, 20); // sprite0 x

        p.dot = 0;
        p.scanline = 10;
        for _ in 0..21 {
            p.tick();
        }
        assert!(p.sprite_zero_hit());
    }

    #[test]
    fn render_frame_produces_correct_size_buffer() {
        let mut p = Ppu::new();
        p.attach_chr(vec![0; 0x2000], Mirroring::Horizontal);
        p.render_frame();
        assert_eq!(p.framebuffer().len(), NES_WIDTH * NES_HEIGHT * BYTES_PER_PIXEL);
    }
}
