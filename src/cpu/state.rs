/*!
state.rs - Canonical 6502 CPU architectural state (registers + flags).

Overview
========
`CpuState` is the single authoritative owner of all architecturally visible
registers and execution-control booleans. It intentionally excludes:
  - Bus / memory logic
  - Instruction decode / dispatch logic
  - Timing / cycle accounting
Those live in `addressing.rs`, `table.rs`, `dispatch.rs`.

6502 Status Register Bit Layout
================================
Bit: 7 6 5 4 3 2 1 0
     N V 1 B D I Z C
  N = NEGATIVE
  V = OVERFLOW
  1 = UNUSED (always reads as 1)
  B = BREAK (PHP/BRK only; hardware IRQ/NMI push with B clear)
  D = DECIMAL (tracked but unused by NES ALU)
  I = IRQ_DISABLE
  Z = ZERO
  C = CARRY
*/

use crate::bus::Bus;

/// Processor status flag bit masks.
pub const CARRY: u8 = 0b0000_0001;
pub const ZERO: u8 = 0b0000_0010;
pub const IRQ_DISABLE: u8 = 0b0000_0100;
pub const DECIMAL: u8 = 0b0000_1000; // Not used by NES hardware, still part of 6502.
pub const BREAK1: u8 = 0b0001_0000;
pub const BREAK2: u8 = 0b0010_0000; // "UNUSED" bit; always reads 1.
pub const OVERFLOW: u8 = 0b0100_0000;
pub const NEGATIVE: u8 = 0b1000_0000;

/// Architectural register / flag container for the 6502 CPU.
#[derive(Debug, Clone, Copy)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    pub cycles: u64,
    pub halted: bool,
}

impl Default for CpuState {
    fn default() -> Self {
        // Canonical power-up/reset defaults: SP=0xFD, IRQ disabled, BREAK2 always set,
        // cycle counter begins at 7 to match the reference CPU's reset behavior.
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0x0000,
            status: IRQ_DISABLE | BREAK2,
            cycles: 7,
            halted: false,
        }
    }
}

impl CpuState {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset registers and load PC from the reset vector at $FFFC/$FFFD.
    pub fn reset(&mut self, bus: &mut Bus) {
        *self = Self::default();
        self.pc = bus.read_u16(0xFFFC);
    }

    #[inline]
    pub fn advance_pc(&mut self, delta: u16) {
        self.pc = self.pc.wrapping_add(delta);
    }

    /// Fetch a byte from memory at current PC and advance PC by 1.
    #[inline]
    pub fn fetch_u8(&mut self, bus: &mut Bus) -> u8 {
        let b = bus.read(self.pc);
        self.advance_pc(1);
        b
    }

    /// Fetch a little-endian word at current PC, advancing PC by 2.
    #[inline]
    pub fn fetch_u16(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.fetch_u8(bus) as u16;
        let hi = self.fetch_u8(bus) as u16;
        (hi << 8) | lo
    }

    #[inline]
    pub fn is_flag_set(&self, mask: u8) -> bool {
        (self.status & mask) != 0
    }

    #[inline]
    pub fn assign_flag(&mut self, mask: u8, value: bool) {
        if value {
            self.status |= mask;
        } else {
            self.status &= !mask;
        }
    }

    /// Composite helper to update ZERO + NEGATIVE according to 6502 rules.
    #[inline]
    pub fn update_zn(&mut self, result: u8) {
        self.assign_flag(ZERO, result == 0);
        self.assign_flag(NEGATIVE, (result & 0x80) != 0);
    }

    /// Compose the status byte for pushing to the stack (BRK/PHP vs IRQ/NMI).
    /// BREAK2 is always forced to 1; BREAK1 is included only for PHP/BRK.
    pub fn compose_status_for_push(&self, set_break1: bool) -> u8 {
        let mut v = self.status | BREAK2;
        if set_break1 {
            v |= BREAK1;
        } else {
            v &= !BREAK1;
        }
        v
    }

    // ------------------------------------------------------------------
    // Stack helpers. Page 0x0100, post-decrement on push, pre-increment on
    // pull: push writes 0x0100|SP then SP -= 1; pull does SP += 1 then reads.
    // ------------------------------------------------------------------

    #[inline]
    pub fn push_u8(&mut self, bus: &mut Bus, value: u8) {
        let addr = 0x0100u16 | (self.sp as u16);
        bus.write(addr, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    #[inline]
    pub fn pop_u8(&mut self, bus: &mut Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        let addr = 0x0100u16 | (self.sp as u16);
        bus.read(addr)
    }

    /// Push a 16-bit value high-byte-first (matches JSR/interrupt return-address order).
    #[inline]
    pub fn push_u16(&mut self, bus: &mut Bus, value: u16) {
        self.push_u8(bus, (value >> 8) as u8);
        self.push_u8(bus, value as u8);
    }

    /// Pull a 16-bit value low-byte-first.
    #[inline]
    pub fn pop_u16(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.pop_u8(bus) as u16;
        let hi = self.pop_u8(bus) as u16;
        (hi << 8) | lo
    }
}
