/*!
dispatch.rs - fetch/decode/execute orchestration and NMI servicing.

This is the one place that ties `table.rs` (what an opcode byte means),
`addressing.rs` (where its operand lives), and `execute.rs` (what it does)
together into a single `step`. Cycle accounting (base cost, page-cross
penalty, branch penalty) happens here, never in the helpers it calls.
*/

use thiserror::Error;

use crate::bus::Bus;
use crate::cpu::addressing::{self, AddrMode, Operand};
use crate::cpu::execute as exec;
use crate::cpu::state::CpuState;
use crate::cpu::table::{self, Op, OpClass};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CpuError {
    #[error("unknown opcode ${opcode:02X} at PC=${pc:04X}")]
    UnknownOpcode { pc: u16, opcode: u8 },
}

/// Run one `step`: service a pending NMI, or fetch-decode-execute a single
/// instruction. Returns the number of CPU cycles consumed.
pub fn step(cpu: &mut CpuState, bus: &mut Bus) -> Result<u32, CpuError> {
    if bus.poll_nmi() {
        return Ok(service_nmi(cpu, bus));
    }

    let pc_at_fetch = cpu.pc;
    let opcode = cpu.fetch_u8(bus);
    let info = table::opcode_info(opcode);

    if info.op == Op::Unknown {
        cpu.halted = true;
        tracing::warn!(pc = pc_at_fetch, opcode, "unknown opcode");
        return Err(CpuError::UnknownOpcode {
            pc: pc_at_fetch,
            opcode,
        });
    }

    let (operand, page_crossed) = addressing::resolve(info.mode, cpu, bus);
    let mut cycles = info.cycles as u32;

    match info.op {
        // ---------------- Branches ----------------
        Op::Bpl | Op::Bmi | Op::Bvc | Op::Bvs | Op::Bcc | Op::Bcs | Op::Bne | Op::Beq => {
            let target = operand.address();
            let condition = branch_condition(info.op, cpu);
            let (taken, crossed) = exec::branch_if(cpu, condition, target);
            if taken {
                cycles += 1;
                if crossed {
                    cycles += 1;
                }
            }
        }

        // ---------------- Reads ----------------
        Op::Lda => exec::lda(cpu, read_operand(bus, operand)),
        Op::Ldx => exec::ldx(cpu, read_operand(bus, operand)),
        Op::Ldy => exec::ldy(cpu, read_operand(bus, operand)),
        Op::And => exec::and(cpu, read_operand(bus, operand)),
        Op::Ora => exec::ora(cpu, read_operand(bus, operand)),
        Op::Eor => exec::eor(cpu, read_operand(bus, operand)),
        Op::Bit => exec::bit(cpu, read_operand(bus, operand)),
        Op::Adc => exec::adc(cpu, read_operand(bus, operand)),
        Op::Sbc => exec::sbc(cpu, read_operand(bus, operand)),
        Op::Cmp => exec::cmp(cpu, read_operand(bus, operand)),
        Op::Cpx => exec::cpx(cpu, read_operand(bus, operand)),
        Op::Cpy => exec::cpy(cpu, read_operand(bus, operand)),
        Op::Lax => {
            let v = read_operand(bus, operand);
            exec::lda(cpu, v);
            exec::ldx(cpu, v);
        }
        Op::Nop => {
            if let Operand::Address(a) = operand {
                let _ = bus.read(a);
            }
        }

        // ---------------- Stores ----------------
        Op::Sta => bus.write(operand.address(), cpu.a),
        Op::Stx => bus.write(operand.address(), cpu.x),
        Op::Sty => bus.write(operand.address(), cpu.y),
        Op::Sax => bus.write(operand.address(), cpu.a & cpu.x),

        // ---------------- RMW: shifts/rotates ----------------
        Op::Asl => apply_rmw(cpu, bus, info.mode, operand, exec::asl_acc, exec::asl_value),
        Op::Lsr => apply_rmw(cpu, bus, info.mode, operand, exec::lsr_acc, exec::lsr_value),
        Op::Rol => apply_rmw(cpu, bus, info.mode, operand, exec::rol_acc, exec::rol_value),
        Op::Ror => apply_rmw(cpu, bus, info.mode, operand, exec::ror_acc, exec::ror_value),

        // ---------------- RMW: inc/dec ----------------
        Op::Inc => {
            exec::inc_mem(cpu, bus, operand.address());
        }
        Op::Dec => {
            exec::dec_mem(cpu, bus, operand.address());
        }
        Op::Inx => exec::inx(cpu),
        Op::Iny => exec::iny(cpu),
        Op::Dex => exec::dex(cpu),
        Op::Dey => exec::dey(cpu),

        // ---------------- Unofficial combined RMW+ALU ----------------
        Op::Slo => {
            let addr = operand.address();
            let v = bus_read_then_write(bus, addr, |cpu, v| exec::asl_value(cpu, v), cpu);
            exec::ora(cpu, v);
        }
        Op::Rla => {
            let addr = operand.address();
            let v = bus_read_then_write(bus, addr, |cpu, v| exec::rol_value(cpu, v), cpu);
            exec::and(cpu, v);
        }
        Op::Sre => {
            let addr = operand.address();
            let v = bus_read_then_write(bus, addr, |cpu, v| exec::lsr_value(cpu, v), cpu);
            exec::eor(cpu, v);
        }
        Op::Rra => {
            let addr = operand.address();
            let v = bus_read_then_write(bus, addr, |cpu, v| exec::ror_value(cpu, v), cpu);
            exec::adc(cpu, v);
        }
        Op::Dcp => {
            let addr = operand.address();
            let v = exec::dec_mem(cpu, bus, addr);
            exec::cmp(cpu, v);
        }
        Op::Isb => {
            let addr = operand.address();
            let v = exec::inc_mem(cpu, bus, addr);
            exec::sbc(cpu, v);
        }

        // ---------------- Transfers / stack / flags ----------------
        Op::Tax => exec::tax(cpu),
        Op::Tay => exec::tay(cpu),
        Op::Txa => exec::txa(cpu),
        Op::Tya => exec::tya(cpu),
        Op::Tsx => exec::tsx(cpu),
        Op::Txs => exec::txs(cpu),
        Op::Pha => exec::pha(cpu, bus),
        Op::Pla => exec::pla(cpu, bus),
        Op::Php => exec::php(cpu, bus),
        Op::Plp => exec::plp(cpu, bus),
        Op::Clc => exec::set_flag(cpu, crate::cpu::state::CARRY, false),
        Op::Sec => exec::set_flag(cpu, crate::cpu::state::CARRY, true),
        Op::Cli => exec::set_flag(cpu, crate::cpu::state::IRQ_DISABLE, false),
        Op::Sei => exec::set_flag(cpu, crate::cpu::state::IRQ_DISABLE, true),
        Op::Clv => exec::set_flag(cpu, crate::cpu::state::OVERFLOW, false),
        Op::Cld => exec::set_flag(cpu, crate::cpu::state::DECIMAL, false),
        Op::Sed => exec::set_flag(cpu, crate::cpu::state::DECIMAL, true),

        // ---------------- Control flow ----------------
        Op::Jmp => cpu.pc = operand.address(),
        Op::Jsr => {
            let return_addr = cpu.pc.wrapping_sub(1);
            exec::push_u16(cpu, bus, return_addr);
            cpu.pc = operand.address();
        }
        Op::Rts => {
            let addr = exec::pop_u16(cpu, bus);
            cpu.pc = addr.wrapping_add(1);
        }
        Op::Rti => {
            exec::plp(cpu, bus);
            // RTI forces break bits cleared/break2 set regardless of stack contents.
            cpu.status &= !crate::cpu::state::BREAK1;
            cpu.status |= crate::cpu::state::BREAK2;
            cpu.pc = exec::pop_u16(cpu, bus);
        }
        Op::Brk => {
            exec::push_u16(cpu, bus, cpu.pc);
            let status = cpu.compose_status_for_push(true);
            exec::push_u8(cpu, bus, status);
            exec::set_flag(cpu, crate::cpu::state::IRQ_DISABLE, true);
            cpu.pc = bus.read_u16(0xFFFE);
        }

        Op::Unknown => unreachable!("filtered above"),
    }

    // Page-cross penalty applies only to pure reads using an indexed mode;
    // stores/RMW/branches are excluded (branches handle their own penalty above).
    if info.class == OpClass::Read && page_crossed {
        cycles += 1;
    }

    bus.tick(cycles);
    cpu.cycles += cycles as u64;

    #[cfg(feature = "trace")]
    emit_trace_line(pc_at_fetch, opcode, info.mnemonic, cpu);

    Ok(cycles)
}

/// NMI service: push PC, push P (break1=0, break2=1), set I, jump through
/// $FFFA/$FFFB. spec.md standardizes this as a 2-cycle bus tick rather than
/// the full canonical 7-cycle interrupt latency (see DESIGN.md).
fn service_nmi(cpu: &mut CpuState, bus: &mut Bus) -> u32 {
    tracing::trace!(pc = cpu.pc, "servicing NMI");
    exec::push_u16(cpu, bus, cpu.pc);
    let status = cpu.compose_status_for_push(false);
    exec::push_u8(cpu, bus, status);
    exec::set_flag(cpu, crate::cpu::state::IRQ_DISABLE, true);
    bus.tick(2);
    cpu.cycles += 2;
    cpu.pc = bus.read_u16(0xFFFA);
    2
}

fn branch_condition(op: Op, cpu: &CpuState) -> bool {
    use crate::cpu::state::{CARRY, NEGATIVE, OVERFLOW, ZERO};
    match op {
        Op::Bpl => !cpu.is_flag_set(NEGATIVE),
        Op::Bmi => cpu.is_flag_set(NEGATIVE),
        Op::Bvc => !cpu.is_flag_set(OVERFLOW),
        Op::Bvs => cpu.is_flag_set(OVERFLOW),
        Op::Bcc => !cpu.is_flag_set(CARRY),
        Op::Bcs => cpu.is_flag_set(CARRY),
        Op::Bne => !cpu.is_flag_set(ZERO),
        Op::Beq => cpu.is_flag_set(ZERO),
        _ => unreachable!("not a branch opcode"),
    }
}

fn read_operand(bus: &mut Bus, operand: Operand) -> u8 {
    match operand {
        Operand::Immediate(v) => v,
        Operand::Address(a) => bus.read(a),
        _ => panic!("read-class opcode resolved to a non-readable operand"),
    }
}

/// Shared shift/rotate RMW dispatch: accumulator mode mutates `cpu.a` in
/// place, any other mode reads-transforms-writes the memory operand.
fn apply_rmw(
    cpu: &mut CpuState,
    bus: &mut Bus,
    mode: AddrMode,
    operand: Operand,
    acc_fn: fn(&mut CpuState),
    mem_fn: fn(&mut CpuState, u8) -> u8,
) {
    if mode == AddrMode::Accumulator {
        acc_fn(cpu);
    } else {
        let addr = operand.address();
        exec::rmw_memory(bus, addr, |v| mem_fn(cpu, v));
    }
}

/// Helper for the unofficial combined RMW+ALU opcodes: performs the memory
/// transform and returns the freshly written value for the ALU half to
/// consume against the accumulator.
fn bus_read_then_write(
    bus: &mut Bus,
    addr: u16,
    f: impl FnOnce(&mut CpuState, u8) -> u8,
    cpu: &mut CpuState,
) -> u8 {
    exec::rmw_memory(bus, addr, |v| f(cpu, v))
}

#[cfg(feature = "trace")]
fn emit_trace_line(pc: u16, opcode: u8, mnemonic: &str, cpu: &CpuState) {
    tracing::trace!(
        "{:04X}  {:02X}  {}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
        pc,
        opcode,
        mnemonic,
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.status,
        cpu.sp,
        cpu.cycles
    );
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
    fn lda_immediate_updates_a_and_flags() {
        let (mut cpu, mut bus) = setup(&[0xA9, 0x05]);
        let cycles = step(&mut cpu, &mut bus).unwrap();
        assert_eq!(cpu.a, 5);
        assert_eq!(cycles, 2);
        assert!(!cpu.is_flag_set(crate::cpu::state::ZERO));
        assert!(!cpu.is_flag_set(crate::cpu::state::NEGATIVE));
    }

    #[test]
    fn unknown_opcode_halts_and_errors() {
        let (mut cpu, mut bus) = setup(&[0x02]); // unassigned/jam opcode
        let err = step(&mut cpu, &mut bus).unwrap_err();
        assert!(matches!(err, CpuError::UnknownOpcode { .. }));
        assert!(cpu.halted);
    }

    #[test]
    fn jsr_then_rts_round_trips_pc() {
        // JSR $8005 ; EA ; EA ; RTS (at $8005), all within one 16KiB PRG bank.
        let rom = build_nrom_with_prg(&[0x20, 0x05, 0x80, 0xEA, 0xEA, 0x60], 1, 1, None);
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = CpuState::new();
        cpu.reset(&mut bus);
        let sp_before = cpu.sp;
        step(&mut cpu, &mut bus).unwrap(); // JSR $8005
        assert_eq!(cpu.pc, 0x8005);
        assert_eq!(cpu.sp, sp_before.wrapping_sub(2));
        step(&mut cpu, &mut bus).unwrap(); // RTS
        assert_eq!(cpu.pc, 0x8003);
        assert_eq!(cpu.sp, sp_before);
    }

    #[test]
    fn branch_not_taken_costs_two_cycles() {
        let (mut cpu, mut bus) = setup(&[0xF0, 0x10]); // BEQ, Z currently clear
        let cycles = step(&mut cpu, &mut bus).unwrap();
        assert_eq!(cycles, 2);
    }
}
