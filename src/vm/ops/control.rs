//! Jumps, calls, returns, loops and software interrupts.

use crate::vm::alu;
use crate::vm::decode::{decode_rm, fetch_modrm, RmOperand};
use crate::vm::ops::illegal_op;
use crate::vm::registers::SegId;
use crate::vm::runtime::CpuFlag::*;
use crate::vm::runtime::{Runtime, FLAG_ALWAYS_ON, FLAG_MASK};

/// Evaluate a condition-code nibble. Bit 0 inverts the sense of the flag
/// combination selected by bits 3:1.
pub(super) fn condition(vm: &Runtime, cc: u8) -> bool {
    let set = match (cc >> 1) & 0b111 {
        // O / NO
        0b000 => vm.check_flag(Overflow),
        // B,C / AE,NB
        0b001 => vm.check_flag(Carry),
        // E,Z / NE,NZ
        0b010 => vm.check_flag(Zero),
        // BE / A,NBE
        0b011 => vm.check_flag(Carry) || vm.check_flag(Zero),
        // S / NS
        0b100 => vm.check_flag(Sign),
        // P,PE / NP,PO
        0b101 => vm.check_flag(Parity),
        // L,NGE / GE,NL
        0b110 => vm.check_flag(Sign) != vm.check_flag(Overflow),
        // LE,NG / G,NLE
        0b111 => {
            vm.check_flag(Zero) || vm.check_flag(Sign) != vm.check_flag(Overflow)
        }
        _ => unreachable!(),
    };
    set != (cc & 1 != 0)
}

/// Relative transfer at the active operand size; 16-bit targets wrap within
/// the segment.
pub(super) fn jump_rel(vm: &mut Runtime, disp: i32) {
    if vm.mode.op32 {
        vm.registers.eip = vm.registers.eip.wrapping_add_signed(disp);
    } else {
        let ip = vm.registers.eip as u16;
        vm.registers.eip = ip.wrapping_add_signed(disp as i16) as u32;
    }
}

// 0x70..=0x7F
pub(super) fn jcc_short(vm: &mut Runtime, op: u8) {
    let disp = vm.fetch_byte() as i8;
    if condition(vm, op & 0x0F) {
        jump_rel(vm, disp as i32);
    }
}

// 0xE3 - jump iff the count register is zero, leaving it untouched
pub(super) fn jcxz(vm: &mut Runtime, _op: u8) {
    let disp = vm.fetch_byte() as i8;
    let zero = if vm.mode.addr32 {
        vm.registers.ecx.dword() == 0
    } else {
        vm.registers.ecx.word() == 0
    };
    if zero {
        jump_rel(vm, disp as i32);
    }
}

fn loop_common(vm: &mut Runtime, cond: impl Fn(&Runtime) -> bool) {
    let disp = vm.fetch_byte() as i8;
    let count = if vm.mode.addr32 {
        let v = vm.registers.ecx.dword().wrapping_sub(1);
        vm.registers.ecx.set_dword(v);
        v
    } else {
        let v = vm.registers.ecx.word().wrapping_sub(1);
        vm.registers.ecx.set_word(v);
        v as u32
    };
    if count != 0 && cond(vm) {
        jump_rel(vm, disp as i32);
    }
}

// 0xE0
pub(super) fn loopne(vm: &mut Runtime, _op: u8) {
    loop_common(vm, |vm| !vm.check_flag(Zero));
}

// 0xE1
pub(super) fn loope(vm: &mut Runtime, _op: u8) {
    loop_common(vm, |vm| vm.check_flag(Zero));
}

// 0xE2
pub(super) fn loop_op(vm: &mut Runtime, _op: u8) {
    loop_common(vm, |_| true);
}

// ── calls, returns, jumps ───────────────────────────────────────────────

// 0xE8
pub(super) fn call_near(vm: &mut Runtime, _op: u8) {
    if vm.mode.op32 {
        let disp = vm.fetch_long() as i32;
        vm.push_long(vm.registers.eip);
        vm.registers.eip = vm.registers.eip.wrapping_add_signed(disp);
    } else {
        let disp = vm.fetch_word() as i16;
        vm.push_word(vm.registers.eip as u16);
        let ip = vm.registers.eip as u16;
        vm.registers.eip = ip.wrapping_add_signed(disp) as u32;
    }
}

// 0xE9
pub(super) fn jmp_near(vm: &mut Runtime, _op: u8) {
    let disp = if vm.mode.op32 {
        vm.fetch_long() as i32
    } else {
        vm.fetch_word() as i16 as i32
    };
    jump_rel(vm, disp);
}

// 0xEB
pub(super) fn jmp_short(vm: &mut Runtime, _op: u8) {
    let disp = vm.fetch_byte() as i8;
    jump_rel(vm, disp as i32);
}

// 0xEA
pub(super) fn jmp_far(vm: &mut Runtime, _op: u8) {
    let off = if vm.mode.op32 {
        vm.fetch_long()
    } else {
        vm.fetch_word() as u32
    };
    let sel = vm.fetch_word();
    vm.registers.cs = sel;
    vm.registers.eip = off;
}

// 0x9A
pub(super) fn call_far(vm: &mut Runtime, _op: u8) {
    let off = if vm.mode.op32 {
        vm.fetch_long()
    } else {
        vm.fetch_word() as u32
    };
    let sel = vm.fetch_word();
    if vm.mode.op32 {
        vm.push_long(vm.registers.cs as u32);
        vm.push_long(vm.registers.eip);
    } else {
        vm.push_word(vm.registers.cs);
        vm.push_word(vm.registers.eip as u16);
    }
    vm.registers.cs = sel;
    vm.registers.eip = off;
}

// 0xC3
pub(super) fn ret(vm: &mut Runtime, _op: u8) {
    vm.registers.eip = if vm.mode.op32 {
        vm.pop_long()
    } else {
        vm.pop_word() as u32
    };
}

// 0xC2 - the immediate releases the callee's arguments
pub(super) fn ret_imm(vm: &mut Runtime, _op: u8) {
    let adjust = vm.fetch_word();
    vm.registers.eip = if vm.mode.op32 {
        vm.pop_long()
    } else {
        vm.pop_word() as u32
    };
    let sp = vm.registers.esp.word().wrapping_add(adjust);
    vm.registers.esp.set_word(sp);
}

// 0xCB
pub(super) fn retf(vm: &mut Runtime, _op: u8) {
    if vm.mode.op32 {
        vm.registers.eip = vm.pop_long();
        vm.registers.cs = vm.pop_long() as u16;
    } else {
        vm.registers.eip = vm.pop_word() as u32;
        vm.registers.cs = vm.pop_word();
    }
}

// 0xCA
pub(super) fn retf_imm(vm: &mut Runtime, op: u8) {
    let adjust = vm.fetch_word();
    retf(vm, op);
    let sp = vm.registers.esp.word().wrapping_add(adjust);
    vm.registers.esp.set_word(sp);
}

// ── frames ──────────────────────────────────────────────────────────────

// 0xC8
pub(super) fn enter(vm: &mut Runtime, _op: u8) {
    let alloc = vm.fetch_word();
    let nesting = (vm.fetch_byte() & 0x1F) as u16;
    vm.push_word(vm.registers.ebp.word());
    let frame = vm.registers.esp.word();
    if nesting > 0 {
        for _ in 1..nesting {
            let bp = vm.registers.ebp.word().wrapping_sub(2);
            vm.registers.ebp.set_word(bp);
            let v = vm.read_data_word(SegId::SS, bp as u32);
            vm.push_word(v);
        }
        vm.push_word(frame);
    }
    vm.registers.ebp.set_word(frame);
    let sp = vm.registers.esp.word().wrapping_sub(alloc);
    vm.registers.esp.set_word(sp);
}

// 0xC9
pub(super) fn leave(vm: &mut Runtime, _op: u8) {
    let bp = vm.registers.ebp.word();
    vm.registers.esp.set_word(bp);
    let v = vm.pop_word();
    vm.registers.ebp.set_word(v);
}

// ── software interrupts ─────────────────────────────────────────────────

// 0xCC
pub(super) fn int3(vm: &mut Runtime, _op: u8) {
    vm.interrupt(3);
}

// 0xCD
pub(super) fn int_imm(vm: &mut Runtime, _op: u8) {
    let vector = vm.fetch_byte();
    vm.interrupt(vector);
}

// 0xCE
pub(super) fn into_op(vm: &mut Runtime, _op: u8) {
    if vm.check_flag(Overflow) {
        vm.interrupt(4);
    }
}

// 0xCF
pub(super) fn iret(vm: &mut Runtime, _op: u8) {
    if vm.mode.op32 {
        vm.registers.eip = vm.pop_long();
        vm.registers.cs = vm.pop_long() as u16;
        let flags = vm.pop_long();
        vm.flags = (flags & FLAG_MASK) | FLAG_ALWAYS_ON;
    } else {
        vm.registers.eip = vm.pop_word() as u32;
        vm.registers.cs = vm.pop_word();
        let flags = vm.pop_word() as u32;
        vm.flags = (flags & FLAG_MASK) | FLAG_ALWAYS_ON;
    }
}

/// Divide fault: vector 0 through the normal delivery path.
pub(crate) fn divide_error(vm: &mut Runtime) {
    vm.interrupt(0);
}

// ── group 5: INC, DEC, CALL, JMP, PUSH on r/m ───────────────────────────

// 0xFF
pub(super) fn group5(vm: &mut Runtime, op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    match reg {
        0b000 => {
            if vm.mode.op32 {
                let v = vm.read_rm32(&dst);
                let res = alu::inc_long(vm, v);
                vm.write_rm32(&dst, res);
            } else {
                let v = vm.read_rm16(&dst);
                let res = alu::inc_word(vm, v);
                vm.write_rm16(&dst, res);
            }
        }
        0b001 => {
            if vm.mode.op32 {
                let v = vm.read_rm32(&dst);
                let res = alu::dec_long(vm, v);
                vm.write_rm32(&dst, res);
            } else {
                let v = vm.read_rm16(&dst);
                let res = alu::dec_word(vm, v);
                vm.write_rm16(&dst, res);
            }
        }
        // CALL near indirect
        0b010 => {
            if vm.mode.op32 {
                let target = vm.read_rm32(&dst);
                vm.push_long(vm.registers.eip);
                vm.registers.eip = target;
            } else {
                let target = vm.read_rm16(&dst);
                vm.push_word(vm.registers.eip as u16);
                vm.registers.eip = target as u32;
            }
        }
        // CALL far indirect - the pointer lives in memory
        0b011 => match dst {
            RmOperand::Mem(ea) => {
                let (off, sel) = read_far_pointer(vm, ea.seg, ea.off);
                if vm.mode.op32 {
                    vm.push_long(vm.registers.cs as u32);
                    vm.push_long(vm.registers.eip);
                } else {
                    vm.push_word(vm.registers.cs);
                    vm.push_word(vm.registers.eip as u16);
                }
                vm.registers.cs = sel;
                vm.registers.eip = off;
            }
            RmOperand::Reg(_) => illegal_op(vm, op),
        },
        // JMP near indirect
        0b100 => {
            vm.registers.eip = if vm.mode.op32 {
                vm.read_rm32(&dst)
            } else {
                vm.read_rm16(&dst) as u32
            };
        }
        // JMP far indirect
        0b101 => match dst {
            RmOperand::Mem(ea) => {
                let (off, sel) = read_far_pointer(vm, ea.seg, ea.off);
                vm.registers.cs = sel;
                vm.registers.eip = off;
            }
            RmOperand::Reg(_) => illegal_op(vm, op),
        },
        // PUSH
        0b110 => {
            if vm.mode.op32 {
                let v = vm.read_rm32(&dst);
                vm.push_long(v);
            } else {
                let v = vm.read_rm16(&dst);
                vm.push_word(v);
            }
        }
        _ => illegal_op(vm, op),
    }
}

fn read_far_pointer(vm: &mut Runtime, seg: SegId, off: u32) -> (u32, u16) {
    if vm.mode.op32 {
        let target = vm.read_data_long(seg, off);
        let sel = vm.read_data_word(seg, off.wrapping_add(4));
        (target, sel)
    } else {
        let target = vm.read_data_word(seg, off) as u32;
        let sel = vm.read_data_word(seg, off.wrapping_add(2));
        (target, sel)
    }
}
