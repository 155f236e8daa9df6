//! Primary opcode table and the data-movement / miscellaneous handlers.
//! Arithmetic, shifts, string operations, control flow and the two-byte
//! table live in the sibling modules.

mod arith;
mod control;
mod shift;
mod string;
mod two_byte;


use log::error;
use num_traits::FromPrimitive;

use crate::utils::number::{sign_extend_long, sign_extend_word};
use crate::vm::decode::{decode_rm, fetch_modrm, RmOperand};
use crate::vm::memory::Bus;
use crate::vm::registers::SegId;
use crate::vm::runtime::{
    CpuFlag::*, HaltCause, Runtime, FLAG_ALWAYS_ON, FLAG_MASK,
};

pub(crate) use two_byte::OPTAB2;

pub(crate) type OpFn = fn(&mut Runtime, u8);

/// Handles every opcode the primary table marks undefined, and the synthetic
/// 0xF1 trap. With SP at its initial zero the trap signals the clean end of
/// an emulated service call; any other SP means the guest really executed
/// garbage.
pub(crate) fn illegal_op(vm: &mut Runtime, op: u8) {
    if vm.registers.esp.word() != 0 {
        error!(
            "{:04X}:{:04X}: illegal opcode {:02X}",
            vm.saved_cs, vm.saved_ip as u16, op
        );
        vm.halt_with(HaltCause::IllegalOpcode);
    } else {
        // The trap byte is not a real instruction; report CS:IP at the trap
        // itself, not past it.
        vm.registers.cs = vm.saved_cs;
        vm.registers.eip = vm.saved_ip;
        vm.halt_with(HaltCause::ServiceReturn);
    }
}

/// Slots for prefix bytes and the 0x0F escape. These are consumed by the
/// pre-pass in `Runtime::step`; the entries only keep the table total.
fn prefix_reserved(_vm: &mut Runtime, _op: u8) {}

// ── MOV family ──────────────────────────────────────────────────────────

// 0x88
fn mov_byte_rm_r(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let v = vm.registers.get8(reg);
    vm.write_rm8(&dst, v);
}

// 0x89
fn mov_word_rm_r(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let v = vm.registers.get32(reg);
        vm.write_rm32(&dst, v);
    } else {
        let v = vm.registers.get16(reg);
        vm.write_rm16(&dst, v);
    }
}

// 0x8A
fn mov_byte_r_rm(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    let v = vm.read_rm8(&src);
    vm.registers.set8(reg, v);
}

// 0x8B
fn mov_word_r_rm(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let v = vm.read_rm32(&src);
        vm.registers.set32(reg, v);
    } else {
        let v = vm.read_rm16(&src);
        vm.registers.set16(reg, v);
    }
}

// 0x8C - always a 16-bit store, whatever the operand size says
fn mov_rm_sreg(vm: &mut Runtime, op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let Some(seg) = SegId::from_u8(reg) else {
        return illegal_op(vm, op);
    };
    let v = vm.registers.seg(seg);
    vm.write_rm16(&dst, v);
}

// 0x8E
fn mov_sreg_rm(vm: &mut Runtime, op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    let Some(seg) = SegId::from_u8(reg) else {
        return illegal_op(vm, op);
    };
    let v = vm.read_rm16(&src);
    vm.registers.set_seg(seg, v);
}

// 0x8D - the computed offset, pre-segmentation
fn lea(vm: &mut Runtime, op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    match decode_rm(vm, md, rm) {
        RmOperand::Mem(ea) => {
            if vm.mode.op32 {
                vm.registers.set32(reg, ea.off);
            } else {
                vm.registers.set16(reg, ea.off as u16);
            }
        }
        RmOperand::Reg(_) => illegal_op(vm, op),
    }
}

fn fetch_moffs(vm: &mut Runtime) -> u32 {
    if vm.mode.addr32 {
        vm.fetch_long()
    } else {
        vm.fetch_word() as u32
    }
}

// 0xA0
fn mov_al_moffs(vm: &mut Runtime, _op: u8) {
    let off = fetch_moffs(vm);
    let seg = vm.data_seg(SegId::DS);
    let v = vm.read_data_byte(seg, off);
    vm.registers.eax.set_low(v);
}

// 0xA1
fn mov_ax_moffs(vm: &mut Runtime, _op: u8) {
    let off = fetch_moffs(vm);
    let seg = vm.data_seg(SegId::DS);
    if vm.mode.op32 {
        let v = vm.read_data_long(seg, off);
        vm.registers.eax.set_dword(v);
    } else {
        let v = vm.read_data_word(seg, off);
        vm.registers.eax.set_word(v);
    }
}

// 0xA2
fn mov_moffs_al(vm: &mut Runtime, _op: u8) {
    let off = fetch_moffs(vm);
    let seg = vm.data_seg(SegId::DS);
    let v = vm.registers.eax.low();
    vm.write_data_byte(seg, off, v);
}

// 0xA3
fn mov_moffs_ax(vm: &mut Runtime, _op: u8) {
    let off = fetch_moffs(vm);
    let seg = vm.data_seg(SegId::DS);
    if vm.mode.op32 {
        let v = vm.registers.eax.dword();
        vm.write_data_long(seg, off, v);
    } else {
        let v = vm.registers.eax.word();
        vm.write_data_word(seg, off, v);
    }
}

// 0xB0..=0xB7
fn mov_reg8_imm(vm: &mut Runtime, op: u8) {
    let v = vm.fetch_byte();
    vm.registers.set8(op & 0b111, v);
}

// 0xB8..=0xBF
fn mov_reg_imm(vm: &mut Runtime, op: u8) {
    if vm.mode.op32 {
        let v = vm.fetch_long();
        vm.registers.set32(op & 0b111, v);
    } else {
        let v = vm.fetch_word();
        vm.registers.set16(op & 0b111, v);
    }
}

// 0xC6
fn mov_rm_imm_byte(vm: &mut Runtime, _op: u8) {
    let (md, _reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let v = vm.fetch_byte();
    vm.write_rm8(&dst, v);
}

// 0xC7
fn mov_rm_imm_word(vm: &mut Runtime, _op: u8) {
    let (md, _reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let v = vm.fetch_long();
        vm.write_rm32(&dst, v);
    } else {
        let v = vm.fetch_word();
        vm.write_rm16(&dst, v);
    }
}

// ── XCHG ────────────────────────────────────────────────────────────────

// 0x86
fn xchg_byte_rm_r(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let a = vm.read_rm8(&dst);
    let b = vm.registers.get8(reg);
    vm.write_rm8(&dst, b);
    vm.registers.set8(reg, a);
}

// 0x87
fn xchg_word_rm_r(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let a = vm.read_rm32(&dst);
        let b = vm.registers.get32(reg);
        vm.write_rm32(&dst, b);
        vm.registers.set32(reg, a);
    } else {
        let a = vm.read_rm16(&dst);
        let b = vm.registers.get16(reg);
        vm.write_rm16(&dst, b);
        vm.registers.set16(reg, a);
    }
}

// 0x91..=0x97 (0x90 XCHG AX,AX is NOP)
fn xchg_ax_reg(vm: &mut Runtime, op: u8) {
    let r = op & 0b111;
    if vm.mode.op32 {
        let a = vm.registers.eax.dword();
        let b = vm.registers.get32(r);
        vm.registers.eax.set_dword(b);
        vm.registers.set32(r, a);
    } else {
        let a = vm.registers.eax.word();
        let b = vm.registers.get16(r);
        vm.registers.eax.set_word(b);
        vm.registers.set16(r, a);
    }
}

// ── stack ───────────────────────────────────────────────────────────────

// 0x50..=0x57 - the value is read before SP moves, so PUSH SP stores the
// original SP (286+ behavior)
fn push_reg(vm: &mut Runtime, op: u8) {
    let r = op & 0b111;
    if vm.mode.op32 {
        let v = vm.registers.get32(r);
        vm.push_long(v);
    } else {
        let v = vm.registers.get16(r);
        vm.push_word(v);
    }
}

// 0x58..=0x5F
fn pop_reg(vm: &mut Runtime, op: u8) {
    let r = op & 0b111;
    if vm.mode.op32 {
        let v = vm.pop_long();
        vm.registers.set32(r, v);
    } else {
        let v = vm.pop_word();
        vm.registers.set16(r, v);
    }
}

// 0x06, 0x0E, 0x16, 0x1E
fn push_sreg(vm: &mut Runtime, op: u8) {
    let Some(seg) = SegId::from_u8((op >> 3) & 0b11) else {
        return illegal_op(vm, op);
    };
    let v = vm.registers.seg(seg);
    if vm.mode.op32 {
        vm.push_long(v as u32);
    } else {
        vm.push_word(v);
    }
}

// 0x07, 0x17, 0x1F (0x0F is the two-byte escape, so CS has no pop)
fn pop_sreg(vm: &mut Runtime, op: u8) {
    let Some(seg) = SegId::from_u8((op >> 3) & 0b11) else {
        return illegal_op(vm, op);
    };
    let v = if vm.mode.op32 {
        vm.pop_long() as u16
    } else {
        vm.pop_word()
    };
    vm.registers.set_seg(seg, v);
}

// 0x8F - the value comes off the stack before the address decodes
fn pop_rm(vm: &mut Runtime, _op: u8) {
    if vm.mode.op32 {
        let v = vm.pop_long();
        let (md, _reg, rm) = fetch_modrm(vm);
        let dst = decode_rm(vm, md, rm);
        vm.write_rm32(&dst, v);
    } else {
        let v = vm.pop_word();
        let (md, _reg, rm) = fetch_modrm(vm);
        let dst = decode_rm(vm, md, rm);
        vm.write_rm16(&dst, v);
    }
}

// 0x60
fn pusha(vm: &mut Runtime, _op: u8) {
    if vm.mode.op32 {
        let esp = vm.registers.esp.dword();
        vm.push_long(vm.registers.eax.dword());
        vm.push_long(vm.registers.ecx.dword());
        vm.push_long(vm.registers.edx.dword());
        vm.push_long(vm.registers.ebx.dword());
        vm.push_long(esp);
        vm.push_long(vm.registers.ebp.dword());
        vm.push_long(vm.registers.esi.dword());
        vm.push_long(vm.registers.edi.dword());
    } else {
        let sp = vm.registers.esp.word();
        vm.push_word(vm.registers.eax.word());
        vm.push_word(vm.registers.ecx.word());
        vm.push_word(vm.registers.edx.word());
        vm.push_word(vm.registers.ebx.word());
        vm.push_word(sp);
        vm.push_word(vm.registers.ebp.word());
        vm.push_word(vm.registers.esi.word());
        vm.push_word(vm.registers.edi.word());
    }
}

// 0x61
fn popa(vm: &mut Runtime, _op: u8) {
    if vm.mode.op32 {
        let edi = vm.pop_long();
        let esi = vm.pop_long();
        let ebp = vm.pop_long();
        let _esp = vm.pop_long();
        let ebx = vm.pop_long();
        let edx = vm.pop_long();
        let ecx = vm.pop_long();
        let eax = vm.pop_long();
        vm.registers.edi.set_dword(edi);
        vm.registers.esi.set_dword(esi);
        vm.registers.ebp.set_dword(ebp);
        vm.registers.ebx.set_dword(ebx);
        vm.registers.edx.set_dword(edx);
        vm.registers.ecx.set_dword(ecx);
        vm.registers.eax.set_dword(eax);
    } else {
        let di = vm.pop_word();
        let si = vm.pop_word();
        let bp = vm.pop_word();
        let _sp = vm.pop_word();
        let bx = vm.pop_word();
        let dx = vm.pop_word();
        let cx = vm.pop_word();
        let ax = vm.pop_word();
        vm.registers.edi.set_word(di);
        vm.registers.esi.set_word(si);
        vm.registers.ebp.set_word(bp);
        vm.registers.ebx.set_word(bx);
        vm.registers.edx.set_word(dx);
        vm.registers.ecx.set_word(cx);
        vm.registers.eax.set_word(ax);
    }
}

// 0x68
fn push_imm(vm: &mut Runtime, _op: u8) {
    if vm.mode.op32 {
        let v = vm.fetch_long();
        vm.push_long(v);
    } else {
        let v = vm.fetch_word();
        vm.push_word(v);
    }
}

// 0x6A
fn push_imm8(vm: &mut Runtime, _op: u8) {
    let b = vm.fetch_byte();
    if vm.mode.op32 {
        vm.push_long(sign_extend_long(b));
    } else {
        vm.push_word(sign_extend_word(b));
    }
}

// 0x9C
fn pushf(vm: &mut Runtime, _op: u8) {
    let flags = vm.flags | FLAG_ALWAYS_ON;
    if vm.mode.op32 {
        vm.push_long(flags);
    } else {
        vm.push_word(flags as u16);
    }
}

// 0x9D
fn popf(vm: &mut Runtime, _op: u8) {
    let v = if vm.mode.op32 {
        vm.pop_long()
    } else {
        vm.pop_word() as u32
    };
    vm.flags = (v & FLAG_MASK) | FLAG_ALWAYS_ON;
}

// ── far-pointer loads ───────────────────────────────────────────────────

pub(super) fn load_far_pointer(vm: &mut Runtime, op: u8, seg: SegId) {
    let (md, reg, rm) = fetch_modrm(vm);
    match decode_rm(vm, md, rm) {
        RmOperand::Mem(ea) => {
            if vm.mode.op32 {
                let off = vm.read_data_long(ea.seg, ea.off);
                let sel = vm.read_data_word(ea.seg, ea.off.wrapping_add(4));
                vm.registers.set32(reg, off);
                vm.registers.set_seg(seg, sel);
            } else {
                let off = vm.read_data_word(ea.seg, ea.off);
                let sel = vm.read_data_word(ea.seg, ea.off.wrapping_add(2));
                vm.registers.set16(reg, off);
                vm.registers.set_seg(seg, sel);
            }
        }
        RmOperand::Reg(_) => illegal_op(vm, op),
    }
}

// 0xC4
fn les(vm: &mut Runtime, op: u8) {
    load_far_pointer(vm, op, SegId::ES);
}

// 0xC5
fn lds(vm: &mut Runtime, op: u8) {
    load_far_pointer(vm, op, SegId::DS);
}

// ── converts, flag transfers, misc ──────────────────────────────────────

// 0x90
fn nop(_vm: &mut Runtime, _op: u8) {}

// 0x9B - no coprocessor to wait for
fn wait_op(_vm: &mut Runtime, _op: u8) {}

// 0x98 - CBW / CWDE
fn cbw(vm: &mut Runtime, _op: u8) {
    if vm.mode.op32 {
        let v = vm.registers.eax.word() as i16 as i32 as u32;
        vm.registers.eax.set_dword(v);
    } else if (vm.registers.eax.low() as i8) < 0 {
        vm.registers.eax.set_high(0xFF);
    } else {
        vm.registers.eax.set_high(0x00);
    }
}

// 0x99 - CWD / CDQ
fn cwd(vm: &mut Runtime, _op: u8) {
    if vm.mode.op32 {
        let fill = if (vm.registers.eax.dword() as i32) < 0 {
            0xFFFF_FFFF
        } else {
            0
        };
        vm.registers.edx.set_dword(fill);
    } else {
        let fill = if (vm.registers.eax.word() as i16) < 0 {
            0xFFFF
        } else {
            0
        };
        vm.registers.edx.set_word(fill);
    }
}

// 0x9E - AH into the low flag byte; bits 1, 3, 5 keep their fixed values
fn sahf(vm: &mut Runtime, _op: u8) {
    vm.flags =
        (vm.flags & !0xFF) | (vm.registers.eax.high() as u32 & 0xD5) | FLAG_ALWAYS_ON;
}

// 0x9F
fn lahf(vm: &mut Runtime, _op: u8) {
    let v = (vm.flags | FLAG_ALWAYS_ON) as u8;
    vm.registers.eax.set_high(v);
}

// 0xD7 - AL = [seg:BX+AL]
fn xlat(vm: &mut Runtime, _op: u8) {
    let seg = vm.data_seg(SegId::DS);
    let off = if vm.mode.addr32 {
        vm.registers
            .ebx
            .dword()
            .wrapping_add(vm.registers.eax.low() as u32)
    } else {
        vm.registers
            .ebx
            .word()
            .wrapping_add(vm.registers.eax.low() as u16) as u32
    };
    let v = vm.read_data_byte(seg, off);
    vm.registers.eax.set_low(v);
}

// 0xD8..=0xDF - x87 escape: consume the addressing bytes, the operation
// itself belongs to a coprocessor this machine does not have
fn esc(vm: &mut Runtime, _op: u8) {
    let (md, _reg, rm) = fetch_modrm(vm);
    let _ = decode_rm(vm, md, rm);
}

// ── port I/O ────────────────────────────────────────────────────────────

// 0xE4
fn in_al_imm(vm: &mut Runtime, _op: u8) {
    let port = vm.fetch_byte() as u16;
    let v = vm.bus.in_byte(port);
    vm.registers.eax.set_low(v);
}

// 0xE5
fn in_ax_imm(vm: &mut Runtime, _op: u8) {
    let port = vm.fetch_byte() as u16;
    if vm.mode.op32 {
        let v = vm.bus.in_long(port);
        vm.registers.eax.set_dword(v);
    } else {
        let v = vm.bus.in_word(port);
        vm.registers.eax.set_word(v);
    }
}

// 0xE6
fn out_imm_al(vm: &mut Runtime, _op: u8) {
    let port = vm.fetch_byte() as u16;
    let v = vm.registers.eax.low();
    vm.bus.out_byte(port, v);
}

// 0xE7
fn out_imm_ax(vm: &mut Runtime, _op: u8) {
    let port = vm.fetch_byte() as u16;
    if vm.mode.op32 {
        let v = vm.registers.eax.dword();
        vm.bus.out_long(port, v);
    } else {
        let v = vm.registers.eax.word();
        vm.bus.out_word(port, v);
    }
}

// 0xEC
fn in_al_dx(vm: &mut Runtime, _op: u8) {
    let port = vm.registers.edx.word();
    let v = vm.bus.in_byte(port);
    vm.registers.eax.set_low(v);
}

// 0xED
fn in_ax_dx(vm: &mut Runtime, _op: u8) {
    let port = vm.registers.edx.word();
    if vm.mode.op32 {
        let v = vm.bus.in_long(port);
        vm.registers.eax.set_dword(v);
    } else {
        let v = vm.bus.in_word(port);
        vm.registers.eax.set_word(v);
    }
}

// 0xEE
fn out_dx_al(vm: &mut Runtime, _op: u8) {
    let port = vm.registers.edx.word();
    let v = vm.registers.eax.low();
    vm.bus.out_byte(port, v);
}

// 0xEF
fn out_dx_ax(vm: &mut Runtime, _op: u8) {
    let port = vm.registers.edx.word();
    if vm.mode.op32 {
        let v = vm.registers.eax.dword();
        vm.bus.out_long(port, v);
    } else {
        let v = vm.registers.eax.word();
        vm.bus.out_word(port, v);
    }
}

// ── halting and single flags ────────────────────────────────────────────

// 0xF4
fn hlt(vm: &mut Runtime, _op: u8) {
    vm.halt_with(HaltCause::GuestHalt);
}

// 0xF5
fn cmc(vm: &mut Runtime, _op: u8) {
    vm.flip_flag(Carry);
}

// 0xF8
fn clc(vm: &mut Runtime, _op: u8) {
    vm.unset_flag(Carry);
}

// 0xF9
fn stc(vm: &mut Runtime, _op: u8) {
    vm.set_flag(Carry);
}

// 0xFA
fn cli(vm: &mut Runtime, _op: u8) {
    vm.unset_flag(Interrupt);
}

// 0xFB
fn sti(vm: &mut Runtime, _op: u8) {
    vm.set_flag(Interrupt);
}

// 0xFC
fn cld(vm: &mut Runtime, _op: u8) {
    vm.unset_flag(Directional);
}

// 0xFD
fn std_op(vm: &mut Runtime, _op: u8) {
    vm.set_flag(Directional);
}

/// The 256-entry primary dispatch table, one handler per opcode byte.
pub(crate) static OPTAB: [OpFn; 256] = [
    /* 0x00 */ arith::genop_byte_rm_r,
    /* 0x01 */ arith::genop_word_rm_r,
    /* 0x02 */ arith::genop_byte_r_rm,
    /* 0x03 */ arith::genop_word_r_rm,
    /* 0x04 */ arith::genop_byte_al_imm,
    /* 0x05 */ arith::genop_word_ax_imm,
    /* 0x06 */ push_sreg,
    /* 0x07 */ pop_sreg,
    /* 0x08 */ arith::genop_byte_rm_r,
    /* 0x09 */ arith::genop_word_rm_r,
    /* 0x0A */ arith::genop_byte_r_rm,
    /* 0x0B */ arith::genop_word_r_rm,
    /* 0x0C */ arith::genop_byte_al_imm,
    /* 0x0D */ arith::genop_word_ax_imm,
    /* 0x0E */ push_sreg,
    /* 0x0F */ prefix_reserved, // two-byte escape, handled in the pre-pass
    /* 0x10 */ arith::genop_byte_rm_r,
    /* 0x11 */ arith::genop_word_rm_r,
    /* 0x12 */ arith::genop_byte_r_rm,
    /* 0x13 */ arith::genop_word_r_rm,
    /* 0x14 */ arith::genop_byte_al_imm,
    /* 0x15 */ arith::genop_word_ax_imm,
    /* 0x16 */ push_sreg,
    /* 0x17 */ pop_sreg,
    /* 0x18 */ arith::genop_byte_rm_r,
    /* 0x19 */ arith::genop_word_rm_r,
    /* 0x1A */ arith::genop_byte_r_rm,
    /* 0x1B */ arith::genop_word_r_rm,
    /* 0x1C */ arith::genop_byte_al_imm,
    /* 0x1D */ arith::genop_word_ax_imm,
    /* 0x1E */ push_sreg,
    /* 0x1F */ pop_sreg,
    /* 0x20 */ arith::genop_byte_rm_r,
    /* 0x21 */ arith::genop_word_rm_r,
    /* 0x22 */ arith::genop_byte_r_rm,
    /* 0x23 */ arith::genop_word_r_rm,
    /* 0x24 */ arith::genop_byte_al_imm,
    /* 0x25 */ arith::genop_word_ax_imm,
    /* 0x26 */ prefix_reserved, // ES:
    /* 0x27 */ arith::daa_op,
    /* 0x28 */ arith::genop_byte_rm_r,
    /* 0x29 */ arith::genop_word_rm_r,
    /* 0x2A */ arith::genop_byte_r_rm,
    /* 0x2B */ arith::genop_word_r_rm,
    /* 0x2C */ arith::genop_byte_al_imm,
    /* 0x2D */ arith::genop_word_ax_imm,
    /* 0x2E */ prefix_reserved, // CS:
    /* 0x2F */ arith::das_op,
    /* 0x30 */ arith::genop_byte_rm_r,
    /* 0x31 */ arith::genop_word_rm_r,
    /* 0x32 */ arith::genop_byte_r_rm,
    /* 0x33 */ arith::genop_word_r_rm,
    /* 0x34 */ arith::genop_byte_al_imm,
    /* 0x35 */ arith::genop_word_ax_imm,
    /* 0x36 */ prefix_reserved, // SS:
    /* 0x37 */ arith::aaa_op,
    /* 0x38 */ arith::genop_byte_rm_r,
    /* 0x39 */ arith::genop_word_rm_r,
    /* 0x3A */ arith::genop_byte_r_rm,
    /* 0x3B */ arith::genop_word_r_rm,
    /* 0x3C */ arith::genop_byte_al_imm,
    /* 0x3D */ arith::genop_word_ax_imm,
    /* 0x3E */ prefix_reserved, // DS:
    /* 0x3F */ arith::aas_op,
    /* 0x40 */ arith::inc_reg,
    /* 0x41 */ arith::inc_reg,
    /* 0x42 */ arith::inc_reg,
    /* 0x43 */ arith::inc_reg,
    /* 0x44 */ arith::inc_reg,
    /* 0x45 */ arith::inc_reg,
    /* 0x46 */ arith::inc_reg,
    /* 0x47 */ arith::inc_reg,
    /* 0x48 */ arith::dec_reg,
    /* 0x49 */ arith::dec_reg,
    /* 0x4A */ arith::dec_reg,
    /* 0x4B */ arith::dec_reg,
    /* 0x4C */ arith::dec_reg,
    /* 0x4D */ arith::dec_reg,
    /* 0x4E */ arith::dec_reg,
    /* 0x4F */ arith::dec_reg,
    /* 0x50 */ push_reg,
    /* 0x51 */ push_reg,
    /* 0x52 */ push_reg,
    /* 0x53 */ push_reg,
    /* 0x54 */ push_reg,
    /* 0x55 */ push_reg,
    /* 0x56 */ push_reg,
    /* 0x57 */ push_reg,
    /* 0x58 */ pop_reg,
    /* 0x59 */ pop_reg,
    /* 0x5A */ pop_reg,
    /* 0x5B */ pop_reg,
    /* 0x5C */ pop_reg,
    /* 0x5D */ pop_reg,
    /* 0x5E */ pop_reg,
    /* 0x5F */ pop_reg,
    /* 0x60 */ pusha,
    /* 0x61 */ popa,
    /* 0x62 */ illegal_op, // BOUND
    /* 0x63 */ illegal_op, // ARPL
    /* 0x64 */ prefix_reserved, // FS:
    /* 0x65 */ prefix_reserved, // GS:
    /* 0x66 */ prefix_reserved, // operand size
    /* 0x67 */ prefix_reserved, // address size
    /* 0x68 */ push_imm,
    /* 0x69 */ arith::imul_r_rm_imm,
    /* 0x6A */ push_imm8,
    /* 0x6B */ arith::imul_r_rm_imm8,
    /* 0x6C */ string::ins,
    /* 0x6D */ string::ins,
    /* 0x6E */ string::outs,
    /* 0x6F */ string::outs,
    /* 0x70 */ control::jcc_short,
    /* 0x71 */ control::jcc_short,
    /* 0x72 */ control::jcc_short,
    /* 0x73 */ control::jcc_short,
    /* 0x74 */ control::jcc_short,
    /* 0x75 */ control::jcc_short,
    /* 0x76 */ control::jcc_short,
    /* 0x77 */ control::jcc_short,
    /* 0x78 */ control::jcc_short,
    /* 0x79 */ control::jcc_short,
    /* 0x7A */ control::jcc_short,
    /* 0x7B */ control::jcc_short,
    /* 0x7C */ control::jcc_short,
    /* 0x7D */ control::jcc_short,
    /* 0x7E */ control::jcc_short,
    /* 0x7F */ control::jcc_short,
    /* 0x80 */ arith::alu_group_imm,
    /* 0x81 */ arith::alu_group_imm,
    /* 0x82 */ arith::alu_group_imm, // alias of 0x80
    /* 0x83 */ arith::alu_group_imm,
    /* 0x84 */ arith::test_byte_rm_r,
    /* 0x85 */ arith::test_word_rm_r,
    /* 0x86 */ xchg_byte_rm_r,
    /* 0x87 */ xchg_word_rm_r,
    /* 0x88 */ mov_byte_rm_r,
    /* 0x89 */ mov_word_rm_r,
    /* 0x8A */ mov_byte_r_rm,
    /* 0x8B */ mov_word_r_rm,
    /* 0x8C */ mov_rm_sreg,
    /* 0x8D */ lea,
    /* 0x8E */ mov_sreg_rm,
    /* 0x8F */ pop_rm,
    /* 0x90 */ nop,
    /* 0x91 */ xchg_ax_reg,
    /* 0x92 */ xchg_ax_reg,
    /* 0x93 */ xchg_ax_reg,
    /* 0x94 */ xchg_ax_reg,
    /* 0x95 */ xchg_ax_reg,
    /* 0x96 */ xchg_ax_reg,
    /* 0x97 */ xchg_ax_reg,
    /* 0x98 */ cbw,
    /* 0x99 */ cwd,
    /* 0x9A */ control::call_far,
    /* 0x9B */ wait_op,
    /* 0x9C */ pushf,
    /* 0x9D */ popf,
    /* 0x9E */ sahf,
    /* 0x9F */ lahf,
    /* 0xA0 */ mov_al_moffs,
    /* 0xA1 */ mov_ax_moffs,
    /* 0xA2 */ mov_moffs_al,
    /* 0xA3 */ mov_moffs_ax,
    /* 0xA4 */ string::movs,
    /* 0xA5 */ string::movs,
    /* 0xA6 */ string::cmps,
    /* 0xA7 */ string::cmps,
    /* 0xA8 */ arith::test_al_imm,
    /* 0xA9 */ arith::test_ax_imm,
    /* 0xAA */ string::stos,
    /* 0xAB */ string::stos,
    /* 0xAC */ string::lods,
    /* 0xAD */ string::lods,
    /* 0xAE */ string::scas,
    /* 0xAF */ string::scas,
    /* 0xB0 */ mov_reg8_imm,
    /* 0xB1 */ mov_reg8_imm,
    /* 0xB2 */ mov_reg8_imm,
    /* 0xB3 */ mov_reg8_imm,
    /* 0xB4 */ mov_reg8_imm,
    /* 0xB5 */ mov_reg8_imm,
    /* 0xB6 */ mov_reg8_imm,
    /* 0xB7 */ mov_reg8_imm,
    /* 0xB8 */ mov_reg_imm,
    /* 0xB9 */ mov_reg_imm,
    /* 0xBA */ mov_reg_imm,
    /* 0xBB */ mov_reg_imm,
    /* 0xBC */ mov_reg_imm,
    /* 0xBD */ mov_reg_imm,
    /* 0xBE */ mov_reg_imm,
    /* 0xBF */ mov_reg_imm,
    /* 0xC0 */ shift::shift_byte_imm,
    /* 0xC1 */ shift::shift_word_imm,
    /* 0xC2 */ control::ret_imm,
    /* 0xC3 */ control::ret,
    /* 0xC4 */ les,
    /* 0xC5 */ lds,
    /* 0xC6 */ mov_rm_imm_byte,
    /* 0xC7 */ mov_rm_imm_word,
    /* 0xC8 */ control::enter,
    /* 0xC9 */ control::leave,
    /* 0xCA */ control::retf_imm,
    /* 0xCB */ control::retf,
    /* 0xCC */ control::int3,
    /* 0xCD */ control::int_imm,
    /* 0xCE */ control::into_op,
    /* 0xCF */ control::iret,
    /* 0xD0 */ shift::shift_byte_1,
    /* 0xD1 */ shift::shift_word_1,
    /* 0xD2 */ shift::shift_byte_cl,
    /* 0xD3 */ shift::shift_word_cl,
    /* 0xD4 */ arith::aam_op,
    /* 0xD5 */ arith::aad_op,
    /* 0xD6 */ illegal_op, // undocumented SALC
    /* 0xD7 */ xlat,
    /* 0xD8 */ esc,
    /* 0xD9 */ esc,
    /* 0xDA */ esc,
    /* 0xDB */ esc,
    /* 0xDC */ esc,
    /* 0xDD */ esc,
    /* 0xDE */ esc,
    /* 0xDF */ esc,
    /* 0xE0 */ control::loopne,
    /* 0xE1 */ control::loope,
    /* 0xE2 */ control::loop_op,
    /* 0xE3 */ control::jcxz,
    /* 0xE4 */ in_al_imm,
    /* 0xE5 */ in_ax_imm,
    /* 0xE6 */ out_imm_al,
    /* 0xE7 */ out_imm_ax,
    /* 0xE8 */ control::call_near,
    /* 0xE9 */ control::jmp_near,
    /* 0xEA */ control::jmp_far,
    /* 0xEB */ control::jmp_short,
    /* 0xEC */ in_al_dx,
    /* 0xED */ in_ax_dx,
    /* 0xEE */ out_dx_al,
    /* 0xEF */ out_dx_ax,
    /* 0xF0 */ prefix_reserved, // LOCK
    /* 0xF1 */ illegal_op, // synthetic service trap
    /* 0xF2 */ prefix_reserved, // REPNE
    /* 0xF3 */ prefix_reserved, // REPE
    /* 0xF4 */ hlt,
    /* 0xF5 */ cmc,
    /* 0xF6 */ arith::group3_byte,
    /* 0xF7 */ arith::group3_word,
    /* 0xF8 */ clc,
    /* 0xF9 */ stc,
    /* 0xFA */ cli,
    /* 0xFB */ sti,
    /* 0xFC */ cld,
    /* 0xFD */ std_op,
    /* 0xFE */ arith::group4,
    /* 0xFF */ control::group5,
];
