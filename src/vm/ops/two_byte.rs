//! Secondary opcode table, reached through the 0x0F escape (286 or better).

use log::error;

use crate::vm::alu;
use crate::vm::decode::{decode_rm, fetch_modrm, RmOperand};
use crate::vm::ops::control::{condition, jump_rel};
use crate::vm::ops::{load_far_pointer, OpFn};
use crate::vm::registers::SegId;
use crate::vm::runtime::CpuFlag::*;
use crate::vm::runtime::{HaltCause, Runtime};

/// Undefined secondary opcode. Same SP-keyed protocol as the one-byte
/// illegal handler.
fn illegal_op2(vm: &mut Runtime, op: u8) {
    if vm.registers.esp.word() != 0 {
        error!(
            "{:04X}:{:04X}: illegal opcode 0F {:02X}",
            vm.saved_cs, vm.saved_ip as u16, op
        );
        vm.halt_with(HaltCause::IllegalOpcode);
    } else {
        vm.registers.cs = vm.saved_cs;
        vm.registers.eip = vm.saved_ip;
        vm.halt_with(HaltCause::ServiceReturn);
    }
}

// 0x0F 0x80..=0x8F
fn jcc_near(vm: &mut Runtime, op: u8) {
    let disp = if vm.mode.op32 {
        vm.fetch_long() as i32
    } else {
        vm.fetch_word() as i16 as i32
    };
    if condition(vm, op & 0x0F) {
        jump_rel(vm, disp);
    }
}

// 0x0F 0x90..=0x9F
fn setcc(vm: &mut Runtime, op: u8) {
    let (md, _reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let v = condition(vm, op & 0x0F) as u8;
    vm.write_rm8(&dst, v);
}

fn push_seg16(vm: &mut Runtime, seg: SegId) {
    let v = vm.registers.seg(seg);
    if vm.mode.op32 {
        vm.push_long(v as u32);
    } else {
        vm.push_word(v);
    }
}

fn pop_seg16(vm: &mut Runtime, seg: SegId) {
    let v = if vm.mode.op32 {
        vm.pop_long() as u16
    } else {
        vm.pop_word()
    };
    vm.registers.set_seg(seg, v);
}

// 0x0F 0xA0
fn push_fs(vm: &mut Runtime, _op: u8) {
    push_seg16(vm, SegId::FS);
}

// 0x0F 0xA1
fn pop_fs(vm: &mut Runtime, _op: u8) {
    pop_seg16(vm, SegId::FS);
}

// 0x0F 0xA8
fn push_gs(vm: &mut Runtime, _op: u8) {
    push_seg16(vm, SegId::GS);
}

// 0x0F 0xA9
fn pop_gs(vm: &mut Runtime, _op: u8) {
    pop_seg16(vm, SegId::GS);
}

// ── bit tests ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum BitOp {
    Test,
    Set,
    Reset,
    Complement,
}

fn apply_bit_word(v: u16, mask: u16, kind: BitOp) -> u16 {
    match kind {
        BitOp::Test => v,
        BitOp::Set => v | mask,
        BitOp::Reset => v & !mask,
        BitOp::Complement => v ^ mask,
    }
}

fn apply_bit_long(v: u32, mask: u32, kind: BitOp) -> u32 {
    match kind {
        BitOp::Test => v,
        BitOp::Set => v | mask,
        BitOp::Reset => v & !mask,
        BitOp::Complement => v ^ mask,
    }
}

/// Register-sourced bit offset. Memory operands address the element the
/// signed offset lands in, so the bit index may walk outside the nominal
/// operand.
fn bit_rm_reg(vm: &mut Runtime, kind: BitOp) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let bitoff = vm.registers.get32(reg) as i32;
        let mask = 1u32 << (bitoff & 31);
        match dst {
            RmOperand::Reg(r) => {
                let v = vm.registers.get32(r);
                vm.update_flag(Carry, v & mask != 0);
                if kind != BitOp::Test {
                    vm.registers.set32(r, apply_bit_long(v, mask, kind));
                }
            }
            RmOperand::Mem(ea) => {
                let off = ea.off.wrapping_add_signed((bitoff >> 5) * 4);
                let v = vm.read_data_long(ea.seg, off);
                vm.update_flag(Carry, v & mask != 0);
                if kind != BitOp::Test {
                    vm.write_data_long(ea.seg, off, apply_bit_long(v, mask, kind));
                }
            }
        }
    } else {
        let bitoff = vm.registers.get16(reg) as i16 as i32;
        let mask = 1u16 << (bitoff & 15);
        match dst {
            RmOperand::Reg(r) => {
                let v = vm.registers.get16(r);
                vm.update_flag(Carry, v & mask != 0);
                if kind != BitOp::Test {
                    vm.registers.set16(r, apply_bit_word(v, mask, kind));
                }
            }
            RmOperand::Mem(ea) => {
                let off = ea.off.wrapping_add_signed((bitoff >> 4) * 2);
                let v = vm.read_data_word(ea.seg, off);
                vm.update_flag(Carry, v & mask != 0);
                if kind != BitOp::Test {
                    vm.write_data_word(ea.seg, off, apply_bit_word(v, mask, kind));
                }
            }
        }
    }
}

// 0x0F 0xA3
fn bt_rm_r(vm: &mut Runtime, _op: u8) {
    bit_rm_reg(vm, BitOp::Test);
}

// 0x0F 0xAB
fn bts_rm_r(vm: &mut Runtime, _op: u8) {
    bit_rm_reg(vm, BitOp::Set);
}

// 0x0F 0xB3
fn btr_rm_r(vm: &mut Runtime, _op: u8) {
    bit_rm_reg(vm, BitOp::Reset);
}

// 0x0F 0xBB
fn btc_rm_r(vm: &mut Runtime, _op: u8) {
    bit_rm_reg(vm, BitOp::Complement);
}

// 0x0F 0xBA - immediate bit offset; no element displacement for this form
fn bt_group_imm(vm: &mut Runtime, op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let imm = vm.fetch_byte();
    let kind = match reg {
        0b100 => BitOp::Test,
        0b101 => BitOp::Set,
        0b110 => BitOp::Reset,
        0b111 => BitOp::Complement,
        _ => return illegal_op2(vm, op),
    };
    if vm.mode.op32 {
        let mask = 1u32 << (imm & 31);
        let v = vm.read_rm32(&dst);
        vm.update_flag(Carry, v & mask != 0);
        if kind != BitOp::Test {
            vm.write_rm32(&dst, apply_bit_long(v, mask, kind));
        }
    } else {
        let mask = 1u16 << (imm & 15);
        let v = vm.read_rm16(&dst);
        vm.update_flag(Carry, v & mask != 0);
        if kind != BitOp::Test {
            vm.write_rm16(&dst, apply_bit_word(v, mask, kind));
        }
    }
}

// ── double shifts ───────────────────────────────────────────────────────

fn shld_common(vm: &mut Runtime, count_from_cl: bool) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let count = if count_from_cl {
        vm.registers.ecx.low()
    } else {
        vm.fetch_byte()
    };
    if vm.mode.op32 {
        let d = vm.read_rm32(&dst);
        let fill = vm.registers.get32(reg);
        let res = alu::shld_long(vm, d, fill, count);
        vm.write_rm32(&dst, res);
    } else {
        let d = vm.read_rm16(&dst);
        let fill = vm.registers.get16(reg);
        let res = alu::shld_word(vm, d, fill, count);
        vm.write_rm16(&dst, res);
    }
}

fn shrd_common(vm: &mut Runtime, count_from_cl: bool) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let count = if count_from_cl {
        vm.registers.ecx.low()
    } else {
        vm.fetch_byte()
    };
    if vm.mode.op32 {
        let d = vm.read_rm32(&dst);
        let fill = vm.registers.get32(reg);
        let res = alu::shrd_long(vm, d, fill, count);
        vm.write_rm32(&dst, res);
    } else {
        let d = vm.read_rm16(&dst);
        let fill = vm.registers.get16(reg);
        let res = alu::shrd_word(vm, d, fill, count);
        vm.write_rm16(&dst, res);
    }
}

// 0x0F 0xA4
fn shld_imm(vm: &mut Runtime, _op: u8) {
    shld_common(vm, false);
}

// 0x0F 0xA5
fn shld_cl(vm: &mut Runtime, _op: u8) {
    shld_common(vm, true);
}

// 0x0F 0xAC
fn shrd_imm(vm: &mut Runtime, _op: u8) {
    shrd_common(vm, false);
}

// 0x0F 0xAD
fn shrd_cl(vm: &mut Runtime, _op: u8) {
    shrd_common(vm, true);
}

// 0x0F 0xAF - two-operand IMUL, result into the register
fn imul_r_rm(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let a = vm.registers.get32(reg) as i32 as i64;
        let b = vm.read_rm32(&src) as i32 as i64;
        let res = a * b;
        vm.registers.set32(reg, res as u32);
        let overflow = res as i32 as i64 != res;
        vm.update_flag(Carry, overflow);
        vm.update_flag(Overflow, overflow);
    } else {
        let a = vm.registers.get16(reg) as i16 as i32;
        let b = vm.read_rm16(&src) as i16 as i32;
        let res = a * b;
        vm.registers.set16(reg, res as u16);
        let overflow = res as i16 as i32 != res;
        vm.update_flag(Carry, overflow);
        vm.update_flag(Overflow, overflow);
    }
}

// 0x0F 0xB2 / 0xB4 / 0xB5
fn lss(vm: &mut Runtime, op: u8) {
    load_far_pointer(vm, op, SegId::SS);
}

fn lfs(vm: &mut Runtime, op: u8) {
    load_far_pointer(vm, op, SegId::FS);
}

fn lgs(vm: &mut Runtime, op: u8) {
    load_far_pointer(vm, op, SegId::GS);
}

// ── widening moves ──────────────────────────────────────────────────────

// 0x0F 0xB6
fn movzx_byte(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    let v = vm.read_rm8(&src);
    if vm.mode.op32 {
        vm.registers.set32(reg, v as u32);
    } else {
        vm.registers.set16(reg, v as u16);
    }
}

// 0x0F 0xB7
fn movzx_word(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    let v = vm.read_rm16(&src);
    if vm.mode.op32 {
        vm.registers.set32(reg, v as u32);
    } else {
        vm.registers.set16(reg, v);
    }
}

// 0x0F 0xBE
fn movsx_byte(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    let v = vm.read_rm8(&src);
    if vm.mode.op32 {
        vm.registers.set32(reg, v as i8 as i32 as u32);
    } else {
        vm.registers.set16(reg, v as i8 as i16 as u16);
    }
}

// 0x0F 0xBF
fn movsx_word(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    let v = vm.read_rm16(&src);
    if vm.mode.op32 {
        vm.registers.set32(reg, v as i16 as i32 as u32);
    } else {
        vm.registers.set16(reg, v);
    }
}

// ── bit scans ───────────────────────────────────────────────────────────

// 0x0F 0xBC - lowest set bit; destination untouched when the source is zero
fn bsf(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let v = vm.read_rm32(&src);
        vm.update_flag(Zero, v == 0);
        if v != 0 {
            vm.registers.set32(reg, v.trailing_zeros());
        }
    } else {
        let v = vm.read_rm16(&src);
        vm.update_flag(Zero, v == 0);
        if v != 0 {
            vm.registers.set16(reg, v.trailing_zeros() as u16);
        }
    }
}

// 0x0F 0xBD - highest set bit
fn bsr(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let v = vm.read_rm32(&src);
        vm.update_flag(Zero, v == 0);
        if v != 0 {
            vm.registers.set32(reg, 31 - v.leading_zeros());
        }
    } else {
        let v = vm.read_rm16(&src);
        vm.update_flag(Zero, v == 0);
        if v != 0 {
            vm.registers.set16(reg, (15 - v.leading_zeros()) as u16);
        }
    }
}

/// The 256-entry secondary dispatch table.
pub(crate) static OPTAB2: [OpFn; 256] = [
    /* 0x00 */ illegal_op2,
    /* 0x01 */ illegal_op2,
    /* 0x02 */ illegal_op2,
    /* 0x03 */ illegal_op2,
    /* 0x04 */ illegal_op2,
    /* 0x05 */ illegal_op2,
    /* 0x06 */ illegal_op2,
    /* 0x07 */ illegal_op2,
    /* 0x08 */ illegal_op2,
    /* 0x09 */ illegal_op2,
    /* 0x0A */ illegal_op2,
    /* 0x0B */ illegal_op2,
    /* 0x0C */ illegal_op2,
    /* 0x0D */ illegal_op2,
    /* 0x0E */ illegal_op2,
    /* 0x0F */ illegal_op2,
    /* 0x10 */ illegal_op2,
    /* 0x11 */ illegal_op2,
    /* 0x12 */ illegal_op2,
    /* 0x13 */ illegal_op2,
    /* 0x14 */ illegal_op2,
    /* 0x15 */ illegal_op2,
    /* 0x16 */ illegal_op2,
    /* 0x17 */ illegal_op2,
    /* 0x18 */ illegal_op2,
    /* 0x19 */ illegal_op2,
    /* 0x1A */ illegal_op2,
    /* 0x1B */ illegal_op2,
    /* 0x1C */ illegal_op2,
    /* 0x1D */ illegal_op2,
    /* 0x1E */ illegal_op2,
    /* 0x1F */ illegal_op2,
    /* 0x20 */ illegal_op2,
    /* 0x21 */ illegal_op2,
    /* 0x22 */ illegal_op2,
    /* 0x23 */ illegal_op2,
    /* 0x24 */ illegal_op2,
    /* 0x25 */ illegal_op2,
    /* 0x26 */ illegal_op2,
    /* 0x27 */ illegal_op2,
    /* 0x28 */ illegal_op2,
    /* 0x29 */ illegal_op2,
    /* 0x2A */ illegal_op2,
    /* 0x2B */ illegal_op2,
    /* 0x2C */ illegal_op2,
    /* 0x2D */ illegal_op2,
    /* 0x2E */ illegal_op2,
    /* 0x2F */ illegal_op2,
    /* 0x30 */ illegal_op2,
    /* 0x31 */ illegal_op2,
    /* 0x32 */ illegal_op2,
    /* 0x33 */ illegal_op2,
    /* 0x34 */ illegal_op2,
    /* 0x35 */ illegal_op2,
    /* 0x36 */ illegal_op2,
    /* 0x37 */ illegal_op2,
    /* 0x38 */ illegal_op2,
    /* 0x39 */ illegal_op2,
    /* 0x3A */ illegal_op2,
    /* 0x3B */ illegal_op2,
    /* 0x3C */ illegal_op2,
    /* 0x3D */ illegal_op2,
    /* 0x3E */ illegal_op2,
    /* 0x3F */ illegal_op2,
    /* 0x40 */ illegal_op2,
    /* 0x41 */ illegal_op2,
    /* 0x42 */ illegal_op2,
    /* 0x43 */ illegal_op2,
    /* 0x44 */ illegal_op2,
    /* 0x45 */ illegal_op2,
    /* 0x46 */ illegal_op2,
    /* 0x47 */ illegal_op2,
    /* 0x48 */ illegal_op2,
    /* 0x49 */ illegal_op2,
    /* 0x4A */ illegal_op2,
    /* 0x4B */ illegal_op2,
    /* 0x4C */ illegal_op2,
    /* 0x4D */ illegal_op2,
    /* 0x4E */ illegal_op2,
    /* 0x4F */ illegal_op2,
    /* 0x50 */ illegal_op2,
    /* 0x51 */ illegal_op2,
    /* 0x52 */ illegal_op2,
    /* 0x53 */ illegal_op2,
    /* 0x54 */ illegal_op2,
    /* 0x55 */ illegal_op2,
    /* 0x56 */ illegal_op2,
    /* 0x57 */ illegal_op2,
    /* 0x58 */ illegal_op2,
    /* 0x59 */ illegal_op2,
    /* 0x5A */ illegal_op2,
    /* 0x5B */ illegal_op2,
    /* 0x5C */ illegal_op2,
    /* 0x5D */ illegal_op2,
    /* 0x5E */ illegal_op2,
    /* 0x5F */ illegal_op2,
    /* 0x60 */ illegal_op2,
    /* 0x61 */ illegal_op2,
    /* 0x62 */ illegal_op2,
    /* 0x63 */ illegal_op2,
    /* 0x64 */ illegal_op2,
    /* 0x65 */ illegal_op2,
    /* 0x66 */ illegal_op2,
    /* 0x67 */ illegal_op2,
    /* 0x68 */ illegal_op2,
    /* 0x69 */ illegal_op2,
    /* 0x6A */ illegal_op2,
    /* 0x6B */ illegal_op2,
    /* 0x6C */ illegal_op2,
    /* 0x6D */ illegal_op2,
    /* 0x6E */ illegal_op2,
    /* 0x6F */ illegal_op2,
    /* 0x70 */ illegal_op2,
    /* 0x71 */ illegal_op2,
    /* 0x72 */ illegal_op2,
    /* 0x73 */ illegal_op2,
    /* 0x74 */ illegal_op2,
    /* 0x75 */ illegal_op2,
    /* 0x76 */ illegal_op2,
    /* 0x77 */ illegal_op2,
    /* 0x78 */ illegal_op2,
    /* 0x79 */ illegal_op2,
    /* 0x7A */ illegal_op2,
    /* 0x7B */ illegal_op2,
    /* 0x7C */ illegal_op2,
    /* 0x7D */ illegal_op2,
    /* 0x7E */ illegal_op2,
    /* 0x7F */ illegal_op2,
    /* 0x80 */ jcc_near,
    /* 0x81 */ jcc_near,
    /* 0x82 */ jcc_near,
    /* 0x83 */ jcc_near,
    /* 0x84 */ jcc_near,
    /* 0x85 */ jcc_near,
    /* 0x86 */ jcc_near,
    /* 0x87 */ jcc_near,
    /* 0x88 */ jcc_near,
    /* 0x89 */ jcc_near,
    /* 0x8A */ jcc_near,
    /* 0x8B */ jcc_near,
    /* 0x8C */ jcc_near,
    /* 0x8D */ jcc_near,
    /* 0x8E */ jcc_near,
    /* 0x8F */ jcc_near,
    /* 0x90 */ setcc,
    /* 0x91 */ setcc,
    /* 0x92 */ setcc,
    /* 0x93 */ setcc,
    /* 0x94 */ setcc,
    /* 0x95 */ setcc,
    /* 0x96 */ setcc,
    /* 0x97 */ setcc,
    /* 0x98 */ setcc,
    /* 0x99 */ setcc,
    /* 0x9A */ setcc,
    /* 0x9B */ setcc,
    /* 0x9C */ setcc,
    /* 0x9D */ setcc,
    /* 0x9E */ setcc,
    /* 0x9F */ setcc,
    /* 0xA0 */ push_fs,
    /* 0xA1 */ pop_fs,
    /* 0xA2 */ illegal_op2,
    /* 0xA3 */ bt_rm_r,
    /* 0xA4 */ shld_imm,
    /* 0xA5 */ shld_cl,
    /* 0xA6 */ illegal_op2,
    /* 0xA7 */ illegal_op2,
    /* 0xA8 */ push_gs,
    /* 0xA9 */ pop_gs,
    /* 0xAA */ illegal_op2,
    /* 0xAB */ bts_rm_r,
    /* 0xAC */ shrd_imm,
    /* 0xAD */ shrd_cl,
    /* 0xAE */ illegal_op2,
    /* 0xAF */ imul_r_rm,
    /* 0xB0 */ illegal_op2,
    /* 0xB1 */ illegal_op2,
    /* 0xB2 */ lss,
    /* 0xB3 */ btr_rm_r,
    /* 0xB4 */ lfs,
    /* 0xB5 */ lgs,
    /* 0xB6 */ movzx_byte,
    /* 0xB7 */ movzx_word,
    /* 0xB8 */ illegal_op2,
    /* 0xB9 */ illegal_op2,
    /* 0xBA */ bt_group_imm,
    /* 0xBB */ btc_rm_r,
    /* 0xBC */ bsf,
    /* 0xBD */ bsr,
    /* 0xBE */ movsx_byte,
    /* 0xBF */ movsx_word,
    /* 0xC0 */ illegal_op2,
    /* 0xC1 */ illegal_op2,
    /* 0xC2 */ illegal_op2,
    /* 0xC3 */ illegal_op2,
    /* 0xC4 */ illegal_op2,
    /* 0xC5 */ illegal_op2,
    /* 0xC6 */ illegal_op2,
    /* 0xC7 */ illegal_op2,
    /* 0xC8 */ illegal_op2,
    /* 0xC9 */ illegal_op2,
    /* 0xCA */ illegal_op2,
    /* 0xCB */ illegal_op2,
    /* 0xCC */ illegal_op2,
    /* 0xCD */ illegal_op2,
    /* 0xCE */ illegal_op2,
    /* 0xCF */ illegal_op2,
    /* 0xD0 */ illegal_op2,
    /* 0xD1 */ illegal_op2,
    /* 0xD2 */ illegal_op2,
    /* 0xD3 */ illegal_op2,
    /* 0xD4 */ illegal_op2,
    /* 0xD5 */ illegal_op2,
    /* 0xD6 */ illegal_op2,
    /* 0xD7 */ illegal_op2,
    /* 0xD8 */ illegal_op2,
    /* 0xD9 */ illegal_op2,
    /* 0xDA */ illegal_op2,
    /* 0xDB */ illegal_op2,
    /* 0xDC */ illegal_op2,
    /* 0xDD */ illegal_op2,
    /* 0xDE */ illegal_op2,
    /* 0xDF */ illegal_op2,
    /* 0xE0 */ illegal_op2,
    /* 0xE1 */ illegal_op2,
    /* 0xE2 */ illegal_op2,
    /* 0xE3 */ illegal_op2,
    /* 0xE4 */ illegal_op2,
    /* 0xE5 */ illegal_op2,
    /* 0xE6 */ illegal_op2,
    /* 0xE7 */ illegal_op2,
    /* 0xE8 */ illegal_op2,
    /* 0xE9 */ illegal_op2,
    /* 0xEA */ illegal_op2,
    /* 0xEB */ illegal_op2,
    /* 0xEC */ illegal_op2,
    /* 0xED */ illegal_op2,
    /* 0xEE */ illegal_op2,
    /* 0xEF */ illegal_op2,
    /* 0xF0 */ illegal_op2,
    /* 0xF1 */ illegal_op2,
    /* 0xF2 */ illegal_op2,
    /* 0xF3 */ illegal_op2,
    /* 0xF4 */ illegal_op2,
    /* 0xF5 */ illegal_op2,
    /* 0xF6 */ illegal_op2,
    /* 0xF7 */ illegal_op2,
    /* 0xF8 */ illegal_op2,
    /* 0xF9 */ illegal_op2,
    /* 0xFA */ illegal_op2,
    /* 0xFB */ illegal_op2,
    /* 0xFC */ illegal_op2,
    /* 0xFD */ illegal_op2,
    /* 0xFE */ illegal_op2,
    /* 0xFF */ illegal_op2,
];
