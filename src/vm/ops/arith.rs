//! The eight-way ALU opcode families and the integer groups.

use crate::utils::number::{sign_extend_word, word_to_long};
use crate::vm::alu;
use crate::vm::decode::{decode_rm, fetch_modrm};
use crate::vm::ops::{control, illegal_op};
use crate::vm::runtime::CpuFlag::*;
use crate::vm::runtime::Runtime;

type AluByteFn = fn(&mut Runtime, u8, u8) -> u8;
type AluWordFn = fn(&mut Runtime, u16, u16) -> u16;
type AluLongFn = fn(&mut Runtime, u32, u32) -> u32;

// ADD, OR, ADC, SBB, AND, SUB, XOR, CMP - indexed by opcode bits 5:3, the
// same ordering the 0x80..0x83 group reuses in its reg field.
static GENOP_BYTE: [AluByteFn; 8] = [
    alu::add_byte,
    alu::or_byte,
    alu::adc_byte,
    alu::sbb_byte,
    alu::and_byte,
    alu::sub_byte,
    alu::xor_byte,
    alu::cmp_byte,
];

static GENOP_WORD: [AluWordFn; 8] = [
    alu::add_word,
    alu::or_word,
    alu::adc_word,
    alu::sbb_word,
    alu::and_word,
    alu::sub_word,
    alu::xor_word,
    alu::cmp_word,
];

static GENOP_LONG: [AluLongFn; 8] = [
    alu::add_long,
    alu::or_long,
    alu::adc_long,
    alu::sbb_long,
    alu::and_long,
    alu::sub_long,
    alu::xor_long,
    alu::cmp_long,
];

const GENOP_CMP: usize = 7;

// 0x00, 0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38
pub(super) fn genop_byte_rm_r(vm: &mut Runtime, op: u8) {
    let idx = ((op >> 3) & 0b111) as usize;
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let d = vm.read_rm8(&dst);
    let s = vm.registers.get8(reg);
    let res = GENOP_BYTE[idx](vm, d, s);
    if idx != GENOP_CMP {
        vm.write_rm8(&dst, res);
    }
}

// 0x01, 0x09, 0x11, 0x19, 0x21, 0x29, 0x31, 0x39
pub(super) fn genop_word_rm_r(vm: &mut Runtime, op: u8) {
    let idx = ((op >> 3) & 0b111) as usize;
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let d = vm.read_rm32(&dst);
        let s = vm.registers.get32(reg);
        let res = GENOP_LONG[idx](vm, d, s);
        if idx != GENOP_CMP {
            vm.write_rm32(&dst, res);
        }
    } else {
        let d = vm.read_rm16(&dst);
        let s = vm.registers.get16(reg);
        let res = GENOP_WORD[idx](vm, d, s);
        if idx != GENOP_CMP {
            vm.write_rm16(&dst, res);
        }
    }
}

// 0x02, 0x0A, 0x12, 0x1A, 0x22, 0x2A, 0x32, 0x3A
pub(super) fn genop_byte_r_rm(vm: &mut Runtime, op: u8) {
    let idx = ((op >> 3) & 0b111) as usize;
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    let d = vm.registers.get8(reg);
    let s = vm.read_rm8(&src);
    let res = GENOP_BYTE[idx](vm, d, s);
    if idx != GENOP_CMP {
        vm.registers.set8(reg, res);
    }
}

// 0x03, 0x0B, 0x13, 0x1B, 0x23, 0x2B, 0x33, 0x3B
pub(super) fn genop_word_r_rm(vm: &mut Runtime, op: u8) {
    let idx = ((op >> 3) & 0b111) as usize;
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let d = vm.registers.get32(reg);
        let s = vm.read_rm32(&src);
        let res = GENOP_LONG[idx](vm, d, s);
        if idx != GENOP_CMP {
            vm.registers.set32(reg, res);
        }
    } else {
        let d = vm.registers.get16(reg);
        let s = vm.read_rm16(&src);
        let res = GENOP_WORD[idx](vm, d, s);
        if idx != GENOP_CMP {
            vm.registers.set16(reg, res);
        }
    }
}

// 0x04, 0x0C, 0x14, 0x1C, 0x24, 0x2C, 0x34, 0x3C
pub(super) fn genop_byte_al_imm(vm: &mut Runtime, op: u8) {
    let idx = ((op >> 3) & 0b111) as usize;
    let d = vm.registers.eax.low();
    let s = vm.fetch_byte();
    let res = GENOP_BYTE[idx](vm, d, s);
    if idx != GENOP_CMP {
        vm.registers.eax.set_low(res);
    }
}

// 0x05, 0x0D, 0x15, 0x1D, 0x25, 0x2D, 0x35, 0x3D
pub(super) fn genop_word_ax_imm(vm: &mut Runtime, op: u8) {
    let idx = ((op >> 3) & 0b111) as usize;
    if vm.mode.op32 {
        let d = vm.registers.eax.dword();
        let s = vm.fetch_long();
        let res = GENOP_LONG[idx](vm, d, s);
        if idx != GENOP_CMP {
            vm.registers.eax.set_dword(res);
        }
    } else {
        let d = vm.registers.eax.word();
        let s = vm.fetch_word();
        let res = GENOP_WORD[idx](vm, d, s);
        if idx != GENOP_CMP {
            vm.registers.eax.set_word(res);
        }
    }
}

// 0x80..=0x83: the genop family against an immediate. 0x82 is the
// undocumented alias of 0x80; 0x83 sign-extends its imm8.
pub(super) fn alu_group_imm(vm: &mut Runtime, op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let idx = reg as usize;
    if op == 0x80 || op == 0x82 {
        let d = vm.read_rm8(&dst);
        let s = vm.fetch_byte();
        let res = GENOP_BYTE[idx](vm, d, s);
        if idx != GENOP_CMP {
            vm.write_rm8(&dst, res);
        }
    } else if vm.mode.op32 {
        let d = vm.read_rm32(&dst);
        let s = if op == 0x83 {
            word_to_long(sign_extend_word(vm.fetch_byte()))
        } else {
            vm.fetch_long()
        };
        let res = GENOP_LONG[idx](vm, d, s);
        if idx != GENOP_CMP {
            vm.write_rm32(&dst, res);
        }
    } else {
        let d = vm.read_rm16(&dst);
        let s = if op == 0x83 {
            sign_extend_word(vm.fetch_byte())
        } else {
            vm.fetch_word()
        };
        let res = GENOP_WORD[idx](vm, d, s);
        if idx != GENOP_CMP {
            vm.write_rm16(&dst, res);
        }
    }
}

// ── TEST ────────────────────────────────────────────────────────────────

// 0x84
pub(super) fn test_byte_rm_r(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let d = vm.read_rm8(&dst);
    let s = vm.registers.get8(reg);
    alu::test_byte(vm, d, s);
}

// 0x85
pub(super) fn test_word_rm_r(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let d = vm.read_rm32(&dst);
        let s = vm.registers.get32(reg);
        alu::test_long(vm, d, s);
    } else {
        let d = vm.read_rm16(&dst);
        let s = vm.registers.get16(reg);
        alu::test_word(vm, d, s);
    }
}

// 0xA8
pub(super) fn test_al_imm(vm: &mut Runtime, _op: u8) {
    let d = vm.registers.eax.low();
    let s = vm.fetch_byte();
    alu::test_byte(vm, d, s);
}

// 0xA9
pub(super) fn test_ax_imm(vm: &mut Runtime, _op: u8) {
    if vm.mode.op32 {
        let d = vm.registers.eax.dword();
        let s = vm.fetch_long();
        alu::test_long(vm, d, s);
    } else {
        let d = vm.registers.eax.word();
        let s = vm.fetch_word();
        alu::test_word(vm, d, s);
    }
}

// ── INC / DEC ───────────────────────────────────────────────────────────

// 0x40..=0x47
pub(super) fn inc_reg(vm: &mut Runtime, op: u8) {
    let r = op & 0b111;
    if vm.mode.op32 {
        let v = vm.registers.get32(r);
        let res = alu::inc_long(vm, v);
        vm.registers.set32(r, res);
    } else {
        let v = vm.registers.get16(r);
        let res = alu::inc_word(vm, v);
        vm.registers.set16(r, res);
    }
}

// 0x48..=0x4F
pub(super) fn dec_reg(vm: &mut Runtime, op: u8) {
    let r = op & 0b111;
    if vm.mode.op32 {
        let v = vm.registers.get32(r);
        let res = alu::dec_long(vm, v);
        vm.registers.set32(r, res);
    } else {
        let v = vm.registers.get16(r);
        let res = alu::dec_word(vm, v);
        vm.registers.set16(r, res);
    }
}

// 0xFE - byte INC/DEC; the other slots are undefined for this opcode
pub(super) fn group4(vm: &mut Runtime, op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    match reg {
        0b000 => {
            let v = vm.read_rm8(&dst);
            let res = alu::inc_byte(vm, v);
            vm.write_rm8(&dst, res);
        }
        0b001 => {
            let v = vm.read_rm8(&dst);
            let res = alu::dec_byte(vm, v);
            vm.write_rm8(&dst, res);
        }
        _ => illegal_op(vm, op),
    }
}

// ── group 3: TEST, NOT, NEG, MUL, IMUL, DIV, IDIV ───────────────────────

// 0xF6
pub(super) fn group3_byte(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    match reg {
        // reg=1 is an undocumented TEST alias
        0b000 | 0b001 => {
            let d = vm.read_rm8(&dst);
            let s = vm.fetch_byte();
            alu::test_byte(vm, d, s);
        }
        0b010 => {
            let d = vm.read_rm8(&dst);
            let res = alu::not_byte(vm, d);
            vm.write_rm8(&dst, res);
        }
        0b011 => {
            let d = vm.read_rm8(&dst);
            let res = alu::neg_byte(vm, d);
            vm.write_rm8(&dst, res);
        }
        // MUL: AX = AL * r/m8, CF=OF set iff AH is nonzero
        0b100 => {
            let s = vm.read_rm8(&dst);
            let res = (vm.registers.eax.low() as u16) * (s as u16);
            vm.registers.eax.set_word(res);
            let high_set = res >> 8 != 0;
            vm.update_flag(Carry, high_set);
            vm.update_flag(Overflow, high_set);
        }
        // IMUL: CF=OF set iff AX is not the sign extension of AL
        0b101 => {
            let s = vm.read_rm8(&dst);
            let res = (vm.registers.eax.low() as i8 as i16) * (s as i8 as i16);
            vm.registers.eax.set_word(res as u16);
            let overflow = res as i8 as i16 != res;
            vm.update_flag(Carry, overflow);
            vm.update_flag(Overflow, overflow);
        }
        // DIV: AL = AX / r/m8, AH = remainder
        0b110 => {
            let s = vm.read_rm8(&dst) as u16;
            let num = vm.registers.eax.word();
            if s == 0 {
                return control::divide_error(vm);
            }
            let quot = num / s;
            if quot > 0xFF {
                return control::divide_error(vm);
            }
            vm.registers.eax.set_low(quot as u8);
            vm.registers.eax.set_high((num % s) as u8);
        }
        // IDIV: signed, quotient truncated toward zero
        0b111 => {
            let s = vm.read_rm8(&dst) as i8 as i16;
            let num = vm.registers.eax.word() as i16;
            match num.checked_div(s) {
                Some(quot) if (-128..=127).contains(&quot) => {
                    vm.registers.eax.set_low(quot as u8);
                    vm.registers.eax.set_high((num % s) as u8);
                }
                _ => control::divide_error(vm),
            }
        }
        _ => unreachable!(),
    }
}

// 0xF7
pub(super) fn group3_word(vm: &mut Runtime, _op: u8) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        match reg {
            0b000 | 0b001 => {
                let d = vm.read_rm32(&dst);
                let s = vm.fetch_long();
                alu::test_long(vm, d, s);
            }
            0b010 => {
                let d = vm.read_rm32(&dst);
                let res = alu::not_long(vm, d);
                vm.write_rm32(&dst, res);
            }
            0b011 => {
                let d = vm.read_rm32(&dst);
                let res = alu::neg_long(vm, d);
                vm.write_rm32(&dst, res);
            }
            // MUL: EDX:EAX = EAX * r/m32
            0b100 => {
                let s = vm.read_rm32(&dst);
                let res = (vm.registers.eax.dword() as u64) * (s as u64);
                vm.registers.edx.set_dword((res >> 32) as u32);
                vm.registers.eax.set_dword(res as u32);
                let high_set = res >> 32 != 0;
                vm.update_flag(Carry, high_set);
                vm.update_flag(Overflow, high_set);
            }
            0b101 => {
                let s = vm.read_rm32(&dst);
                let res =
                    (vm.registers.eax.dword() as i32 as i64) * (s as i32 as i64);
                vm.registers.edx.set_dword((res >> 32) as u32);
                vm.registers.eax.set_dword(res as u32);
                let overflow = res as i32 as i64 != res;
                vm.update_flag(Carry, overflow);
                vm.update_flag(Overflow, overflow);
            }
            // DIV: EAX = EDX:EAX / r/m32, EDX = remainder
            0b110 => {
                let s = vm.read_rm32(&dst) as u64;
                let num = ((vm.registers.edx.dword() as u64) << 32)
                    | vm.registers.eax.dword() as u64;
                if s == 0 {
                    return control::divide_error(vm);
                }
                let quot = num / s;
                if quot > u32::MAX as u64 {
                    return control::divide_error(vm);
                }
                vm.registers.eax.set_dword(quot as u32);
                vm.registers.edx.set_dword((num % s) as u32);
            }
            0b111 => {
                let s = vm.read_rm32(&dst) as i32 as i64;
                let num = (((vm.registers.edx.dword() as u64) << 32)
                    | vm.registers.eax.dword() as u64) as i64;
                match num.checked_div(s) {
                    Some(quot) if (i32::MIN as i64..=i32::MAX as i64).contains(&quot) => {
                        vm.registers.eax.set_dword(quot as u32);
                        vm.registers.edx.set_dword((num % s) as u32);
                    }
                    _ => control::divide_error(vm),
                }
            }
            _ => unreachable!(),
        }
    } else {
        match reg {
            0b000 | 0b001 => {
                let d = vm.read_rm16(&dst);
                let s = vm.fetch_word();
                alu::test_word(vm, d, s);
            }
            0b010 => {
                let d = vm.read_rm16(&dst);
                let res = alu::not_word(vm, d);
                vm.write_rm16(&dst, res);
            }
            0b011 => {
                let d = vm.read_rm16(&dst);
                let res = alu::neg_word(vm, d);
                vm.write_rm16(&dst, res);
            }
            // MUL: DX:AX = AX * r/m16
            0b100 => {
                let s = vm.read_rm16(&dst);
                let res = (vm.registers.eax.word() as u32) * (s as u32);
                vm.registers.edx.set_word((res >> 16) as u16);
                vm.registers.eax.set_word(res as u16);
                let high_set = res >> 16 != 0;
                vm.update_flag(Carry, high_set);
                vm.update_flag(Overflow, high_set);
            }
            0b101 => {
                let s = vm.read_rm16(&dst);
                let res =
                    (vm.registers.eax.word() as i16 as i32) * (s as i16 as i32);
                vm.registers.edx.set_word((res as u32 >> 16) as u16);
                vm.registers.eax.set_word(res as u16);
                let overflow = res as i16 as i32 != res;
                vm.update_flag(Carry, overflow);
                vm.update_flag(Overflow, overflow);
            }
            // DIV: AX = DX:AX / r/m16, DX = remainder
            0b110 => {
                let s = vm.read_rm16(&dst) as u32;
                let num = ((vm.registers.edx.word() as u32) << 16)
                    | vm.registers.eax.word() as u32;
                if s == 0 {
                    return control::divide_error(vm);
                }
                let quot = num / s;
                if quot > 0xFFFF {
                    return control::divide_error(vm);
                }
                vm.registers.eax.set_word(quot as u16);
                vm.registers.edx.set_word((num % s) as u16);
            }
            0b111 => {
                let s = vm.read_rm16(&dst) as i16 as i32;
                let num = (((vm.registers.edx.word() as u32) << 16)
                    | vm.registers.eax.word() as u32) as i32;
                match num.checked_div(s) {
                    Some(quot) if (-32768..=32767).contains(&quot) => {
                        vm.registers.eax.set_word(quot as u16);
                        vm.registers.edx.set_word((num % s) as u16);
                    }
                    _ => control::divide_error(vm),
                }
            }
            _ => unreachable!(),
        }
    }
}

// ── three-operand IMUL ──────────────────────────────────────────────────

fn imul_r_rm_common(vm: &mut Runtime, imm8: bool) {
    let (md, reg, rm) = fetch_modrm(vm);
    let src = decode_rm(vm, md, rm);
    if vm.mode.op32 {
        let a = vm.read_rm32(&src) as i32 as i64;
        let b = if imm8 {
            vm.fetch_byte() as i8 as i64
        } else {
            vm.fetch_long() as i32 as i64
        };
        let res = a * b;
        vm.registers.set32(reg, res as u32);
        let overflow = res as i32 as i64 != res;
        vm.update_flag(Carry, overflow);
        vm.update_flag(Overflow, overflow);
    } else {
        let a = vm.read_rm16(&src) as i16 as i32;
        let b = if imm8 {
            vm.fetch_byte() as i8 as i32
        } else {
            vm.fetch_word() as i16 as i32
        };
        let res = a * b;
        vm.registers.set16(reg, res as u16);
        let overflow = res as i16 as i32 != res;
        vm.update_flag(Carry, overflow);
        vm.update_flag(Overflow, overflow);
    }
}

// 0x69
pub(super) fn imul_r_rm_imm(vm: &mut Runtime, _op: u8) {
    imul_r_rm_common(vm, false);
}

// 0x6B
pub(super) fn imul_r_rm_imm8(vm: &mut Runtime, _op: u8) {
    imul_r_rm_common(vm, true);
}

// ── BCD adjustments ─────────────────────────────────────────────────────

// 0x27
pub(super) fn daa_op(vm: &mut Runtime, _op: u8) {
    alu::daa(vm);
}

// 0x2F
pub(super) fn das_op(vm: &mut Runtime, _op: u8) {
    alu::das(vm);
}

// 0x37
pub(super) fn aaa_op(vm: &mut Runtime, _op: u8) {
    alu::aaa(vm);
}

// 0x3F
pub(super) fn aas_op(vm: &mut Runtime, _op: u8) {
    alu::aas(vm);
}

// 0xD4 - the immediate is the base, 10 in the documented encoding
pub(super) fn aam_op(vm: &mut Runtime, _op: u8) {
    let base = vm.fetch_byte();
    if base == 0 {
        // Flags reflect a zero result before the fault is delivered.
        alu::set_szp_byte(vm, 0);
        control::divide_error(vm);
    } else {
        alu::aam(vm, base);
    }
}

// 0xD5
pub(super) fn aad_op(vm: &mut Runtime, _op: u8) {
    let base = vm.fetch_byte();
    alu::aad(vm, base);
}
