//! Rotate/shift groups 0xC0/0xC1, 0xD0..0xD3.

use crate::vm::alu;
use crate::vm::decode::{decode_rm, fetch_modrm};
use crate::vm::runtime::Runtime;

type ShiftByteFn = fn(&mut Runtime, u8, u8) -> u8;
type ShiftWordFn = fn(&mut Runtime, u16, u8) -> u16;
type ShiftLongFn = fn(&mut Runtime, u32, u8) -> u32;

// ROL, ROR, RCL, RCR, SHL, SHR, SAL (= SHL), SAR - indexed by the reg field
static SHIFT_BYTE: [ShiftByteFn; 8] = [
    alu::rol_byte,
    alu::ror_byte,
    alu::rcl_byte,
    alu::rcr_byte,
    alu::shl_byte,
    alu::shr_byte,
    alu::shl_byte,
    alu::sar_byte,
];

static SHIFT_WORD: [ShiftWordFn; 8] = [
    alu::rol_word,
    alu::ror_word,
    alu::rcl_word,
    alu::rcr_word,
    alu::shl_word,
    alu::shr_word,
    alu::shl_word,
    alu::sar_word,
];

static SHIFT_LONG: [ShiftLongFn; 8] = [
    alu::rol_long,
    alu::ror_long,
    alu::rcl_long,
    alu::rcr_long,
    alu::shl_long,
    alu::shr_long,
    alu::shl_long,
    alu::sar_long,
];

fn shift_byte_common(vm: &mut Runtime, count: Option<u8>) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    // An immediate count trails the addressing bytes
    let count = match count {
        Some(c) => c,
        None => vm.fetch_byte(),
    };
    let d = vm.read_rm8(&dst);
    let res = SHIFT_BYTE[reg as usize](vm, d, count);
    vm.write_rm8(&dst, res);
}

fn shift_word_common(vm: &mut Runtime, count: Option<u8>) {
    let (md, reg, rm) = fetch_modrm(vm);
    let dst = decode_rm(vm, md, rm);
    let count = match count {
        Some(c) => c,
        None => vm.fetch_byte(),
    };
    if vm.mode.op32 {
        let d = vm.read_rm32(&dst);
        let res = SHIFT_LONG[reg as usize](vm, d, count);
        vm.write_rm32(&dst, res);
    } else {
        let d = vm.read_rm16(&dst);
        let res = SHIFT_WORD[reg as usize](vm, d, count);
        vm.write_rm16(&dst, res);
    }
}

// 0xC0
pub(super) fn shift_byte_imm(vm: &mut Runtime, _op: u8) {
    shift_byte_common(vm, None);
}

// 0xC1
pub(super) fn shift_word_imm(vm: &mut Runtime, _op: u8) {
    shift_word_common(vm, None);
}

// 0xD0
pub(super) fn shift_byte_1(vm: &mut Runtime, _op: u8) {
    shift_byte_common(vm, Some(1));
}

// 0xD1
pub(super) fn shift_word_1(vm: &mut Runtime, _op: u8) {
    shift_word_common(vm, Some(1));
}

// 0xD2
pub(super) fn shift_byte_cl(vm: &mut Runtime, _op: u8) {
    let count = vm.registers.ecx.low();
    shift_byte_common(vm, Some(count));
}

// 0xD3
pub(super) fn shift_word_cl(vm: &mut Runtime, _op: u8) {
    let count = vm.registers.ecx.low();
    shift_word_common(vm, Some(count));
}
