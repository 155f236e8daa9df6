//! String operations. The source side honors segment overrides; the
//! destination is always ES:(E)DI. Index and counter widths follow the
//! address-size override, element width the opcode's low bit plus the
//! operand-size override.

use crate::vm::alu;
use crate::vm::memory::Bus;
use crate::vm::registers::SegId;
use crate::vm::runtime::CpuFlag::{Directional, Zero};
use crate::vm::runtime::{RepKind, Runtime};

fn element_size(vm: &Runtime, op: u8) -> u32 {
    if op & 1 == 0 {
        1
    } else if vm.mode.op32 {
        4
    } else {
        2
    }
}

fn step(vm: &Runtime, size: u32) -> i32 {
    if vm.check_flag(Directional) {
        -(size as i32)
    } else {
        size as i32
    }
}

fn si(vm: &Runtime) -> u32 {
    if vm.mode.addr32 {
        vm.registers.esi.dword()
    } else {
        vm.registers.esi.word() as u32
    }
}

fn di(vm: &Runtime) -> u32 {
    if vm.mode.addr32 {
        vm.registers.edi.dword()
    } else {
        vm.registers.edi.word() as u32
    }
}

fn advance_si(vm: &mut Runtime, delta: i32) {
    if vm.mode.addr32 {
        let v = vm.registers.esi.dword().wrapping_add_signed(delta);
        vm.registers.esi.set_dword(v);
    } else {
        let v = vm.registers.esi.word().wrapping_add_signed(delta as i16);
        vm.registers.esi.set_word(v);
    }
}

fn advance_di(vm: &mut Runtime, delta: i32) {
    if vm.mode.addr32 {
        let v = vm.registers.edi.dword().wrapping_add_signed(delta);
        vm.registers.edi.set_dword(v);
    } else {
        let v = vm.registers.edi.word().wrapping_add_signed(delta as i16);
        vm.registers.edi.set_word(v);
    }
}

fn count_is_zero(vm: &Runtime) -> bool {
    if vm.mode.rep32 {
        vm.registers.ecx.dword() == 0
    } else {
        vm.registers.ecx.word() == 0
    }
}

fn dec_count(vm: &mut Runtime) {
    if vm.mode.rep32 {
        let v = vm.registers.ecx.dword().wrapping_sub(1);
        vm.registers.ecx.set_dword(v);
    } else {
        let v = vm.registers.ecx.word().wrapping_sub(1);
        vm.registers.ecx.set_word(v);
    }
}

// 0xA4 / 0xA5
pub(super) fn movs(vm: &mut Runtime, op: u8) {
    let size = element_size(vm, op);
    let delta = step(vm, size);
    let rep = vm.mode.rep.is_some();
    loop {
        if rep && count_is_zero(vm) {
            break;
        }
        let seg = vm.data_seg(SegId::DS);
        let (src, dst) = (si(vm), di(vm));
        match size {
            1 => {
                let v = vm.read_data_byte(seg, src);
                vm.write_data_byte(SegId::ES, dst, v);
            }
            2 => {
                let v = vm.read_data_word(seg, src);
                vm.write_data_word(SegId::ES, dst, v);
            }
            _ => {
                let v = vm.read_data_long(seg, src);
                vm.write_data_long(SegId::ES, dst, v);
            }
        }
        advance_si(vm, delta);
        advance_di(vm, delta);
        if !rep {
            break;
        }
        dec_count(vm);
        if vm.is_halted() {
            break;
        }
    }
}

// 0xA6 / 0xA7 - [seg:SI] compared against [ES:DI]
pub(super) fn cmps(vm: &mut Runtime, op: u8) {
    let size = element_size(vm, op);
    let delta = step(vm, size);
    let rep = vm.mode.rep;
    loop {
        if rep.is_some() && count_is_zero(vm) {
            break;
        }
        let seg = vm.data_seg(SegId::DS);
        let (src, dst) = (si(vm), di(vm));
        match size {
            1 => {
                let a = vm.read_data_byte(seg, src);
                let b = vm.read_data_byte(SegId::ES, dst);
                alu::cmp_byte(vm, a, b);
            }
            2 => {
                let a = vm.read_data_word(seg, src);
                let b = vm.read_data_word(SegId::ES, dst);
                alu::cmp_word(vm, a, b);
            }
            _ => {
                let a = vm.read_data_long(seg, src);
                let b = vm.read_data_long(SegId::ES, dst);
                alu::cmp_long(vm, a, b);
            }
        }
        advance_si(vm, delta);
        advance_di(vm, delta);
        match rep {
            None => break,
            Some(kind) => {
                dec_count(vm);
                let zf = vm.check_flag(Zero);
                match kind {
                    RepKind::Repe => {
                        if !zf {
                            break;
                        }
                    }
                    RepKind::Repne => {
                        if zf {
                            break;
                        }
                    }
                }
            }
        }
        if vm.is_halted() {
            break;
        }
    }
}

// 0xAA / 0xAB
pub(super) fn stos(vm: &mut Runtime, op: u8) {
    let size = element_size(vm, op);
    let delta = step(vm, size);
    let rep = vm.mode.rep.is_some();
    loop {
        if rep && count_is_zero(vm) {
            break;
        }
        let dst = di(vm);
        match size {
            1 => {
                let v = vm.registers.eax.low();
                vm.write_data_byte(SegId::ES, dst, v);
            }
            2 => {
                let v = vm.registers.eax.word();
                vm.write_data_word(SegId::ES, dst, v);
            }
            _ => {
                let v = vm.registers.eax.dword();
                vm.write_data_long(SegId::ES, dst, v);
            }
        }
        advance_di(vm, delta);
        if !rep {
            break;
        }
        dec_count(vm);
        if vm.is_halted() {
            break;
        }
    }
}

// 0xAC / 0xAD
pub(super) fn lods(vm: &mut Runtime, op: u8) {
    let size = element_size(vm, op);
    let delta = step(vm, size);
    let rep = vm.mode.rep.is_some();
    loop {
        if rep && count_is_zero(vm) {
            break;
        }
        let seg = vm.data_seg(SegId::DS);
        let src = si(vm);
        match size {
            1 => {
                let v = vm.read_data_byte(seg, src);
                vm.registers.eax.set_low(v);
            }
            2 => {
                let v = vm.read_data_word(seg, src);
                vm.registers.eax.set_word(v);
            }
            _ => {
                let v = vm.read_data_long(seg, src);
                vm.registers.eax.set_dword(v);
            }
        }
        advance_si(vm, delta);
        if !rep {
            break;
        }
        dec_count(vm);
        if vm.is_halted() {
            break;
        }
    }
}

// 0xAE / 0xAF - accumulator compared against [ES:DI]
pub(super) fn scas(vm: &mut Runtime, op: u8) {
    let size = element_size(vm, op);
    let delta = step(vm, size);
    let rep = vm.mode.rep;
    loop {
        if rep.is_some() && count_is_zero(vm) {
            break;
        }
        let dst = di(vm);
        match size {
            1 => {
                let b = vm.read_data_byte(SegId::ES, dst);
                let a = vm.registers.eax.low();
                alu::cmp_byte(vm, a, b);
            }
            2 => {
                let b = vm.read_data_word(SegId::ES, dst);
                let a = vm.registers.eax.word();
                alu::cmp_word(vm, a, b);
            }
            _ => {
                let b = vm.read_data_long(SegId::ES, dst);
                let a = vm.registers.eax.dword();
                alu::cmp_long(vm, a, b);
            }
        }
        advance_di(vm, delta);
        match rep {
            None => break,
            Some(kind) => {
                dec_count(vm);
                let zf = vm.check_flag(Zero);
                match kind {
                    RepKind::Repe => {
                        if !zf {
                            break;
                        }
                    }
                    RepKind::Repne => {
                        if zf {
                            break;
                        }
                    }
                }
            }
        }
        if vm.is_halted() {
            break;
        }
    }
}

// 0x6C / 0x6D - port [DX] into ES:[DI]
pub(super) fn ins(vm: &mut Runtime, op: u8) {
    let size = element_size(vm, op);
    let delta = step(vm, size);
    let rep = vm.mode.rep.is_some();
    loop {
        if rep && count_is_zero(vm) {
            break;
        }
        let port = vm.registers.edx.word();
        let dst = di(vm);
        match size {
            1 => {
                let v = vm.bus.in_byte(port);
                vm.write_data_byte(SegId::ES, dst, v);
            }
            2 => {
                let v = vm.bus.in_word(port);
                vm.write_data_word(SegId::ES, dst, v);
            }
            _ => {
                let v = vm.bus.in_long(port);
                vm.write_data_long(SegId::ES, dst, v);
            }
        }
        advance_di(vm, delta);
        if !rep {
            break;
        }
        dec_count(vm);
        if vm.is_halted() {
            break;
        }
    }
}

// 0x6E / 0x6F - [seg:SI] out to port [DX]
pub(super) fn outs(vm: &mut Runtime, op: u8) {
    let size = element_size(vm, op);
    let delta = step(vm, size);
    let rep = vm.mode.rep.is_some();
    loop {
        if rep && count_is_zero(vm) {
            break;
        }
        let port = vm.registers.edx.word();
        let seg = vm.data_seg(SegId::DS);
        let src = si(vm);
        match size {
            1 => {
                let v = vm.read_data_byte(seg, src);
                vm.bus.out_byte(port, v);
            }
            2 => {
                let v = vm.read_data_word(seg, src);
                vm.bus.out_word(port, v);
            }
            _ => {
                let v = vm.read_data_long(seg, src);
                vm.bus.out_long(port, v);
            }
        }
        advance_si(vm, delta);
        if !rep {
            break;
        }
        dec_count(vm);
        if vm.is_halted() {
            break;
        }
    }
}
