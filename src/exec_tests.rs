//! Whole-program scenarios: a memory image plus initial registers in, a
//! register post-state out.

use crate::vm::memory::{Bus, LinearMemory};
use crate::vm::registers::Reg;
use crate::vm::runtime::{HaltCause, Runtime};

fn boot(image: &[u8], sp: u32) -> Runtime {
    let mut mem = LinearMemory::new();
    mem.load(0, image);
    let mut vm = Runtime::new(Box::new(mem));
    vm.set_reg(Reg::CS, 0);
    vm.set_reg(Reg::IP, 0);
    vm.set_reg(Reg::SS, 0);
    vm.set_reg(Reg::SP, sp);
    vm
}

#[test]
fn halt() {
    // F4 at 0000:0000
    let mut vm = boot(&[0xF4], 0x2000);
    let cause = vm.run();
    assert_eq!(cause, HaltCause::GuestHalt);
    assert_eq!(vm.get_reg(Reg::IP), 1);
    assert_eq!(vm.get_reg(Reg::SP), 0x2000);
}

#[test]
fn segment_loads() {
    // mov ax,0x20 / push ax / pop ss
    // mov ax,0x21 / push ax / pop es
    // mov ax,0x22 / push ax / pop fs   (two-byte POP FS)
    // mov al,0x23 / hlt
    let image = [
        0xB8, 0x20, 0x00, // 0000
        0x50, // 0003
        0x17, // 0004  POP SS
        0xB8, 0x21, 0x00, // 0005
        0x50, // 0008
        0x07, // 0009  POP ES
        0xB8, 0x22, 0x00, // 000A
        0x50, // 000D
        0x0F, 0xA1, // 000E  POP FS
        0xB0, 0x23, // 0010  MOV AL,0x23
        0xF4, // 0012  HLT
    ];
    let mut vm = boot(&image, 0x2000);
    let cause = vm.run();
    assert_eq!(cause, HaltCause::GuestHalt);
    assert_eq!(vm.get_reg(Reg::AX), 0x23);
    assert_eq!(vm.get_reg(Reg::SS), 0x20);
    assert_eq!(vm.get_reg(Reg::ES), 0x21);
    assert_eq!(vm.get_reg(Reg::FS), 0x22);
    assert_eq!(vm.get_reg(Reg::IP), 0x13);
    assert_eq!(vm.get_reg(Reg::SP), 0x2000);
}

#[test]
fn far_jump_lands_on_service_trap() {
    // jmp 0x0002:0x0001 with SP still at its initial zero; the trap byte at
    // the target ends the run as a service return reporting CS:IP at the
    // trap itself.
    let mut vm = boot(&[0xEA, 0x01, 0x00, 0x02, 0x00, 0xF4], 0);
    vm.bus.write_byte(0x21, 0xF1); // 0002:0001
    let cause = vm.run();
    assert_eq!(cause, HaltCause::ServiceReturn);
    assert_eq!(vm.get_reg(Reg::CS), 0x0002);
    assert_eq!(vm.get_reg(Reg::IP), 0x0001);
}

#[test]
fn push_pop_dword() {
    // mov ebx,0x12345678 / push ebx / pop dx / pop cx /
    // push ebx / pop edx / hlt
    let image = [
        0x66, 0xBB, 0x78, 0x56, 0x34, 0x12, // MOV EBX,imm32
        0x66, 0x53, // PUSH EBX
        0x5A, // POP DX
        0x59, // POP CX
        0x66, 0x53, // PUSH EBX
        0x66, 0x5A, // POP EDX
        0xF4,
    ];
    let mut vm = boot(&image, 0x2000);
    let cause = vm.run();
    assert_eq!(cause, HaltCause::GuestHalt);
    assert_eq!(vm.get_reg(Reg::EBX), 0x1234_5678);
    assert_eq!(vm.get_reg(Reg::CX), 0x1234);
    assert_eq!(vm.get_reg(Reg::EDX), 0x1234_5678);
    assert_eq!(vm.get_reg(Reg::SP), 0x2000);
}

#[test]
fn mov_then_halt() {
    // B8 01 00 00 00 F4 decodes in 16-bit mode as MOV AX,1 / ADD [BX+SI],AL
    // / HLT; either reading leaves EAX = 1 with IP one past the HLT.
    let mut vm = boot(&[0xB8, 0x01, 0x00, 0x00, 0x00, 0xF4], 0x2000);
    let cause = vm.run();
    assert_eq!(cause, HaltCause::GuestHalt);
    assert_eq!(vm.get_reg(Reg::EAX), 1);
    assert_eq!(vm.get_reg(Reg::IP), 6);
}

#[test]
fn loop_runs_body_cx_times() {
    // mov cx,3 / body: inc ax / loop body / hlt
    let image = [
        0xB9, 0x03, 0x00, // MOV CX,3
        0x40, // INC AX
        0xE2, 0xFD, // LOOP -3
        0xF4,
    ];
    let mut vm = boot(&image, 0x2000);
    let cause = vm.run();
    assert_eq!(cause, HaltCause::GuestHalt);
    assert_eq!(vm.get_reg(Reg::AX), 3);
    assert_eq!(vm.get_reg(Reg::CX), 0);
}

#[test]
fn rep_string_fill_and_verify() {
    // cld / mov ax,0x4141 / mov di,0x100 / mov cx,8 / rep stosw /
    // mov si,0x100 / mov di,0x100 / mov cx,16 / repe cmpsb / hlt
    let image = [
        0xFC, // CLD
        0xB8, 0x41, 0x41, // MOV AX,0x4141
        0xBF, 0x00, 0x01, // MOV DI,0x100
        0xB9, 0x08, 0x00, // MOV CX,8
        0xF3, 0xAB, // REP STOSW
        0xBE, 0x00, 0x01, // MOV SI,0x100
        0xBF, 0x00, 0x01, // MOV DI,0x100
        0xB9, 0x10, 0x00, // MOV CX,16
        0xF3, 0xA6, // REPE CMPSB (equal throughout)
        0xF4,
    ];
    let mut vm = boot(&image, 0x2000);
    let cause = vm.run();
    assert_eq!(cause, HaltCause::GuestHalt);
    assert_eq!(vm.get_reg(Reg::CX), 0);
    assert_eq!(vm.get_reg(Reg::DI), 0x110);
    assert_eq!(vm.bus.read_word(0x10E), 0x4141);
}

#[test]
fn service_call_protocol() {
    // The host enters an emulated service with SP = 0 and a return address
    // pointing at the 0xF1 trap. The service body runs, returns, and the
    // trap ends the run cleanly.
    //
    // 0x0200: trap byte F1
    // 0x0100: mov ax,0x77 / ret
    let mut vm = boot(&[], 0);
    vm.bus.write_byte(0x200, 0xF1);
    vm.bus.write_byte(0x100, 0xB8);
    vm.bus.write_word(0x101, 0x0077);
    vm.bus.write_byte(0x103, 0xC3);
    // entering with SP = 0, the host pushes the trap address as the return
    // address, leaving SP at 0xFFFE; the service's RET wraps it back to 0
    vm.set_reg(Reg::SP, 0xFFFE);
    vm.bus.write_word(0xFFFE, 0x0200);
    vm.set_reg(Reg::IP, 0x100);
    let cause = vm.run();
    assert_eq!(cause, HaltCause::ServiceReturn);
    assert_eq!(vm.get_reg(Reg::AX), 0x77);
    assert_eq!(vm.get_reg(Reg::SP), 0);
    assert_eq!(vm.get_reg(Reg::IP), 0x200);
}
