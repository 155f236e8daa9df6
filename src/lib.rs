//! Real-mode x86 instruction-set emulator for running 16-bit BIOS option
//! ROMs and similar legacy code on any host.
//!
//! The host supplies a [`Bus`] (memory and port I/O callbacks) and,
//! optionally, per-vector interrupt hooks that stand in for BIOS services.
//! [`Runtime::run`] then executes from CS:IP until one of four things
//! happens: the guest executes HLT, the host calls [`Runtime::halt`] from a
//! hook, an illegal opcode faults, or a service call completes.
//!
//! Service-call convention: code that is entered as an emulated service is
//! started with SP = 0 and a return address pointing at a 0xF1 byte. Hitting
//! that trap with SP back at zero ends [`Runtime::run`] with
//! [`HaltCause::ServiceReturn`]; an illegal opcode with any other SP is
//! reported as [`HaltCause::IllegalOpcode`].
//!
//! Hooks are invoked synchronously and must not re-enter the emulator
//! instance that called them.

pub mod utils;
pub mod vm;

pub use vm::memory::{Bus, LinearMemory, MEMORY_SIZE};
pub use vm::registers::{Reg, Registers, SegId};
pub use vm::runtime::{CpuFlag, HaltCause, IntrHook, RepKind, Runtime};

#[cfg(test)]
mod exec_tests;
