//! Interrupt codes and register selectors.
//!
//! The machine signals every fault by writing a code into its interrupt
//! register and halting; there is no error type on the execution path. Code
//! `0` means the machine is runnable, every nonzero code is terminal until
//! the host constructs a fresh machine. The `INT` instruction can raise any
//! one-byte code, so values in `0x01..=0xff` are reserved for programs.

/// The machine's fault/halt signal. Zero is runnable, nonzero is terminal.
pub type InterruptCode = u32;

/// No fault pending, the machine is runnable.
pub const NONE: InterruptCode = 0x0000;
/// Unrecognized opcode or register selector.
pub const ILLEGAL_INSTRUCTION: InterruptCode = 0x0100;
/// Jump target outside the program bounds.
pub const ILLEGAL_JUMP: InterruptCode = 0x0101;
/// Fetch past the last program byte.
pub const END_OF_PROGRAM: InterruptCode = 0x0102;
/// Push beyond the stack capacity.
pub const STACK_OVERFLOW: InterruptCode = 0x0200;
/// Pop from an empty stack.
pub const STACK_UNDERFLOW: InterruptCode = 0x0201;
/// Indexed stack access beyond the current top.
pub const OUT_OF_BOUNDS: InterruptCode = 0x0202;

/// Register selector consumed by `REG`: the interrupt register.
pub const REG_INT: u8 = 0x00;
/// Register selector consumed by `REG`: the program counter.
pub const REG_PC: u8 = 0x01;
/// Register selector consumed by `REG`: the stack pointer.
pub const REG_SP: u8 = 0x02;

/// Returns a human-readable description of an interrupt code.
///
/// Codes in `0x01..=0xff` can only originate from an `INT` instruction and
/// are reported as software interrupts.
pub fn describe(code: InterruptCode) -> &'static str {
    match code {
        NONE => "none",
        ILLEGAL_INSTRUCTION => "illegal instruction",
        ILLEGAL_JUMP => "illegal jump",
        END_OF_PROGRAM => "end of program",
        STACK_OVERFLOW => "stack overflow",
        STACK_UNDERFLOW => "stack underflow",
        OUT_OF_BOUNDS => "out of bounds",
        0x01..=0xff => "software interrupt",
        _ => "unknown interrupt",
    }
}
