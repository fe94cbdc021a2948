//! Assembly and host-side error types.
//!
//! Machine faults are not Rust errors: they are interrupt codes surfaced by
//! [`Machine::run`](crate::vm::Machine::run) (see [`crate::interrupt`]).
//! [`AsmError`] covers everything that can go wrong before a program ever
//! reaches the machine: parsing, encoding and file handling.

use isovm_derive::Error;

/// Errors produced while assembling source into bytecode.
#[derive(Debug, Error)]
pub enum AsmError {
    /// Unrecognized instruction mnemonic.
    #[error("unknown instruction: {name}")]
    UnknownInstruction { name: String },
    /// Wrong number of operands for an instruction.
    #[error("{instruction} takes {expected} operand(s), got {actual}")]
    ArityMismatch {
        instruction: String,
        expected: usize,
        actual: usize,
    },
    /// Operand is not a decimal or hexadecimal unsigned integer.
    #[error("invalid integer literal: {token}")]
    InvalidLiteral { token: String },
    /// `REG` operand is not a register name or selector byte.
    #[error("invalid register selector: {token} (expected int, pc or sp)")]
    InvalidSelector { token: String },
    /// Operand must fit in a single byte.
    #[error("operand out of range: {token} (must fit in one byte)")]
    ByteOutOfRange { token: String },
    /// `ARR` element too large for the declared width.
    #[error("value {value} does not fit in {width} byte(s)")]
    ValueOutOfRange { value: u64, width: u8 },
    /// `ARR` element count exceeds the one-byte count field.
    #[error("too many array elements: {count} (at most 255)")]
    TooManyElements { count: usize },
    /// Label defined more than once.
    #[error("duplicate label: {label}")]
    DuplicateLabel { label: String },
    /// Reference to a label that is never defined.
    #[error("undefined label: {label}")]
    UndefinedLabel { label: String },
    /// Any assembly error located in the source text.
    #[error("{source} (line {line}, column {offset})")]
    AssemblyError {
        line: usize,
        offset: usize,
        source: String,
    },
    /// File I/O failure while reading assembly source.
    #[error("io error: {reason}")]
    Io { reason: String },
}
