//! Instruction Set Architecture (ISA) definitions.
//!
//! Defines the machine's instruction set. The
//! [`for_each_opcode!`](crate::for_each_opcode) macro holds the canonical
//! opcode table and invokes a callback macro for code generation, so multiple
//! modules can generate instruction-related code without duplicating the
//! definitions.
//!
//! This module generates:
//! - The [`Opcode`] enum with its byte values
//! - [`Opcode::decode`] for bytecode dispatch
//! - [`Opcode::mnemonic`] / [`Opcode::from_mnemonic`] for the assembler and
//!   disassembler
//!
//! # Bytecode Format
//!
//! A program is a flat byte stream: one opcode byte, followed by however many
//! operand bytes that opcode consumes inline.
//! - `INT` and `REG` consume one operand byte
//! - `NUM` consumes a length byte `n`, then `n` big-endian value bytes
//! - `ARR` consumes a width byte `w` and a count byte `c`, then `c` groups of
//!   `w` big-endian value bytes
//! - every other instruction takes its operands from the stack

/// Invokes a callback macro with the complete opcode table.
///
/// Each entry is `Name = byte, "MNEMONIC"` with a doc comment describing the
/// stack effect.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            /// NOP ; no effect
            Nop = 0x00, "NOP",
            // =========================
            // Interrupts and registers
            // =========================
            /// INT code ; raise the interrupt code in the next byte
            Int = 0x10, "INT",
            /// REG sel ; push the selected control register (int, pc, sp)
            Reg = 0x11, "REG",
            // =========================
            // Immediate data
            // =========================
            /// NUM n, b1..bn ; push one n-byte big-endian unsigned integer
            Num = 0x20, "NUM",
            /// ARR w, c, ... ; push c big-endian unsigned integers of width w
            Arr = 0x21, "ARR",
            // =========================
            // Stack manipulation
            // =========================
            /// SET ; pop address, pop value, write value into stack slot address
            Set = 0x30, "SET",
            /// GET ; pop address, push the word in stack slot address
            Get = 0x31, "GET",
            /// INC ; pop n, push n zero words
            Inc = 0x32, "INC",
            /// DEC ; pop n, pop and discard n words
            Dec = 0x33, "DEC",
            /// DUP ; duplicate the top word (no effect on an empty stack)
            Dup = 0x34, "DUP",
            /// POP ; discard the top word
            Pop = 0x35, "POP",
            /// ROT ; swap the two top words (no effect below two elements)
            Rot = 0x36, "ROT",
            // =========================
            // Control flow
            // =========================
            /// JMP ; pop target, jump unconditionally
            Jmp = 0x40, "JMP",
            /// JEQ ; pop target, pop b, pop a, jump when a == b
            Jeq = 0x41, "JEQ",
            /// JNE ; pop target, pop b, pop a, jump when a != b
            Jne = 0x42, "JNE",
            /// JLS ; pop target, pop b, pop a, jump when a < b
            Jls = 0x43, "JLS",
            /// JLE ; pop target, pop b, pop a, jump when a <= b
            Jle = 0x44, "JLE",
            // =========================
            // Arithmetic
            // =========================
            /// ADD ; pop b, pop a, push a + b
            Add = 0x50, "ADD",
            /// SUB ; pop b, pop a, push a - b
            Sub = 0x51, "SUB",
            /// MUL ; pop b, pop a, push a * b
            Mul = 0x52, "MUL",
            /// DIV ; pop b, pop a, push a / b
            Div = 0x53, "DIV",
            /// POW ; pop b, pop a, push a raised to the power b
            Pow = 0x54, "POW",
            /// MOD ; pop b, pop a, push a - trunc(a / b) * b
            Mod = 0x55, "MOD",
            // =========================
            // Bitwise (32-bit unsigned domain)
            // =========================
            /// NOT ; pop a, push the bitwise complement of a
            Not = 0x60, "NOT",
            /// AND ; pop b, pop a, push a & b
            And = 0x61, "AND",
            /// BOR ; pop b, pop a, push a | b
            Bor = 0x62, "BOR",
            /// XOR ; pop b, pop a, push a ^ b
            Xor = 0x63, "XOR",
            /// LSH ; pop b, pop a, push a << b
            Lsh = 0x64, "LSH",
            /// RSH ; pop b, pop a, push a >> b
            Rsh = 0x65, "RSH",
        }
    };
}

macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $byte:literal, $mnemonic:literal
        ),* $(,)?
    ) => {
        /// A decoded operation identifier.
        ///
        /// The discriminants are the wire opcode bytes; everything else about
        /// an instruction (operand decoding, stack effect) lives in the
        /// dispatch loop.
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        #[repr(u8)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $byte,
            )*
        }

        impl Opcode {
            /// Decodes an opcode byte, returning `None` for unassigned bytes.
            pub const fn decode(byte: u8) -> Option<Self> {
                match byte {
                    $( $byte => Some(Opcode::$name), )*
                    _ => None,
                }
            }

            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Looks an opcode up by its assembly mnemonic.
            pub fn from_mnemonic(name: &str) -> Option<Self> {
                match name {
                    $( $mnemonic => Some(Opcode::$name), )*
                    _ => None,
                }
            }
        }
    };
}

for_each_opcode!(define_opcodes);
