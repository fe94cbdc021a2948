//! Assembly language parser and bytecode compiler.
//!
//! Converts human-readable assembly source into the flat byte stream the
//! machine executes.
//!
//! # Syntax
//!
//! ```text
//! # push two values and add them
//! NUM 2
//! NUM 0x03
//! ADD
//!
//! loop: NUM loop            # labels resolve to byte offsets
//! JMP
//! ```
//!
//! - Instructions are uppercase (e.g., `NUM`, `ADD`)
//! - Integer literals are unsigned, decimal or `0x`-prefixed hexadecimal
//! - `REG` selectors are `int`, `pc`, `sp` (or a numeric selector byte)
//! - `NUM` encodes its literal big-endian with the minimal width; a label
//!   operand encodes as a fixed 4-byte reference to the label's byte offset
//! - `ARR width v1 v2 ...` takes an explicit element width, the count is the
//!   number of values given
//! - `name:` defines a label, alone or in front of an instruction
//! - Comments start with `#`
//! - Commas between operands are optional

use crate::errors::AsmError;
use crate::interrupt;
use crate::isa::Opcode;
use crate::program::Program;
use std::collections::HashMap;
use std::fmt::Write;
use std::fs;
use std::path::Path;

const COMMENT_CHAR: char = '#';
const LABEL_SUFFIX: char = ':';

/// Byte width of an encoded label reference. Fixed, so instruction sizes are
/// known in the first pass before any label offset is.
const LABEL_REF_WIDTH: u8 = 4;

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    /// 1-based column offset in the line.
    offset: usize,
}

/// Tokenize a single line of assembly.
///
/// Rules:
/// - `#` starts a comment
/// - commas are ignored
/// - whitespace-separated tokens
fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = line.len();

    for (i, c) in line.char_indices() {
        if c == COMMENT_CHAR {
            end = i;
            break;
        }
        if c == ',' || c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(Token {
                    text: &line[s..i],
                    offset: s + 1,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        out.push(Token {
            text: &line[s..end],
            offset: s + 1,
        });
    }

    out
}

/// Parse an unsigned integer literal, decimal or `0x` hexadecimal.
fn parse_uint(tok: &str) -> Result<u64, AsmError> {
    let parsed = match tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => tok.parse::<u64>(),
    };
    parsed.map_err(|_| AsmError::InvalidLiteral {
        token: tok.to_string(),
    })
}

/// Parse a one-byte operand (`INT` codes, `ARR` widths, numeric selectors).
fn parse_byte(tok: &str) -> Result<u8, AsmError> {
    u8::try_from(parse_uint(tok)?).map_err(|_| AsmError::ByteOutOfRange {
        token: tok.to_string(),
    })
}

/// Parse a `REG` selector: a register name or a numeric selector byte.
fn parse_selector(tok: &str) -> Result<u8, AsmError> {
    match tok {
        "int" => Ok(interrupt::REG_INT),
        "pc" => Ok(interrupt::REG_PC),
        "sp" => Ok(interrupt::REG_SP),
        _ if tok.starts_with(|c: char| c.is_ascii_digit()) => parse_byte(tok),
        _ => Err(AsmError::InvalidSelector {
            token: tok.to_string(),
        }),
    }
}

/// Minimal big-endian byte width for an unsigned value (zero takes none).
fn unsigned_width(value: u64) -> usize {
    (u64::BITS - value.leading_zeros()).div_ceil(8) as usize
}

/// Returns true when `value` is representable in `width` big-endian bytes.
fn fits_width(value: u64, width: u8) -> bool {
    unsigned_width(value) <= width as usize
}

/// Emits `value` as `width` big-endian bytes, zero-padded on the left.
fn emit_unsigned(out: &mut Vec<u8>, value: u64, width: usize) {
    if width > 8 {
        out.resize(out.len() + width - 8, 0);
        out.extend_from_slice(&value.to_be_bytes());
    } else {
        out.extend_from_slice(&value.to_be_bytes()[8 - width..]);
    }
}

/// A `NUM` operand: a literal, or a label resolved in the second pass.
#[derive(Debug, Clone)]
enum NumArg {
    Value(u64),
    Label(String),
}

/// One parsed instruction. Its encoded size is fixed by the first pass even
/// when a label reference is still unresolved.
#[derive(Debug, Clone)]
enum AsmInstr {
    /// Instruction with no operand bytes.
    Plain(Opcode),
    /// `INT` with its interrupt code byte.
    Int(u8),
    /// `REG` with its selector byte.
    Reg(u8),
    /// `NUM` with its operand.
    Num(NumArg),
    /// `ARR` with an element width and the element values.
    Arr { width: u8, values: Vec<u64> },
}

impl AsmInstr {
    /// Encoded size in bytes (opcode + operands).
    fn size(&self) -> usize {
        match self {
            AsmInstr::Plain(_) => 1,
            AsmInstr::Int(_) | AsmInstr::Reg(_) => 2,
            AsmInstr::Num(NumArg::Value(value)) => 2 + unsigned_width(*value),
            AsmInstr::Num(NumArg::Label(_)) => 2 + LABEL_REF_WIDTH as usize,
            AsmInstr::Arr { width, values } => 3 + *width as usize * values.len(),
        }
    }

    /// Encodes the instruction into bytecode, resolving label references.
    fn assemble(
        &self,
        labels: &HashMap<String, usize>,
        out: &mut Vec<u8>,
    ) -> Result<(), AsmError> {
        match self {
            AsmInstr::Plain(op) => out.push(*op as u8),
            AsmInstr::Int(code) => out.extend_from_slice(&[Opcode::Int as u8, *code]),
            AsmInstr::Reg(selector) => out.extend_from_slice(&[Opcode::Reg as u8, *selector]),
            AsmInstr::Num(NumArg::Value(value)) => {
                let width = unsigned_width(*value);
                out.extend_from_slice(&[Opcode::Num as u8, width as u8]);
                emit_unsigned(out, *value, width);
            }
            AsmInstr::Num(NumArg::Label(name)) => {
                let target = labels.get(name).ok_or_else(|| AsmError::UndefinedLabel {
                    label: name.clone(),
                })?;
                out.extend_from_slice(&[Opcode::Num as u8, LABEL_REF_WIDTH]);
                emit_unsigned(out, *target as u64, LABEL_REF_WIDTH as usize);
            }
            AsmInstr::Arr { width, values } => {
                out.extend_from_slice(&[Opcode::Arr as u8, *width, values.len() as u8]);
                for value in values {
                    emit_unsigned(out, *value, *width as usize);
                }
            }
        }
        Ok(())
    }
}

/// Parse one instruction from the tokens of a line.
fn parse_instruction(tokens: &[Token<'_>]) -> Result<AsmInstr, AsmError> {
    let mnemonic = tokens[0].text;
    let op = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AsmError::UnknownInstruction {
        name: mnemonic.to_string(),
    })?;
    let operands = &tokens[1..];

    match op {
        Opcode::Int => {
            expect_arity(mnemonic, operands, 1)?;
            Ok(AsmInstr::Int(parse_byte(operands[0].text)?))
        }
        Opcode::Reg => {
            expect_arity(mnemonic, operands, 1)?;
            Ok(AsmInstr::Reg(parse_selector(operands[0].text)?))
        }
        Opcode::Num => {
            expect_arity(mnemonic, operands, 1)?;
            let tok = operands[0].text;
            if tok.starts_with(|c: char| c.is_ascii_digit()) {
                Ok(AsmInstr::Num(NumArg::Value(parse_uint(tok)?)))
            } else if tok.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
                Ok(AsmInstr::Num(NumArg::Label(tok.to_string())))
            } else {
                Err(AsmError::InvalidLiteral {
                    token: tok.to_string(),
                })
            }
        }
        Opcode::Arr => {
            if operands.is_empty() {
                return Err(AsmError::ArityMismatch {
                    instruction: mnemonic.to_string(),
                    expected: 1,
                    actual: 0,
                });
            }
            let width = parse_byte(operands[0].text)?;
            let values = operands[1..]
                .iter()
                .map(|tok| parse_uint(tok.text))
                .collect::<Result<Vec<_>, _>>()?;
            if values.len() > u8::MAX as usize {
                return Err(AsmError::TooManyElements {
                    count: values.len(),
                });
            }
            for value in &values {
                if !fits_width(*value, width) {
                    return Err(AsmError::ValueOutOfRange {
                        value: *value,
                        width,
                    });
                }
            }
            Ok(AsmInstr::Arr { width, values })
        }
        _ => {
            expect_arity(mnemonic, operands, 0)?;
            Ok(AsmInstr::Plain(op))
        }
    }
}

fn expect_arity(instruction: &str, operands: &[Token<'_>], expected: usize) -> Result<(), AsmError> {
    if operands.len() != expected {
        return Err(AsmError::ArityMismatch {
            instruction: instruction.to_string(),
            expected,
            actual: operands.len(),
        });
    }
    Ok(())
}

/// Checks whether a token defines a label and returns its name.
fn label_name(tok: &str) -> Option<&str> {
    tok.strip_suffix(LABEL_SUFFIX).filter(|name| !name.is_empty())
}

/// Wraps an error with its source location, unless it already carries one.
fn located(line: usize, offset: usize, err: AsmError) -> AsmError {
    match err {
        AsmError::AssemblyError { .. } => err,
        _ => AsmError::AssemblyError {
            line,
            offset,
            source: err.to_string(),
        },
    }
}

/// Assemble a full source string into a program.
///
/// Two-pass assembly:
/// 1. First pass: tokenize and parse every line, fix instruction sizes, and
///    record label definitions as byte offsets
/// 2. Second pass: resolve label references and emit bytecode
pub fn assemble_source(source: &str) -> Result<Program, AsmError> {
    let mut labels: HashMap<String, usize> = HashMap::new();
    let mut instrs: Vec<(usize, usize, AsmInstr)> = Vec::new();
    let mut offset = 0usize;

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let mut tokens = tokenize(line);

        // leading label definitions, possibly sharing the line with an
        // instruction
        while let Some(first) = tokens.first() {
            let Some(name) = label_name(first.text) else {
                break;
            };
            if labels.contains_key(name) {
                return Err(located(
                    line_no,
                    first.offset,
                    AsmError::DuplicateLabel {
                        label: name.to_string(),
                    },
                ));
            }
            labels.insert(name.to_string(), offset);
            tokens.remove(0);
        }

        let Some(first) = tokens.first().copied() else {
            continue;
        };
        let instr =
            parse_instruction(&tokens).map_err(|e| located(line_no, first.offset, e))?;
        offset += instr.size();
        instrs.push((line_no, first.offset, instr));
    }

    let mut out = Vec::with_capacity(offset);
    for (line_no, column, instr) in instrs {
        instr
            .assemble(&labels, &mut out)
            .map_err(|e| located(line_no, column, e))?;
    }

    Ok(Program::new(out))
}

/// Assembles a source file, printing a compiler-style diagnostic to stderr
/// on failure.
pub fn assemble_file(path: impl AsRef<Path>) -> Result<Program, AsmError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| AsmError::Io {
        reason: e.to_string(),
    })?;
    assemble_source(&source).inspect_err(|err| {
        eprintln!(
            "{}",
            render_diagnostic(&path.display().to_string(), &source, err)
        );
    })
}

/// Formats a compiler-style diagnostic for an assembly failure.
fn render_diagnostic(file: &str, source: &str, err: &AsmError) -> String {
    let AsmError::AssemblyError {
        line,
        offset,
        source: message,
    } = err
    else {
        return format!("error: {err}");
    };

    let mut diag = String::new();
    let _ = writeln!(diag, "error: {message}");
    let _ = writeln!(diag, " --> {file}:{line}:{offset}");

    if let Some(raw_line) = source.lines().nth(line.saturating_sub(1)) {
        let line_text = raw_line.trim_end_matches('\r');
        let underline = " ".repeat(offset.saturating_sub(1));
        let _ = writeln!(diag, "  |");
        let _ = writeln!(diag, "{line:>4} | {line_text}");
        let _ = writeln!(diag, "  | {underline}^");
    }

    diag
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(source: &str) -> Vec<u8> {
        assemble_source(source)
            .expect("assembly failed")
            .as_bytes()
            .to_vec()
    }

    fn assemble_err(source: &str) -> AsmError {
        assemble_source(source).expect_err("expected assembly error")
    }

    // ==================== Encoding ====================

    #[test]
    fn plain_instructions_are_single_bytes() {
        assert_eq!(assemble("NOP\nADD\nROT\n"), vec![0x00, 0x50, 0x36]);
    }

    #[test]
    fn commas_comments_and_blank_lines_are_ignored() {
        let bytes = assemble("\n# leading comment\nARR 1, 2, 3 # trailing\n\n");
        assert_eq!(bytes, vec![0x21, 1, 2, 2, 3]);
    }

    #[test]
    fn int_accepts_decimal_and_hex() {
        assert_eq!(assemble("INT 42\n"), vec![0x10, 42]);
        assert_eq!(assemble("INT 0x2a\n"), vec![0x10, 0x2a]);
    }

    #[test]
    fn reg_selectors_by_name_and_byte() {
        assert_eq!(assemble("REG int\n"), vec![0x11, 0x00]);
        assert_eq!(assemble("REG pc\n"), vec![0x11, 0x01]);
        assert_eq!(assemble("REG sp\n"), vec![0x11, 0x02]);
        assert_eq!(assemble("REG 2\n"), vec![0x11, 0x02]);
    }

    #[test]
    fn num_uses_minimal_width() {
        assert_eq!(assemble("NUM 0\n"), vec![0x20, 0]);
        assert_eq!(assemble("NUM 5\n"), vec![0x20, 1, 5]);
        assert_eq!(assemble("NUM 256\n"), vec![0x20, 2, 1, 0]);
        assert_eq!(
            assemble("NUM 0xdeadbeef\n"),
            vec![0x20, 4, 0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn arr_counts_its_values() {
        assert_eq!(
            assemble("ARR 2 258 5\n"),
            vec![0x21, 2, 2, 0x01, 0x02, 0x00, 0x05]
        );
        assert_eq!(assemble("ARR 4\n"), vec![0x21, 4, 0]);
    }

    #[test]
    fn arr_pads_wide_elements() {
        assert_eq!(
            assemble("ARR 10 5\n"),
            vec![0x21, 10, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 5]
        );
    }

    // ==================== Labels ====================

    #[test]
    fn labels_resolve_forward() {
        // NUM end (6 bytes), JMP (1 byte), NOP at offset 7
        assert_eq!(
            assemble("NUM end\nJMP\nend:\nNOP\n"),
            vec![0x20, 4, 0, 0, 0, 7, 0x40, 0x00]
        );
    }

    #[test]
    fn labels_resolve_backward_and_share_lines() {
        assert_eq!(
            assemble("loop: NOP\nNUM loop\nJMP\n"),
            vec![0x00, 0x20, 4, 0, 0, 0, 0, 0x40]
        );
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let err = assemble_err("here:\nNOP\nhere:\n");
        assert!(matches!(
            err,
            AsmError::AssemblyError { line: 3, .. }
        ));
        assert!(err.to_string().contains("duplicate label: here"));
    }

    #[test]
    fn undefined_labels_are_rejected() {
        let err = assemble_err("NUM nowhere\nJMP\n");
        assert!(err.to_string().contains("undefined label: nowhere"));
    }

    // ==================== Diagnostics ====================

    #[test]
    fn unknown_instruction_reports_its_location() {
        let err = assemble_err("NOP\n  HALT\n");
        assert!(matches!(
            err,
            AsmError::AssemblyError { line: 2, offset: 3, .. }
        ));
        assert!(err.to_string().contains("unknown instruction: HALT"));
    }

    #[test]
    fn arity_mismatches_are_rejected() {
        let err = assemble_err("ADD 1\n");
        assert!(err.to_string().contains("ADD takes 0 operand(s), got 1"));
        let err = assemble_err("INT\n");
        assert!(err.to_string().contains("INT takes 1 operand(s), got 0"));
    }

    #[test]
    fn malformed_literals_are_rejected() {
        let err = assemble_err("NUM 12abc\n");
        assert!(err.to_string().contains("invalid integer literal: 12abc"));
        let err = assemble_err("INT 300\n");
        assert!(err.to_string().contains("operand out of range: 300"));
        let err = assemble_err("REG bogus\n");
        assert!(err.to_string().contains("invalid register selector: bogus"));
    }

    #[test]
    fn arr_values_must_fit_their_width() {
        let err = assemble_err("ARR 1 255 256\n");
        assert!(
            err.to_string()
                .contains("value 256 does not fit in 1 byte(s)")
        );
    }

    #[test]
    fn diagnostics_point_at_the_offending_token() {
        let err = assemble_err("NOP\n  HALT\n");
        let diag = render_diagnostic("test.iso", "NOP\n  HALT\n", &err);
        assert!(diag.contains("error: unknown instruction: HALT"));
        assert!(diag.contains(" --> test.iso:2:3"));
        assert!(diag.contains("   2 |   HALT"));
        assert!(diag.contains("  |   ^"));
    }
}
