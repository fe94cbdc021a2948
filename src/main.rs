//! ISO virtual machine runner.
//!
//! Loads a compiled bytecode file, executes it, and reports the terminal
//! interrupt code.
//!
//! # Usage
//! ```text
//! isovm <file> [OPTIONS]
//! ```
//!
//! # Arguments
//! - `file`: Bytecode program to execute
//!
//! # Options
//! - `-d, --debug`: Trace each instruction as it executes
//! - `-s, --stack <words>`: Operand stack capacity (defaults to 256)
//!
//! Running off the end of the program (`end of program`) is this machine's
//! ordinary completion and exits 0, as do program-raised `INT` codes below
//! 0x0100; every detected fault exits 1.

use isovm::interrupt::{self, InterruptCode};
use isovm::program::Program;
use isovm::utils::log::DEBUG_ENABLED;
use isovm::vm::Machine;
use isovm::{debug, error, info};
use std::env;
use std::fs;
use std::process;
use std::sync::atomic::Ordering;

const DEFAULT_STACK_SIZE: usize = 256;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let path = &args[1];
    let mut debug_mode = false;
    let mut stack_size = DEFAULT_STACK_SIZE;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--debug" | "-d" => {
                debug_mode = true;
                i += 1;
            }
            k @ ("--stack" | "-s") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                stack_size = args[i].parse().unwrap_or_else(|_| {
                    error!("Invalid stack size: '{}' is not a valid number", args[i]);
                    process::exit(1);
                });
                if stack_size == 0 {
                    error!("Stack size must be greater than 0");
                    process::exit(1);
                }
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let bytes = fs::read(path).unwrap_or_else(|e| {
        error!("Failed to read {}: {}", path, e);
        process::exit(1);
    });

    let mut machine = Machine::new(Program::new(bytes), stack_size);

    let code = if debug_mode {
        DEBUG_ENABLED.store(true, Ordering::Relaxed);
        run_traced(&mut machine)
    } else {
        machine.run()
    };

    info!(
        "halted: 0x{:04x} ({}), stack depth {}",
        code,
        interrupt::describe(code),
        machine.stack_pointer()
    );

    process::exit(if is_clean_exit(code) { 0 } else { 1 });
}

/// Single-steps the machine, tracing each instruction and the live stack.
fn run_traced(machine: &mut Machine) -> InterruptCode {
    loop {
        let pc = machine.program_counter() as usize;
        if let Some((text, _)) = machine.program().disassemble_at(pc) {
            debug!("{:04x}: {}", pc, text);
        }
        let code = machine.step();
        debug!("      stack: {:?}", machine.stack());
        if code != interrupt::NONE {
            return code;
        }
    }
}

/// Whether an interrupt code counts as successful completion for the exit
/// status: the end-of-program boundary or a program-raised soft code.
fn is_clean_exit(code: InterruptCode) -> bool {
    code == interrupt::END_OF_PROGRAM || code < 0x0100
}

const USAGE: &str = "\
ISO Virtual Machine

USAGE:
    {program} <file> [OPTIONS]

ARGS:
    <file>    Bytecode program to execute

OPTIONS:
    -d, --debug           Trace each instruction as it executes
    -s, --stack <words>   Operand stack capacity in words (default 256)
    -h, --help            Print this help message

EXAMPLES:
    # Run a compiled program
    {program} program.bin

    # Trace execution with a larger stack
    {program} program.bin -d -s 1024
";

/// Prints usage information to stderr.
fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}
