#[macro_use]
extern crate serde_derive;

use anyhow::{Context, Result};
use docopt::Docopt;
use std::fs::File;
use std::io::{self, Read, stdin};
use std::process::exit;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use superbf::parser::{CompileOptions, Program};
use superbf::runnable::{BoundsCheck, Interpreter, InterpreterOptions, NumericInput, Runnable};

const USAGE: &str = "
Superbf

Usage:
  superbf [options] <program>
  superbf (-h | --help)

Options:
  -h --help            Show this screen.
  --dump               Display the compiled instruction stream and exit.
  -d --debug           Print the final tape after execution.
  --stats              Report timings and the number of executed instructions.
  --comments           Ignore characters that are not commands.
  --numeric-input      Read , as prompted decimal integers instead of bytes.
  --deferred-bounds    Only check the tape bounds when a cell is accessed.
  --tape-size=<cells>  Number of cells on the tape [default: 3000].
";

#[derive(Debug, Deserialize)]
struct Args {
    arg_program: String,
    flag_dump: bool,
    flag_debug: bool,
    flag_stats: bool,
    flag_comments: bool,
    flag_numeric_input: bool,
    flag_deferred_bounds: bool,
    flag_tape_size: usize,
}

fn main() {
    init_logging();

    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    let compile_start = Instant::now();
    let options = CompileOptions {
        allow_comments: args.flag_comments,
    };
    let program = read_program(&args.arg_program)
        .and_then(|source| Ok(Program::compile_with(&source, options)?))
        .unwrap_or_else(|e| {
            eprintln!("Error occurred while loading program: {e:#}");
            exit(1)
        });
    let compile_time = compile_start.elapsed();

    if args.flag_dump {
        print!("{program:?}");
        return;
    }

    if args.flag_tape_size == 0 {
        eprintln!("Invalid arguments: --tape-size must be at least 1");
        exit(1);
    }

    let options = InterpreterOptions {
        tape_size: args.flag_tape_size,
        bounds: if args.flag_deferred_bounds {
            BoundsCheck::Deferred
        } else {
            BoundsCheck::Eager
        },
    };
    let mut interpreter = Interpreter::with_options(program, options);
    if args.flag_numeric_input {
        interpreter =
            interpreter.with_input(Box::new(NumericInput::new(stdin().lock(), io::stderr())));
    }

    let execute_start = Instant::now();
    let result = interpreter.run();
    let execute_time = execute_start.elapsed();
    info!(executed = interpreter.executed(), "program finished");

    if args.flag_debug {
        eprint!("{}", interpreter.tape().dump(interpreter.dp()));
    }

    if args.flag_stats {
        eprintln!();
        eprintln!("Preprocess time: {} microseconds", compile_time.as_micros());
        eprintln!("Execution time: {} microseconds", execute_time.as_micros());
        eprintln!("Total instructions: {}", interpreter.executed());
    }

    if let Err(e) = result {
        eprintln!("Error occurred while running program: {e:#}");
        exit(1);
    }
}

/// Install the `tracing` subscriber. `RUST_LOG` overrides the default filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Read a BrainFuck program's source code.
///
/// When path is "-" this will read from stdin.
fn read_program(path: &str) -> Result<String> {
    let mut buffer: String = String::new();
    let mut source: Box<dyn Read> = {
        if path == "-" {
            Box::new(stdin())
        } else {
            Box::new(File::open(path).with_context(|| format!("Could not open file: {path}"))?)
        }
    };

    source
        .read_to_string(&mut buffer)
        .with_context(|| format!("Could not read file: {path}"))?;

    Ok(buffer)
}
