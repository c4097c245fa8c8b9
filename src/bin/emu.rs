//! `emu`: runs a `.um` program to completion, optionally tracing each
//! fetched instruction to stderr.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use um::machine::{Machine, Outcome};
use um::trace::Tracer;

#[derive(Parser)]
#[command(version, about = "Run a Universal Machine program")]
struct Args {
    /// Path to the `.um` program image to run
    program: PathBuf,

    /// Print a per-instruction trace to stderr, gated by UM_TRACE_LIMIT
    #[arg(long)]
    trace: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let words = match um::image::read_file(&args.program) {
        Ok(words) => words,
        Err(err) => {
            eprintln!("emu: {}: {}", args.program.display(), err);
            return ExitCode::from(1);
        }
    };

    let mut machine = Machine::new(words, std::io::stdin(), std::io::stdout());
    let tracer = Tracer::new(args.trace);
    let outcome = machine.run(&tracer);
    if let Outcome::Failed(trap) = &outcome {
        eprintln!("emu: fail: {}", trap);
    }
    ExitCode::from(outcome.exit_code() as u8)
}
