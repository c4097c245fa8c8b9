//! `disasm`: renders a `.um` binary image as a textual listing.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about = "Disassemble a Universal Machine binary image")]
struct Args {
    /// Path to the `.um` program image
    program: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let words = match um::image::read_file(&args.program) {
        Ok(words) => words,
        Err(err) => {
            eprintln!("disasm: {}: {}", args.program.display(), err);
            return ExitCode::from(1);
        }
    };

    print!("{}", umdisasm::disassemble(&words));
    ExitCode::SUCCESS
}
