//! `asm`: translates Universal Machine assembly source into a packed
//! binary image.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about = "Assemble Universal Machine source into a .um image")]
struct Args {
    /// Path to the `.uma` source file
    input: PathBuf,

    /// Output path for the assembled image
    #[arg(short, long, default_value = "a.um")]
    output: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let source = match std::fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("asm: {}: {}", args.input.display(), err);
            return ExitCode::from(1);
        }
    };

    let words = match umasm::assemble(&source) {
        Ok(words) => words,
        Err(err) => {
            eprintln!("asm:{}:{}", args.input.display(), err);
            return ExitCode::from(1);
        }
    };

    if let Err(err) = um::image::write_file(&args.output, &words) {
        eprintln!("asm: {}: {}", args.output.display(), err);
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
