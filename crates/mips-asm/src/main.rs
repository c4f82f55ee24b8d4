use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mips_asm::assemble_source;

#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble MIPS source into textual machine code")]
struct Cli {
    /// Source file (stdin when absent)
    #[arg(value_name = "SOURCE")]
    input: Option<PathBuf>,
    /// Output file (stdout when absent)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

fn cannot_open(path: &Path, e: io::Error) -> ExitCode {
    eprintln!("{}: cannot open ({e})", path.display());
    ExitCode::FAILURE
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let src = match &cli.input {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => return Ok(cannot_open(path, e)),
        },
        None => {
            let mut s = String::new();
            io::stdin().read_to_string(&mut s).context("reading stdin")?;
            s
        }
    };

    let prog = match assemble_source(&src) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let listing = prog.to_listing();

    match &cli.output {
        Some(path) => {
            let mut f = match File::create(path) {
                Ok(f) => f,
                Err(e) => return Ok(cannot_open(path, e)),
            };
            f.write_all(listing.as_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => io::stdout().write_all(listing.as_bytes())?,
    }
    Ok(ExitCode::SUCCESS)
}
