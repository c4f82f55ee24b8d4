use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mips_asm::assemble_source;
use mips_rs::{Machine, MachineConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble a MIPS program and run it")]
struct Cli {
    #[arg(value_name = "SOURCE")]
    source: PathBuf,
    /// Program input (stdin when absent)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Program output (stdout when absent)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Machine configuration as JSON
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long)]
    max_steps: Option<u64>,
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

    let mut cfg = match &cli.config {
        Some(path) => MachineConfig::from_json_file(path)?,
        None => MachineConfig::default(),
    };
    if cli.max_steps.is_some() {
        cfg.max_steps = cli.max_steps;
    }

    let src = match std::fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => return Ok(cannot_open(&cli.source, e)),
    };
    let prog = match assemble_source(&src) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}: {e}", cli.source.display());
            return Ok(ExitCode::FAILURE);
        }
    };

    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => return Ok(cannot_open(path, e)),
        },
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &cli.output {
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(BufWriter::new(f)),
            Err(e) => return Ok(cannot_open(path, e)),
        },
        None => Box::new(io::stdout().lock()),
    };

    let mut machine = Machine::new(cfg, input, output);
    machine.load(&prog)?;
    match machine.run() {
        Ok(halt) => Ok(halt.status().map_or(ExitCode::FAILURE, ExitCode::from)),
        Err(fault) => {
            eprintln!("{fault}");
            Ok(ExitCode::FAILURE)
        }
    }
}
