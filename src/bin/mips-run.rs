use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mips_rs::{Machine, MachineConfig, Program};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run an assembled MIPS listing")]
struct Opts {
    /// Listing produced by mips-asm
    #[arg(value_name = "LISTING")]
    listing: PathBuf,
    /// Program input (defaults to stdin)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,
    /// Program output (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Machine configuration as JSON
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long)]
    max_steps: Option<u64>,
    /// Print the final register file as JSON on stderr
    #[arg(long)]
    dump_state: bool,
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

    let opts = Opts::parse();

    let mut cfg = match &opts.config {
        Some(path) => MachineConfig::from_json_file(path)?,
        None => MachineConfig::default(),
    };
    if opts.max_steps.is_some() {
        cfg.max_steps = opts.max_steps;
    }

    let src = match std::fs::read_to_string(&opts.listing) {
        Ok(s) => s,
        Err(e) => return Ok(cannot_open(&opts.listing, e)),
    };
    let prog = Program::parse_listing(&src)
        .with_context(|| format!("parsing {}", opts.listing.display()))?;

    let input: Box<dyn BufRead> = match &opts.input {
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => return Ok(cannot_open(path, e)),
        },
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &opts.output {
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(BufWriter::new(f)),
            Err(e) => return Ok(cannot_open(path, e)),
        },
        None => Box::new(io::stdout().lock()),
    };

    let mut machine = Machine::new(cfg, input, output);
    machine.load(&prog)?;
    let result = machine.run();

    if opts.dump_state {
        eprintln!("{}", serde_json::to_string_pretty(&machine.cpu)?);
    }

    match result {
        Ok(halt) => Ok(halt.status().map_or(ExitCode::FAILURE, ExitCode::from)),
        Err(fault) => {
            eprintln!("{fault}");
            Ok(ExitCode::FAILURE)
        }
    }
}
