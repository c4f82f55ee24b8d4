//! Two-pass MIPS assembler producing the textual machine code that
//! `mips-rs` loads.

pub mod data;
pub mod encoder;
pub mod error;
pub mod label;
pub mod preprocess;

use mips_rs::memory::TEXT_BASE;
use tracing::debug;

pub use error::AsmError;
pub use label::LabelTable;
pub use mips_rs::Program;
pub use preprocess::{preprocess, Line, Source};

/// Assemble already split and cleaned segments. The first text line sits
/// at the text base.
pub fn assemble(src: &Source) -> Result<Program, AsmError> {
    let data = data::encode_data(&src.data)?;
    let labels = LabelTable::build(&src.text, TEXT_BASE)?;
    debug!(labels = labels.len(), "labels resolved");
    let text = src
        .text
        .iter()
        .enumerate()
        .map(|(i, line)| encoder::encode_line(line, TEXT_BASE + 4 * i as u32, &labels))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Program { data, text })
}

/// Assemble logical lines, numbered from 1 within each segment.
pub fn assemble_lines(data: &[&str], text: &[&str]) -> Result<Program, AsmError> {
    let number = |lines: &[&str]| -> Vec<Line> {
        lines
            .iter()
            .enumerate()
            .map(|(i, s)| Line::new(i + 1, *s))
            .collect()
    };
    assemble(&Source {
        data: number(data),
        text: number(text),
    })
}

/// Preprocess and assemble a whole source file.
pub fn assemble_source(src: &str) -> Result<Program, AsmError> {
    assemble(&preprocess(src)?)
}
