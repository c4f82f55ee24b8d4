use std::fmt::Write as _;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::VirtualMemory;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ListingError {
    #[error("line {line}: expected 32 binary digits, found {found:?}")]
    BadWord { line: usize, found: String },
}

/// An assembled program: data-segment words followed by text-segment
/// words, one 32-bit unit per 4 bytes of memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub data: Vec<u32>,
    pub text: Vec<u32>,
}

impl Program {
    /// Textual machine code: `.data`, the data words, `.text`, the text
    /// words, each word as 32 `0`/`1` characters on its own line.
    pub fn to_listing(&self) -> String {
        let mut out = String::with_capacity((self.data.len() + self.text.len() + 2) * 33);
        out.push_str(".data\n");
        for w in &self.data {
            let _ = writeln!(out, "{w:032b}");
        }
        out.push_str(".text\n");
        for w in &self.text {
            let _ = writeln!(out, "{w:032b}");
        }
        out
    }

    /// Inverse of [`Program::to_listing`]. Words before any marker belong
    /// to the text segment; blank lines are skipped.
    pub fn parse_listing(src: &str) -> Result<Self, ListingError> {
        let mut prog = Program::default();
        let mut in_data = false;
        for (i, line) in src.lines().enumerate() {
            let line = line.trim();
            match line {
                "" => continue,
                ".data" => in_data = true,
                ".text" => in_data = false,
                word => {
                    let w = parse_word(word).ok_or_else(|| ListingError::BadWord {
                        line: i + 1,
                        found: word.to_string(),
                    })?;
                    if in_data {
                        prog.data.push(w);
                    } else {
                        prog.text.push(w);
                    }
                }
            }
        }
        Ok(prog)
    }

    /// Text at the text base, data at the static base; the heap starts
    /// right after the data.
    pub fn load_into(&self, mem: &mut VirtualMemory) -> Result<()> {
        mem.load_text(&self.text)?;
        mem.load_static(&self.data)?;
        debug!(
            text_words = self.text.len(),
            data_words = self.data.len(),
            "program loaded"
        );
        Ok(())
    }
}

fn parse_word(s: &str) -> Option<u32> {
    if s.len() != 32 || !s.bytes().all(|b| b == b'0' || b == b'1') {
        return None;
    }
    u32::from_str_radix(s, 2).ok()
}
