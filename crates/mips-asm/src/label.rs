use std::collections::HashMap;

use tracing::debug;

use crate::error::AsmError;
use crate::preprocess::Line;

fn is_label_name(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Peel leading `name:` prefixes off a line.
pub fn split_labels(line: &str) -> (Vec<&str>, &str) {
    let mut labels = Vec::new();
    let mut rest = line.trim_start();
    while let Some(idx) = rest.find(':') {
        let name = rest[..idx].trim();
        if !is_label_name(name) {
            break;
        }
        labels.push(name);
        rest = rest[idx + 1..].trim_start();
    }
    (labels, rest.trim_end())
}

/// Label name to address, for the text segment.
#[derive(Debug, Default)]
pub struct LabelTable {
    map: HashMap<String, u32>,
}

impl LabelTable {
    /// Every text line occupies one 4-byte slot starting at `start`.
    pub fn build(text: &[Line], start: u32) -> Result<Self, AsmError> {
        let mut map = HashMap::new();
        for (i, line) in text.iter().enumerate() {
            let addr = start.wrapping_add(4 * i as u32);
            for name in split_labels(&line.text).0 {
                if map.insert(name.to_string(), addr).is_some() {
                    return Err(AsmError::DuplicateLabel {
                        line: line.number,
                        label: name.to_string(),
                    });
                }
                debug!("label {name} at {addr:#010x}");
            }
        }
        Ok(Self { map })
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.map.get(name).copied()
    }

    pub fn resolve(&self, name: &str, line: usize) -> Result<u32, AsmError> {
        self.get(name).ok_or_else(|| AsmError::UnresolvedLabel {
            line,
            label: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
