use crate::error::AsmError;
use crate::label::split_labels;

/// One logical source line and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

impl Line {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Comment-free source split into its two segments. Text lines carry at
/// most one instruction each, with any labels merged onto it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    pub data: Vec<Line>,
    pub text: Vec<Line>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Segment {
    Data,
    Text,
}

/// Cut a `#` comment, ignoring `#` inside string literals.
pub fn strip_comment(line: &str) -> &str {
    let mut in_str = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_str => escaped = true,
            '"' => in_str = !in_str,
            '#' if !in_str => return &line[..i],
            _ => {}
        }
    }
    line
}

fn marker(line: &str, name: &str) -> bool {
    line.strip_prefix(name)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Split assembly source into data and text lines. `.data` and `.text`
/// may alternate; lines before the first marker are text.
pub fn preprocess(src: &str) -> Result<Source, AsmError> {
    let mut out = Source::default();
    let mut seg = Segment::Text;
    let mut text = Vec::new();

    for (i, raw) in src.lines().enumerate() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        if marker(line, ".data") {
            seg = Segment::Data;
            continue;
        }
        if marker(line, ".text") {
            seg = Segment::Text;
            continue;
        }
        if marker(line, ".globl") || marker(line, ".global") {
            continue;
        }
        let l = Line::new(i + 1, line);
        match seg {
            Segment::Data => out.data.push(l),
            Segment::Text => text.push(l),
        }
    }

    out.text = merge_labels(text)?;
    Ok(out)
}

/// Attach label-only lines to the next instruction and turn commas and
/// tabs into spaces.
fn merge_labels(lines: Vec<Line>) -> Result<Vec<Line>, AsmError> {
    let mut out = Vec::with_capacity(lines.len());
    let mut pending: Option<Line> = None;
    for line in lines {
        let (labels, rest) = split_labels(&line.text);
        let merged = match pending.take() {
            Some(p) => format!("{} {}", p.text, line.text),
            None => line.text.clone(),
        };
        if rest.is_empty() && !labels.is_empty() {
            pending = Some(Line::new(line.number, merged));
            continue;
        }
        let text: String = merged
            .chars()
            .map(|c| if c == ',' || c == '\t' { ' ' } else { c })
            .collect();
        out.push(Line::new(line.number, text));
    }
    if let Some(p) = pending {
        let (labels, _) = split_labels(&p.text);
        return Err(AsmError::DanglingLabel {
            line: p.number,
            label: labels.last().map(|s| s.to_string()).unwrap_or_default(),
        });
    }
    Ok(out)
}
