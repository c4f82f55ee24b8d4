use bitvec::prelude::*;
use mips_rs::MemoryLayout;
use tracing::debug;

use crate::encoder::parse_int;
use crate::error::AsmError;
use crate::label::split_labels;
use crate::preprocess::Line;

type Chunk = BitVec<u8, Msb0>;

fn push_bits(chunk: &mut Chunk, value: i64, width: usize) {
    let v = value as u32;
    chunk.extend(v.view_bits::<Msb0>()[32 - width..].iter().by_vals());
}

fn push_bytes(chunk: &mut Chunk, bytes: &[u8]) {
    chunk.extend_from_bitslice(bytes.view_bits::<Msb0>());
}

fn values(line: usize, args: &str) -> Result<Vec<i64>, AsmError> {
    args.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            parse_int(t).ok_or_else(|| AsmError::BadImmediate {
                line,
                token: t.to_string(),
            })
        })
        .collect()
}

/// Contents of a double-quoted literal with `\n \t \0 \' \" \\` escapes.
pub fn parse_string(line: usize, args: &str) -> Result<Vec<u8>, AsmError> {
    let bad = || AsmError::BadString { line };
    let body = args.trim().strip_prefix('"').ok_or_else(bad)?;
    let mut out = Vec::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                return if body[i + 1..].trim().is_empty() {
                    Ok(out)
                } else {
                    Err(bad())
                };
            }
            '\\' => {
                let b = match chars.next().map(|(_, c)| c) {
                    Some('n') => b'\n',
                    Some('t') => b'\t',
                    Some('0') => 0,
                    Some('\'') => b'\'',
                    Some('"') => b'"',
                    Some('\\') => b'\\',
                    _ => return Err(bad()),
                };
                out.push(b);
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    Err(bad())
}

/// Encode one directive into the chunks it contributes. `.word` gives
/// one chunk per value, every other directive a single chunk.
fn directive_chunks(line: &Line) -> Result<Vec<Chunk>, AsmError> {
    let (_, rest) = split_labels(&line.text);
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    let (dir, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let n = line.number;
    let mut chunk = Chunk::new();
    match dir {
        ".word" => {
            return Ok(values(n, args)?
                .into_iter()
                .map(|v| {
                    let mut c = Chunk::new();
                    push_bits(&mut c, v, 32);
                    c
                })
                .collect());
        }
        ".half" => values(n, args)?
            .into_iter()
            .for_each(|v| push_bits(&mut chunk, v, 16)),
        ".byte" => values(n, args)?
            .into_iter()
            .for_each(|v| push_bits(&mut chunk, v, 8)),
        ".ascii" => push_bytes(&mut chunk, &parse_string(n, args)?),
        ".asciiz" => {
            push_bytes(&mut chunk, &parse_string(n, args)?);
            push_bits(&mut chunk, 0, 8);
        }
        ".space" => {
            let count = match values(n, args)?.as_slice() {
                [c] if *c >= 0 => *c,
                _ => {
                    return Err(AsmError::BadImmediate {
                        line: n,
                        token: args.trim().to_string(),
                    })
                }
            };
            let limit = i64::from(MemoryLayout::default().size);
            let bits = usize::try_from(count)
                .ok()
                .filter(|_| count <= limit)
                .and_then(|c| c.checked_mul(8))
                .ok_or(AsmError::SpaceTooLarge { line: n, count })?;
            chunk.resize(bits, false);
        }
        _ => {
            return Err(AsmError::UnknownDirective {
                line: n,
                directive: dir.to_string(),
            })
        }
    }
    Ok(vec![chunk])
}

/// Split a chunk into 32-bit words, zero-padding the last one on the
/// right.
fn to_words(chunk: &BitSlice<u8, Msb0>) -> impl Iterator<Item = u32> + '_ {
    chunk.chunks(32).map(|piece| {
        piece
            .iter_ones()
            .fold(0u32, |w, i| w | (1 << (31 - i)))
    })
}

/// Assemble the data segment into 32-bit words in declaration order.
pub fn encode_data(lines: &[Line]) -> Result<Vec<u32>, AsmError> {
    let mut words = Vec::new();
    for line in lines {
        for chunk in directive_chunks(line)? {
            words.extend(to_words(&chunk));
        }
    }
    debug!(words = words.len(), "data segment encoded");
    Ok(words)
}
