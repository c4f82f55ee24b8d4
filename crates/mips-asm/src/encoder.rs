use mips_rs::cpu::{reg, register_index};
use mips_rs::instructions::{lookup, Operands};

use crate::error::AsmError;
use crate::label::{split_labels, LabelTable};
use crate::preprocess::Line;

/// Decimal, negative decimal or `0x` hexadecimal.
pub fn parse_int(tok: &str) -> Option<i64> {
    let (neg, body) = match tok.strip_prefix('-') {
        Some(b) => (true, b),
        None => (false, tok.strip_prefix('+').unwrap_or(tok)),
    };
    let digits = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X"));
    if digits.unwrap_or(body).starts_with(['+', '-']) {
        return None;
    }
    let v = match digits {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => body.parse::<i64>().ok()?,
    };
    if neg {
        v.checked_neg()
    } else {
        Some(v)
    }
}

/// Keep the low `bits` bits; out-of-range values wrap.
#[inline]
fn wrap(v: i64, bits: u32) -> u32 {
    (v as u32) & (u32::MAX >> (32 - bits))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target<'a> {
    Label(&'a str),
    Abs(i64),
}

/// Operand parsing for one source line.
struct Operand<'a> {
    line: &'a Line,
    labels: &'a LabelTable,
}

impl<'a> Operand<'a> {
    fn reg(&self, tok: &str) -> Result<u32, AsmError> {
        register_index(tok)
            .map(u32::from)
            .ok_or_else(|| AsmError::UnknownRegister {
                line: self.line.number,
                token: tok.to_string(),
            })
    }

    fn imm(&self, tok: &str, bits: u32) -> Result<u32, AsmError> {
        parse_int(tok)
            .map(|v| wrap(v, bits))
            .ok_or_else(|| AsmError::BadImmediate {
                line: self.line.number,
                token: tok.to_string(),
            })
    }

    fn target<'t>(&self, tok: &'t str) -> Target<'t> {
        match parse_int(tok) {
            Some(v) => Target::Abs(v),
            None => Target::Label(tok),
        }
    }

    /// A literal is already a word offset; a label is made relative to
    /// `pc + 4`.
    fn branch(&self, tok: &str, pc: u32) -> Result<u32, AsmError> {
        let off = match self.target(tok) {
            Target::Abs(v) => v,
            Target::Label(l) => {
                let addr = self.labels.resolve(l, self.line.number)?;
                (i64::from(addr) - (i64::from(pc) + 4)) >> 2
            }
        };
        Ok(wrap(off, 16))
    }

    /// A literal is a byte address; either way the field holds it in words.
    fn jump(&self, tok: &str) -> Result<u32, AsmError> {
        let addr = match self.target(tok) {
            Target::Abs(v) => v,
            Target::Label(l) => i64::from(self.labels.resolve(l, self.line.number)?),
        };
        Ok(wrap(addr >> 2, 26))
    }

    /// `imm($reg)`, `($reg)` → (base, offset)
    fn mem(&self, tok: &str) -> Result<(u32, u32), AsmError> {
        let bad = || AsmError::BadMemOperand {
            line: self.line.number,
            token: tok.to_string(),
        };
        let (off, rest) = tok.split_once('(').ok_or_else(bad)?;
        let base = rest.strip_suffix(')').ok_or_else(bad)?;
        let off = if off.trim().is_empty() {
            0
        } else {
            self.imm(off.trim(), 16)?
        };
        Ok((self.reg(base.trim())?, off))
    }
}

#[inline]
fn r(rs: u32, rt: u32, rd: u32, shamt: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | (shamt << 6)
}

#[inline]
fn i(rs: u32, rt: u32, imm: u32) -> u32 {
    (rs << 21) | (rt << 16) | imm
}

/// Encode one text line (labels allowed) located at `pc`.
pub fn encode_line(line: &Line, pc: u32, labels: &LabelTable) -> Result<u32, AsmError> {
    let (names, rest) = split_labels(&line.text);
    let mut toks = rest
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());
    let Some(mnemonic) = toks.next() else {
        return Err(AsmError::DanglingLabel {
            line: line.number,
            label: names.last().map(|s| s.to_string()).unwrap_or_default(),
        });
    };
    let ops: Vec<&str> = toks.collect();
    let desc = lookup(mnemonic).ok_or_else(|| AsmError::UnknownMnemonic {
        line: line.number,
        mnemonic: mnemonic.to_string(),
    })?;

    let arity = |expected: usize| -> Result<(), AsmError> {
        if ops.len() == expected {
            Ok(())
        } else {
            Err(AsmError::OperandCount {
                line: line.number,
                mnemonic: mnemonic.to_string(),
                expected,
                found: ops.len(),
            })
        }
    };
    let p = Operand { line, labels };

    let fields = match desc.operands {
        Operands::RdRsRt => {
            arity(3)?;
            r(p.reg(ops[1])?, p.reg(ops[2])?, p.reg(ops[0])?, 0)
        }
        Operands::RdRtRs => {
            arity(3)?;
            r(p.reg(ops[2])?, p.reg(ops[1])?, p.reg(ops[0])?, 0)
        }
        Operands::RdRtShamt => {
            arity(3)?;
            r(0, p.reg(ops[1])?, p.reg(ops[0])?, p.imm(ops[2], 5)?)
        }
        Operands::RsRt => {
            arity(2)?;
            r(p.reg(ops[0])?, p.reg(ops[1])?, 0, 0)
        }
        Operands::RsRd => {
            let rd = match ops.len() {
                1 => u32::from(reg::RA),
                _ => {
                    arity(2)?;
                    p.reg(ops[1])?
                }
            };
            r(p.reg(ops[0])?, 0, rd, 0)
        }
        Operands::Rs => {
            arity(1)?;
            r(p.reg(ops[0])?, 0, 0, 0)
        }
        Operands::Rd => {
            arity(1)?;
            r(0, 0, p.reg(ops[0])?, 0)
        }
        Operands::RdRs => {
            arity(2)?;
            let rd = p.reg(ops[0])?;
            r(p.reg(ops[1])?, rd, rd, 0)
        }
        Operands::RsRtLabel => {
            arity(3)?;
            i(p.reg(ops[0])?, p.reg(ops[1])?, p.branch(ops[2], pc)?)
        }
        Operands::RsLabel => {
            arity(2)?;
            i(p.reg(ops[0])?, 0, p.branch(ops[1], pc)?)
        }
        Operands::RtRsImm => {
            arity(3)?;
            i(p.reg(ops[1])?, p.reg(ops[0])?, p.imm(ops[2], 16)?)
        }
        Operands::RtImm => {
            arity(2)?;
            i(0, p.reg(ops[0])?, p.imm(ops[1], 16)?)
        }
        Operands::RtMem => {
            arity(2)?;
            let (base, off) = p.mem(ops[1])?;
            i(base, p.reg(ops[0])?, off)
        }
        Operands::RsImm => {
            arity(2)?;
            i(p.reg(ops[0])?, 0, p.imm(ops[1], 16)?)
        }
        Operands::Target => {
            arity(1)?;
            p.jump(ops[0])?
        }
        Operands::Code => match ops.len() {
            0 => 0,
            _ => {
                arity(1)?;
                p.imm(ops[0], 20)? << 6
            }
        },
        Operands::Empty => {
            arity(0)?;
            0
        }
    };
    Ok(desc.base | fields)
}
