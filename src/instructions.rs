/// Encoding family of a mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    R,
    I,
    J,
    /// No operands or a bare code field (`nop`, `syscall`, `eret`, `break`).
    O,
}

/// Source-level operand order, and where each operand lands in the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    /// `rd, rs, rt`
    RdRsRt,
    /// `rd, rt, rs` (variable shifts)
    RdRtRs,
    /// `rd, rt, shamt`
    RdRtShamt,
    /// `rs, rt`
    RsRt,
    /// `rs, rd` (`jalr`; rd defaults to `$ra`)
    RsRd,
    /// `rs`
    Rs,
    /// `rd`
    Rd,
    /// `rd, rs`, also copied into rt (`clo`, `clz`)
    RdRs,
    /// `rs, rt, label`
    RsRtLabel,
    /// `rs, label`
    RsLabel,
    /// `rt, rs, imm`
    RtRsImm,
    /// `rt, imm`
    RtImm,
    /// `rt, imm(rs)`
    RtMem,
    /// `rs, imm`
    RsImm,
    /// `label` (26-bit word address)
    Target,
    /// 20-bit code
    Code,
    Empty,
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub mnemonic: &'static str,
    pub format: Format,
    pub operands: Operands,
    /// Fixed bits: opcode plus funct / rt selector / constant fields.
    pub base: u32,
}

const fn special(funct: u32) -> u32 {
    funct
}
const fn special2(funct: u32) -> u32 {
    (0x1C << 26) | funct
}
const fn regimm(rt: u32) -> u32 {
    (0x01 << 26) | (rt << 16)
}
const fn op(opcode: u32) -> u32 {
    opcode << 26
}

const fn d(mnemonic: &'static str, format: Format, operands: Operands, base: u32) -> InstrDesc {
    InstrDesc {
        mnemonic,
        format,
        operands,
        base,
    }
}

use Format::{I, J, O, R};
use Operands::*;

pub const TABLE: &[InstrDesc] = &[
    d("add", R, RdRsRt, special(0x20)),
    d("addu", R, RdRsRt, special(0x21)),
    d("sub", R, RdRsRt, special(0x22)),
    d("subu", R, RdRsRt, special(0x23)),
    d("and", R, RdRsRt, special(0x24)),
    d("or", R, RdRsRt, special(0x25)),
    d("xor", R, RdRsRt, special(0x26)),
    d("nor", R, RdRsRt, special(0x27)),
    d("slt", R, RdRsRt, special(0x2A)),
    d("sltu", R, RdRsRt, special(0x2B)),
    d("sllv", R, RdRtRs, special(0x04)),
    d("srlv", R, RdRtRs, special(0x06)),
    d("srav", R, RdRtRs, special(0x07)),
    d("sll", R, RdRtShamt, special(0x00)),
    d("srl", R, RdRtShamt, special(0x02)),
    d("sra", R, RdRtShamt, special(0x03)),
    d("mult", R, RsRt, special(0x18)),
    d("multu", R, RsRt, special(0x19)),
    d("div", R, RsRt, special(0x1A)),
    d("divu", R, RsRt, special(0x1B)),
    d("jr", R, Rs, special(0x08)),
    d("jalr", R, RsRd, special(0x09)),
    d("mfhi", R, Rd, special(0x10)),
    d("mthi", R, Rs, special(0x11)),
    d("mflo", R, Rd, special(0x12)),
    d("mtlo", R, Rs, special(0x13)),
    d("tge", R, RsRt, special(0x30)),
    d("tgeu", R, RsRt, special(0x31)),
    d("tlt", R, RsRt, special(0x32)),
    d("tltu", R, RsRt, special(0x33)),
    d("teq", R, RsRt, special(0x34)),
    d("tne", R, RsRt, special(0x36)),
    d("madd", R, RsRt, special2(0x00)),
    d("maddu", R, RsRt, special2(0x01)),
    d("mul", R, RdRsRt, special2(0x02)),
    d("msub", R, RsRt, special2(0x04)),
    d("msubu", R, RsRt, special2(0x05)),
    d("clz", R, RdRs, special2(0x20)),
    d("clo", R, RdRs, special2(0x21)),
    d("bltz", I, RsLabel, regimm(0x00)),
    d("bgez", I, RsLabel, regimm(0x01)),
    d("tgei", I, RsImm, regimm(0x08)),
    d("tgeiu", I, RsImm, regimm(0x09)),
    d("tlti", I, RsImm, regimm(0x0A)),
    d("tltiu", I, RsImm, regimm(0x0B)),
    d("teqi", I, RsImm, regimm(0x0C)),
    d("tnei", I, RsImm, regimm(0x0E)),
    d("bltzal", I, RsLabel, regimm(0x10)),
    d("bgezal", I, RsLabel, regimm(0x11)),
    d("beq", I, RsRtLabel, op(0x04)),
    d("bne", I, RsRtLabel, op(0x05)),
    d("blez", I, RsLabel, op(0x06)),
    d("bgtz", I, RsLabel, op(0x07)),
    d("addi", I, RtRsImm, op(0x08)),
    d("addiu", I, RtRsImm, op(0x09)),
    d("slti", I, RtRsImm, op(0x0A)),
    d("sltiu", I, RtRsImm, op(0x0B)),
    d("andi", I, RtRsImm, op(0x0C)),
    d("ori", I, RtRsImm, op(0x0D)),
    d("xori", I, RtRsImm, op(0x0E)),
    d("lui", I, RtImm, op(0x0F)),
    d("lb", I, RtMem, op(0x20)),
    d("lh", I, RtMem, op(0x21)),
    d("lwl", I, RtMem, op(0x22)),
    d("lw", I, RtMem, op(0x23)),
    d("lbu", I, RtMem, op(0x24)),
    d("lhu", I, RtMem, op(0x25)),
    d("lwr", I, RtMem, op(0x26)),
    d("sb", I, RtMem, op(0x28)),
    d("sh", I, RtMem, op(0x29)),
    d("swl", I, RtMem, op(0x2A)),
    d("sw", I, RtMem, op(0x2B)),
    d("swr", I, RtMem, op(0x2E)),
    d("ll", I, RtMem, op(0x30)),
    d("sc", I, RtMem, op(0x38)),
    d("j", J, Target, op(0x02)),
    d("jal", J, Target, op(0x03)),
    d("nop", O, Empty, 0x0000_0000),
    d("syscall", O, Empty, special(0x0C)),
    d("eret", O, Empty, 0x4200_0018),
    d("break", O, Code, special(0x0D)),
];

pub fn lookup(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic == mnemonic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonics_are_unique() {
        for (i, a) in TABLE.iter().enumerate() {
            assert!(
                TABLE[i + 1..].iter().all(|b| b.mnemonic != a.mnemonic),
                "duplicate {}",
                a.mnemonic
            );
        }
    }

    #[test]
    fn fixed_patterns() {
        assert_eq!(lookup("syscall").unwrap().base, 0b1100);
        assert_eq!(lookup("eret").unwrap().base, 0b0100_0010_0000_0000_0000_0000_0001_1000);
        assert_eq!(lookup("mul").unwrap().base >> 26, 0b011100);
        assert_eq!(lookup("bgezal").unwrap().base, (1 << 26) | (0b10001 << 16));
        assert!(lookup("la").is_none());
    }
}
