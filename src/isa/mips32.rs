use crate::decoder::field::{code, funct, imm, opcode, rd, rs, rt, shamt, target};
use crate::decoder::{Decoder, Insn};

const SYSCALL_WORD: u32 = 0x0000_000C;

const OP_SPECIAL: u8 = 0x00;
const OP_REGIMM: u8 = 0x01;
const OP_SPECIAL2: u8 = 0x1C;

/// MIPS32 decoder.
///
/// Classification order: the exact `syscall` word, then SPECIAL/SPECIAL2 by
/// funct, then REGIMM by the rt field, then everything else by opcode.
pub struct Mips32Decoder;

impl Mips32Decoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Mips32Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for Mips32Decoder {
    fn decode(&self, raw: u32) -> Option<Insn> {
        if raw == SYSCALL_WORD {
            return Some(Insn::Syscall);
        }
        match opcode(raw) {
            OP_SPECIAL => decode_special(raw),
            OP_SPECIAL2 => decode_special2(raw),
            OP_REGIMM => decode_regimm(raw),
            _ => decode_primary(raw),
        }
    }
}

fn decode_special(raw: u32) -> Option<Insn> {
    let (rs, rt, rd, sa) = (rs(raw), rt(raw), rd(raw), shamt(raw));
    let insn = match funct(raw) {
        0x00 => Insn::Sll { rd, rt, shamt: sa },
        0x02 => Insn::Srl { rd, rt, shamt: sa },
        0x03 => Insn::Sra { rd, rt, shamt: sa },
        0x04 => Insn::Sllv { rd, rt, rs },
        0x06 => Insn::Srlv { rd, rt, rs },
        0x07 => Insn::Srav { rd, rt, rs },
        0x08 => Insn::Jr { rs },
        0x09 => Insn::Jalr { rd, rs },
        0x0D => Insn::Break { code: code(raw) },
        0x10 => Insn::Mfhi { rd },
        0x11 => Insn::Mthi { rs },
        0x12 => Insn::Mflo { rd },
        0x13 => Insn::Mtlo { rs },
        0x18 => Insn::Mult { rs, rt },
        0x19 => Insn::Multu { rs, rt },
        0x1A => Insn::Div { rs, rt },
        0x1B => Insn::Divu { rs, rt },
        0x20 => Insn::Add { rd, rs, rt },
        0x21 => Insn::Addu { rd, rs, rt },
        0x22 => Insn::Sub { rd, rs, rt },
        0x23 => Insn::Subu { rd, rs, rt },
        0x24 => Insn::And { rd, rs, rt },
        0x25 => Insn::Or { rd, rs, rt },
        0x26 => Insn::Xor { rd, rs, rt },
        0x27 => Insn::Nor { rd, rs, rt },
        0x2A => Insn::Slt { rd, rs, rt },
        0x2B => Insn::Sltu { rd, rs, rt },
        0x30 => Insn::Tge { rs, rt },
        0x31 => Insn::Tgeu { rs, rt },
        0x32 => Insn::Tlt { rs, rt },
        0x33 => Insn::Tltu { rs, rt },
        0x34 => Insn::Teq { rs, rt },
        0x36 => Insn::Tne { rs, rt },
        _ => return None,
    };
    Some(insn)
}

fn decode_special2(raw: u32) -> Option<Insn> {
    let (rs, rt, rd) = (rs(raw), rt(raw), rd(raw));
    let insn = match funct(raw) {
        0x00 => Insn::Madd { rs, rt },
        0x01 => Insn::Maddu { rs, rt },
        0x02 => Insn::Mul { rd, rs, rt },
        0x04 => Insn::Msub { rs, rt },
        0x05 => Insn::Msubu { rs, rt },
        0x20 => Insn::Clz { rd, rs },
        0x21 => Insn::Clo { rd, rs },
        _ => return None,
    };
    Some(insn)
}

fn decode_regimm(raw: u32) -> Option<Insn> {
    let (rs, imm) = (rs(raw), imm(raw));
    let insn = match rt(raw) {
        0x00 => Insn::Bltz { rs, imm },
        0x01 => Insn::Bgez { rs, imm },
        0x08 => Insn::Tgei { rs, imm },
        0x09 => Insn::Tgeiu { rs, imm },
        0x0A => Insn::Tlti { rs, imm },
        0x0B => Insn::Tltiu { rs, imm },
        0x0C => Insn::Teqi { rs, imm },
        0x0E => Insn::Tnei { rs, imm },
        0x10 => Insn::Bltzal { rs, imm },
        0x11 => Insn::Bgezal { rs, imm },
        _ => return None,
    };
    Some(insn)
}

fn decode_primary(raw: u32) -> Option<Insn> {
    let (rs, rt, imm) = (rs(raw), rt(raw), imm(raw));
    let insn = match opcode(raw) {
        0x02 => Insn::J { target: target(raw) },
        0x03 => Insn::Jal { target: target(raw) },
        0x04 => Insn::Beq { rs, rt, imm },
        0x05 => Insn::Bne { rs, rt, imm },
        0x06 => Insn::Blez { rs, imm },
        0x07 => Insn::Bgtz { rs, imm },
        0x08 => Insn::Addi { rt, rs, imm },
        0x09 => Insn::Addiu { rt, rs, imm },
        0x0A => Insn::Slti { rt, rs, imm },
        0x0B => Insn::Sltiu { rt, rs, imm },
        0x0C => Insn::Andi { rt, rs, imm },
        0x0D => Insn::Ori { rt, rs, imm },
        0x0E => Insn::Xori { rt, rs, imm },
        0x0F => Insn::Lui { rt, imm },
        0x20 => Insn::Lb { rt, rs, imm },
        0x21 => Insn::Lh { rt, rs, imm },
        0x22 => Insn::Lwl { rt, rs, imm },
        0x23 => Insn::Lw { rt, rs, imm },
        0x24 => Insn::Lbu { rt, rs, imm },
        0x25 => Insn::Lhu { rt, rs, imm },
        0x26 => Insn::Lwr { rt, rs, imm },
        0x28 => Insn::Sb { rt, rs, imm },
        0x29 => Insn::Sh { rt, rs, imm },
        0x2A => Insn::Swl { rt, rs, imm },
        0x2B => Insn::Sw { rt, rs, imm },
        0x2E => Insn::Swr { rt, rs, imm },
        0x30 => Insn::Ll { rt, rs, imm },
        0x38 => Insn::Sc { rt, rs, imm },
        _ => return None,
    };
    Some(insn)
}
