use serde::{Deserialize, Serialize};

/// A decoded MIPS32 instruction. Register fields are 5-bit numbers,
/// `imm` is the raw 16-bit immediate (extension happens at execution),
/// `target` is the raw 26-bit jump field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Insn {
    // SPECIAL (opcode 0), three registers
    Add { rd: u8, rs: u8, rt: u8 },
    Addu { rd: u8, rs: u8, rt: u8 },
    Sub { rd: u8, rs: u8, rt: u8 },
    Subu { rd: u8, rs: u8, rt: u8 },
    And { rd: u8, rs: u8, rt: u8 },
    Or { rd: u8, rs: u8, rt: u8 },
    Xor { rd: u8, rs: u8, rt: u8 },
    Nor { rd: u8, rs: u8, rt: u8 },
    Slt { rd: u8, rs: u8, rt: u8 },
    Sltu { rd: u8, rs: u8, rt: u8 },
    Sllv { rd: u8, rt: u8, rs: u8 },
    Srlv { rd: u8, rt: u8, rs: u8 },
    Srav { rd: u8, rt: u8, rs: u8 },
    Sll { rd: u8, rt: u8, shamt: u8 },
    Srl { rd: u8, rt: u8, shamt: u8 },
    Sra { rd: u8, rt: u8, shamt: u8 },
    Mult { rs: u8, rt: u8 },
    Multu { rs: u8, rt: u8 },
    Div { rs: u8, rt: u8 },
    Divu { rs: u8, rt: u8 },
    Jr { rs: u8 },
    Jalr { rd: u8, rs: u8 },
    Mfhi { rd: u8 },
    Mflo { rd: u8 },
    Mthi { rs: u8 },
    Mtlo { rs: u8 },
    Teq { rs: u8, rt: u8 },
    Tne { rs: u8, rt: u8 },
    Tge { rs: u8, rt: u8 },
    Tgeu { rs: u8, rt: u8 },
    Tlt { rs: u8, rt: u8 },
    Tltu { rs: u8, rt: u8 },
    Syscall,
    Break { code: u32 },

    // SPECIAL2 (opcode 0x1C)
    Mul { rd: u8, rs: u8, rt: u8 },
    Madd { rs: u8, rt: u8 },
    Maddu { rs: u8, rt: u8 },
    Msub { rs: u8, rt: u8 },
    Msubu { rs: u8, rt: u8 },
    Clo { rd: u8, rs: u8 },
    Clz { rd: u8, rs: u8 },

    // REGIMM (opcode 1), selected by rt
    Bltz { rs: u8, imm: u16 },
    Bgez { rs: u8, imm: u16 },
    Bltzal { rs: u8, imm: u16 },
    Bgezal { rs: u8, imm: u16 },
    Teqi { rs: u8, imm: u16 },
    Tnei { rs: u8, imm: u16 },
    Tgei { rs: u8, imm: u16 },
    Tgeiu { rs: u8, imm: u16 },
    Tlti { rs: u8, imm: u16 },
    Tltiu { rs: u8, imm: u16 },

    // I-type
    Beq { rs: u8, rt: u8, imm: u16 },
    Bne { rs: u8, rt: u8, imm: u16 },
    Blez { rs: u8, imm: u16 },
    Bgtz { rs: u8, imm: u16 },
    Addi { rt: u8, rs: u8, imm: u16 },
    Addiu { rt: u8, rs: u8, imm: u16 },
    Slti { rt: u8, rs: u8, imm: u16 },
    Sltiu { rt: u8, rs: u8, imm: u16 },
    Andi { rt: u8, rs: u8, imm: u16 },
    Ori { rt: u8, rs: u8, imm: u16 },
    Xori { rt: u8, rs: u8, imm: u16 },
    Lui { rt: u8, imm: u16 },
    Lb { rt: u8, rs: u8, imm: u16 },
    Lh { rt: u8, rs: u8, imm: u16 },
    Lwl { rt: u8, rs: u8, imm: u16 },
    Lw { rt: u8, rs: u8, imm: u16 },
    Lbu { rt: u8, rs: u8, imm: u16 },
    Lhu { rt: u8, rs: u8, imm: u16 },
    Lwr { rt: u8, rs: u8, imm: u16 },
    Sb { rt: u8, rs: u8, imm: u16 },
    Sh { rt: u8, rs: u8, imm: u16 },
    Swl { rt: u8, rs: u8, imm: u16 },
    Sw { rt: u8, rs: u8, imm: u16 },
    Swr { rt: u8, rs: u8, imm: u16 },
    Ll { rt: u8, rs: u8, imm: u16 },
    Sc { rt: u8, rs: u8, imm: u16 },

    // J-type
    J { target: u32 },
    Jal { target: u32 },
}

/// Bit-field accessors shared by the decoder and the assembler tests.
pub mod field {
    #[inline]
    pub fn opcode(raw: u32) -> u8 {
        (raw >> 26) as u8
    }
    #[inline]
    pub fn rs(raw: u32) -> u8 {
        ((raw >> 21) & 0x1F) as u8
    }
    #[inline]
    pub fn rt(raw: u32) -> u8 {
        ((raw >> 16) & 0x1F) as u8
    }
    #[inline]
    pub fn rd(raw: u32) -> u8 {
        ((raw >> 11) & 0x1F) as u8
    }
    #[inline]
    pub fn shamt(raw: u32) -> u8 {
        ((raw >> 6) & 0x1F) as u8
    }
    #[inline]
    pub fn funct(raw: u32) -> u8 {
        (raw & 0x3F) as u8
    }
    #[inline]
    pub fn imm(raw: u32) -> u16 {
        (raw & 0xFFFF) as u16
    }
    #[inline]
    pub fn target(raw: u32) -> u32 {
        raw & 0x03FF_FFFF
    }
    /// The 20-bit code carried by `break`.
    #[inline]
    pub fn code(raw: u32) -> u32 {
        (raw >> 6) & 0x000F_FFFF
    }
}

pub trait Decoder {
    fn decode(&self, raw32: u32) -> Option<Insn>;
}
