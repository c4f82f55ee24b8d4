use crate::cpu::REG_NAMES;
use crate::decoder::Insn;

fn r(n: u8) -> String {
    format!("${}", REG_NAMES[usize::from(n) & 0x1F])
}

fn rrr(mn: &str, a: u8, b: u8, c: u8) -> String {
    format!("{} {}, {}, {}", mn, r(a), r(b), r(c))
}

fn rr(mn: &str, a: u8, b: u8) -> String {
    format!("{} {}, {}", mn, r(a), r(b))
}

fn ri(mn: &str, a: u8, imm: u16) -> String {
    format!("{} {}, {}", mn, r(a), imm as i16)
}

fn rri(mn: &str, a: u8, b: u8, imm: u16) -> String {
    format!("{} {}, {}, {}", mn, r(a), r(b), imm as i16)
}

// Branch offsets are shown in words, as encoded.
fn br(mn: &str, a: u8, imm: u16) -> String {
    format!("{} {}, {:+}", mn, r(a), imm as i16)
}

fn mem(mn: &str, rt: u8, rs: u8, imm: u16) -> String {
    format!("{} {}, {}({})", mn, r(rt), imm as i16, r(rs))
}

pub fn fmt_insn(insn: &Insn) -> String {
    match *insn {
        Insn::Sll { rd: 0, rt: 0, shamt: 0 } => "nop".to_string(),
        Insn::Add { rd, rs, rt } => rrr("add", rd, rs, rt),
        Insn::Addu { rd, rs, rt } => rrr("addu", rd, rs, rt),
        Insn::Sub { rd, rs, rt } => rrr("sub", rd, rs, rt),
        Insn::Subu { rd, rs, rt } => rrr("subu", rd, rs, rt),
        Insn::And { rd, rs, rt } => rrr("and", rd, rs, rt),
        Insn::Or { rd, rs, rt } => rrr("or", rd, rs, rt),
        Insn::Xor { rd, rs, rt } => rrr("xor", rd, rs, rt),
        Insn::Nor { rd, rs, rt } => rrr("nor", rd, rs, rt),
        Insn::Slt { rd, rs, rt } => rrr("slt", rd, rs, rt),
        Insn::Sltu { rd, rs, rt } => rrr("sltu", rd, rs, rt),
        Insn::Sllv { rd, rt, rs } => rrr("sllv", rd, rt, rs),
        Insn::Srlv { rd, rt, rs } => rrr("srlv", rd, rt, rs),
        Insn::Srav { rd, rt, rs } => rrr("srav", rd, rt, rs),
        Insn::Sll { rd, rt, shamt } => format!("sll {}, {}, {}", r(rd), r(rt), shamt),
        Insn::Srl { rd, rt, shamt } => format!("srl {}, {}, {}", r(rd), r(rt), shamt),
        Insn::Sra { rd, rt, shamt } => format!("sra {}, {}, {}", r(rd), r(rt), shamt),
        Insn::Mult { rs, rt } => rr("mult", rs, rt),
        Insn::Multu { rs, rt } => rr("multu", rs, rt),
        Insn::Div { rs, rt } => rr("div", rs, rt),
        Insn::Divu { rs, rt } => rr("divu", rs, rt),
        Insn::Jr { rs } => format!("jr {}", r(rs)),
        Insn::Jalr { rd, rs } => rr("jalr", rs, rd),
        Insn::Mfhi { rd } => format!("mfhi {}", r(rd)),
        Insn::Mflo { rd } => format!("mflo {}", r(rd)),
        Insn::Mthi { rs } => format!("mthi {}", r(rs)),
        Insn::Mtlo { rs } => format!("mtlo {}", r(rs)),
        Insn::Teq { rs, rt } => rr("teq", rs, rt),
        Insn::Tne { rs, rt } => rr("tne", rs, rt),
        Insn::Tge { rs, rt } => rr("tge", rs, rt),
        Insn::Tgeu { rs, rt } => rr("tgeu", rs, rt),
        Insn::Tlt { rs, rt } => rr("tlt", rs, rt),
        Insn::Tltu { rs, rt } => rr("tltu", rs, rt),
        Insn::Syscall => "syscall".to_string(),
        Insn::Break { code } => format!("break {code}"),
        Insn::Mul { rd, rs, rt } => rrr("mul", rd, rs, rt),
        Insn::Madd { rs, rt } => rr("madd", rs, rt),
        Insn::Maddu { rs, rt } => rr("maddu", rs, rt),
        Insn::Msub { rs, rt } => rr("msub", rs, rt),
        Insn::Msubu { rs, rt } => rr("msubu", rs, rt),
        Insn::Clo { rd, rs } => rr("clo", rd, rs),
        Insn::Clz { rd, rs } => rr("clz", rd, rs),
        Insn::Bltz { rs, imm } => br("bltz", rs, imm),
        Insn::Bgez { rs, imm } => br("bgez", rs, imm),
        Insn::Bltzal { rs, imm } => br("bltzal", rs, imm),
        Insn::Bgezal { rs, imm } => br("bgezal", rs, imm),
        Insn::Teqi { rs, imm } => ri("teqi", rs, imm),
        Insn::Tnei { rs, imm } => ri("tnei", rs, imm),
        Insn::Tgei { rs, imm } => ri("tgei", rs, imm),
        Insn::Tgeiu { rs, imm } => ri("tgeiu", rs, imm),
        Insn::Tlti { rs, imm } => ri("tlti", rs, imm),
        Insn::Tltiu { rs, imm } => ri("tltiu", rs, imm),
        Insn::Beq { rs, rt, imm } => format!("beq {}, {}, {:+}", r(rs), r(rt), imm as i16),
        Insn::Bne { rs, rt, imm } => format!("bne {}, {}, {:+}", r(rs), r(rt), imm as i16),
        Insn::Blez { rs, imm } => br("blez", rs, imm),
        Insn::Bgtz { rs, imm } => br("bgtz", rs, imm),
        Insn::Addi { rt, rs, imm } => rri("addi", rt, rs, imm),
        Insn::Addiu { rt, rs, imm } => rri("addiu", rt, rs, imm),
        Insn::Slti { rt, rs, imm } => rri("slti", rt, rs, imm),
        Insn::Sltiu { rt, rs, imm } => rri("sltiu", rt, rs, imm),
        Insn::Andi { rt, rs, imm } => format!("andi {}, {}, {:#x}", r(rt), r(rs), imm),
        Insn::Ori { rt, rs, imm } => format!("ori {}, {}, {:#x}", r(rt), r(rs), imm),
        Insn::Xori { rt, rs, imm } => format!("xori {}, {}, {:#x}", r(rt), r(rs), imm),
        Insn::Lui { rt, imm } => format!("lui {}, {:#x}", r(rt), imm),
        Insn::Lb { rt, rs, imm } => mem("lb", rt, rs, imm),
        Insn::Lh { rt, rs, imm } => mem("lh", rt, rs, imm),
        Insn::Lwl { rt, rs, imm } => mem("lwl", rt, rs, imm),
        Insn::Lw { rt, rs, imm } => mem("lw", rt, rs, imm),
        Insn::Lbu { rt, rs, imm } => mem("lbu", rt, rs, imm),
        Insn::Lhu { rt, rs, imm } => mem("lhu", rt, rs, imm),
        Insn::Lwr { rt, rs, imm } => mem("lwr", rt, rs, imm),
        Insn::Sb { rt, rs, imm } => mem("sb", rt, rs, imm),
        Insn::Sh { rt, rs, imm } => mem("sh", rt, rs, imm),
        Insn::Swl { rt, rs, imm } => mem("swl", rt, rs, imm),
        Insn::Sw { rt, rs, imm } => mem("sw", rt, rs, imm),
        Insn::Swr { rt, rs, imm } => mem("swr", rt, rs, imm),
        Insn::Ll { rt, rs, imm } => mem("ll", rt, rs, imm),
        Insn::Sc { rt, rs, imm } => mem("sc", rt, rs, imm),
        Insn::J { target } => format!("j {:#010x}", target << 2),
        Insn::Jal { target } => format!("jal {:#010x}", target << 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_common_forms() {
        assert_eq!(fmt_insn(&Insn::Add { rd: 8, rs: 9, rt: 10 }), "add $t0, $t1, $t2");
        assert_eq!(fmt_insn(&Insn::Lw { rt: 8, rs: 29, imm: 0xFFFC }), "lw $t0, -4($sp)");
        assert_eq!(fmt_insn(&Insn::Sll { rd: 0, rt: 0, shamt: 0 }), "nop");
        assert_eq!(fmt_insn(&Insn::Beq { rs: 8, rt: 8, imm: 3 }), "beq $t0, $t0, +3");
        assert_eq!(fmt_insn(&Insn::J { target: 0x0010_0000 }), "j 0x00400000");
    }
}
