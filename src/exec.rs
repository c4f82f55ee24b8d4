use crate::cpu::{reg, Cpu, Trap, TrapKind};
use crate::decoder::Insn;
use crate::memory::Bus;

pub trait Executor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, insn: Insn) -> Result<(), Trap>;
}

#[inline]
pub fn sign_extend(imm: u16) -> u32 {
    imm as i16 as i32 as u32
}

#[inline]
fn zero_extend(imm: u16) -> u32 {
    u32::from(imm)
}

/// Effective address `rs + sext(imm)`.
#[inline]
fn ea(cpu: &Cpu, rs: u8, imm: u16) -> u32 {
    cpu.read(rs).wrapping_add(sign_extend(imm))
}

fn aligned(addr: u32, align: u32) -> Result<u32, Trap> {
    if addr % align != 0 {
        return Err(Trap::Unaligned { addr });
    }
    Ok(addr)
}

/// `pc` already points at the next instruction.
#[inline]
fn branch(cpu: &mut Cpu, taken: bool, imm: u16) {
    if taken {
        cpu.pc = cpu.pc.wrapping_add(sign_extend(imm) << 2);
    }
}

#[inline]
fn jump(cpu: &mut Cpu, target: u32) {
    cpu.pc = (cpu.pc & 0xF000_0000) | (target << 2);
}

fn trap_if(cond: bool, kind: TrapKind) -> Result<(), Trap> {
    if cond {
        return Err(Trap::Trap(kind));
    }
    Ok(())
}

#[inline]
fn hilo(cpu: &Cpu) -> u64 {
    (u64::from(cpu.hi) << 32) | u64::from(cpu.lo)
}

#[inline]
fn set_hilo(cpu: &mut Cpu, v: u64) {
    cpu.hi = (v >> 32) as u32;
    cpu.lo = v as u32;
}

fn load<B: Bus>(bus: &mut B, addr: u32, width: u32) -> Result<u32, Trap> {
    let addr = aligned(addr, width)?;
    let v = match width {
        1 => bus.read_u8(addr).map(u32::from),
        2 => bus.read_u16(addr).map(u32::from),
        _ => bus.read_u32(addr),
    };
    v.map_err(|source| Trap::Bus { addr, source })
}

fn store<B: Bus>(bus: &mut B, addr: u32, width: u32, val: u32) -> Result<(), Trap> {
    let addr = aligned(addr, width)?;
    let r = match width {
        1 => bus.write_u8(addr, val as u8),
        2 => bus.write_u16(addr, val as u16),
        _ => bus.write_u32(addr, val),
    };
    r.map_err(|source| Trap::Bus { addr, source })
}

/// Big-endian `lwl`: the bytes from `addr` to the end of its word fill
/// the register from the most significant end.
pub fn merge_left(reg: u32, word: u32, addr: u32) -> u32 {
    let shift = 8 * (addr & 3);
    let keep = (1u32 << shift).wrapping_sub(1);
    (word << shift) | (reg & keep)
}

/// Big-endian `lwr`: the bytes from the start of the word up to `addr`
/// fill the register from the least significant end.
pub fn merge_right(reg: u32, word: u32, addr: u32) -> u32 {
    let shift = 8 * (3 - (addr & 3));
    let take = u32::MAX >> shift;
    (word >> shift) | (reg & !take)
}

/// Big-endian `swl`: the register's high bytes overwrite `addr` up to
/// the end of its word.
pub fn store_left(reg: u32, word: u32, addr: u32) -> u32 {
    let shift = 8 * (addr & 3);
    let take = u32::MAX >> shift;
    (reg >> shift) | (word & !take)
}

/// Big-endian `swr`: the register's low bytes overwrite the start of the
/// word up to `addr`.
pub fn store_right(reg: u32, word: u32, addr: u32) -> u32 {
    let shift = 8 * (3 - (addr & 3));
    let keep = (1u32 << shift).wrapping_sub(1);
    (reg << shift) | (word & keep)
}

pub struct IntExecutor;
impl Executor for IntExecutor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, insn: Insn) -> Result<(), Trap> {
        match insn {
            Insn::Add { rd, rs, rt } => {
                let res = (cpu.read(rs) as i32)
                    .checked_add(cpu.read(rt) as i32)
                    .ok_or(Trap::Overflow)?;
                cpu.write(rd, res as u32);
            }
            Insn::Addu { rd, rs, rt } => cpu.write(rd, cpu.read(rs).wrapping_add(cpu.read(rt))),
            Insn::Sub { rd, rs, rt } => {
                let res = (cpu.read(rs) as i32)
                    .checked_sub(cpu.read(rt) as i32)
                    .ok_or(Trap::Overflow)?;
                cpu.write(rd, res as u32);
            }
            Insn::Subu { rd, rs, rt } => cpu.write(rd, cpu.read(rs).wrapping_sub(cpu.read(rt))),
            Insn::And { rd, rs, rt } => cpu.write(rd, cpu.read(rs) & cpu.read(rt)),
            Insn::Or { rd, rs, rt } => cpu.write(rd, cpu.read(rs) | cpu.read(rt)),
            Insn::Xor { rd, rs, rt } => cpu.write(rd, cpu.read(rs) ^ cpu.read(rt)),
            Insn::Nor { rd, rs, rt } => cpu.write(rd, !(cpu.read(rs) | cpu.read(rt))),
            Insn::Slt { rd, rs, rt } => {
                let v = (cpu.read(rs) as i32) < (cpu.read(rt) as i32);
                cpu.write(rd, v as u32);
            }
            Insn::Sltu { rd, rs, rt } => cpu.write(rd, (cpu.read(rs) < cpu.read(rt)) as u32),
            Insn::Sllv { rd, rt, rs } => cpu.write(rd, cpu.read(rt) << (cpu.read(rs) & 0x1F)),
            Insn::Srlv { rd, rt, rs } => cpu.write(rd, cpu.read(rt) >> (cpu.read(rs) & 0x1F)),
            Insn::Srav { rd, rt, rs } => {
                let s = cpu.read(rs) & 0x1F;
                cpu.write(rd, ((cpu.read(rt) as i32) >> s) as u32);
            }
            Insn::Sll { rd, rt, shamt } => cpu.write(rd, cpu.read(rt) << (shamt & 0x1F)),
            Insn::Srl { rd, rt, shamt } => cpu.write(rd, cpu.read(rt) >> (shamt & 0x1F)),
            Insn::Sra { rd, rt, shamt } => {
                cpu.write(rd, ((cpu.read(rt) as i32) >> (shamt & 0x1F)) as u32)
            }

            Insn::Mult { rs, rt } => {
                let p = i64::from(cpu.read(rs) as i32) * i64::from(cpu.read(rt) as i32);
                set_hilo(cpu, p as u64);
            }
            Insn::Multu { rs, rt } => {
                let p = u64::from(cpu.read(rs)) * u64::from(cpu.read(rt));
                set_hilo(cpu, p);
            }
            // Division by zero leaves HI/LO untouched.
            Insn::Div { rs, rt } => {
                let (n, d) = (cpu.read(rs) as i32, cpu.read(rt) as i32);
                if d != 0 {
                    cpu.lo = n.wrapping_div(d) as u32;
                    cpu.hi = n.wrapping_rem(d) as u32;
                }
            }
            Insn::Divu { rs, rt } => {
                let (n, d) = (cpu.read(rs), cpu.read(rt));
                if d != 0 {
                    cpu.lo = n / d;
                    cpu.hi = n % d;
                }
            }
            Insn::Mul { rd, rs, rt } => {
                let p = i64::from(cpu.read(rs) as i32) * i64::from(cpu.read(rt) as i32);
                cpu.write(rd, p as u32);
            }
            Insn::Madd { rs, rt } => {
                let p = i64::from(cpu.read(rs) as i32) * i64::from(cpu.read(rt) as i32);
                let acc = (hilo(cpu) as i64).wrapping_add(p) as u64;
                set_hilo(cpu, acc);
            }
            Insn::Maddu { rs, rt } => {
                let p = u64::from(cpu.read(rs)) * u64::from(cpu.read(rt));
                let acc = hilo(cpu).wrapping_add(p);
                set_hilo(cpu, acc);
            }
            Insn::Msub { rs, rt } => {
                let p = i64::from(cpu.read(rs) as i32) * i64::from(cpu.read(rt) as i32);
                let acc = (hilo(cpu) as i64).wrapping_sub(p) as u64;
                set_hilo(cpu, acc);
            }
            Insn::Msubu { rs, rt } => {
                let p = u64::from(cpu.read(rs)) * u64::from(cpu.read(rt));
                let acc = hilo(cpu).wrapping_sub(p);
                set_hilo(cpu, acc);
            }
            Insn::Clo { rd, rs } => cpu.write(rd, cpu.read(rs).leading_ones()),
            Insn::Clz { rd, rs } => cpu.write(rd, cpu.read(rs).leading_zeros()),
            Insn::Mfhi { rd } => cpu.write(rd, cpu.hi),
            Insn::Mflo { rd } => cpu.write(rd, cpu.lo),
            Insn::Mthi { rs } => cpu.hi = cpu.read(rs),
            Insn::Mtlo { rs } => cpu.lo = cpu.read(rs),

            Insn::Jr { rs } => cpu.pc = cpu.read(rs),
            Insn::Jalr { rd, rs } => {
                let target = cpu.read(rs);
                cpu.write(rd, cpu.pc);
                cpu.pc = target;
            }
            Insn::J { target } => jump(cpu, target),
            Insn::Jal { target } => {
                cpu.write(reg::RA, cpu.pc);
                jump(cpu, target);
            }

            Insn::Teq { rs, rt } => trap_if(cpu.read(rs) == cpu.read(rt), TrapKind::Eq)?,
            Insn::Tne { rs, rt } => trap_if(cpu.read(rs) != cpu.read(rt), TrapKind::Ne)?,
            Insn::Tge { rs, rt } => {
                trap_if(cpu.read(rs) as i32 >= cpu.read(rt) as i32, TrapKind::Ge)?
            }
            Insn::Tgeu { rs, rt } => trap_if(cpu.read(rs) >= cpu.read(rt), TrapKind::GeU)?,
            Insn::Tlt { rs, rt } => {
                trap_if((cpu.read(rs) as i32) < cpu.read(rt) as i32, TrapKind::Lt)?
            }
            Insn::Tltu { rs, rt } => trap_if(cpu.read(rs) < cpu.read(rt), TrapKind::LtU)?,
            Insn::Teqi { rs, imm } => trap_if(cpu.read(rs) == sign_extend(imm), TrapKind::Eq)?,
            Insn::Tnei { rs, imm } => trap_if(cpu.read(rs) != sign_extend(imm), TrapKind::Ne)?,
            Insn::Tgei { rs, imm } => trap_if(
                cpu.read(rs) as i32 >= sign_extend(imm) as i32,
                TrapKind::Ge,
            )?,
            Insn::Tgeiu { rs, imm } => trap_if(cpu.read(rs) >= sign_extend(imm), TrapKind::GeU)?,
            Insn::Tlti { rs, imm } => trap_if(
                (cpu.read(rs) as i32) < sign_extend(imm) as i32,
                TrapKind::Lt,
            )?,
            Insn::Tltiu { rs, imm } => trap_if(cpu.read(rs) < sign_extend(imm), TrapKind::LtU)?,
            Insn::Syscall => return Err(Trap::Syscall),
            Insn::Break { code } => return Err(Trap::Break { code }),

            Insn::Beq { rs, rt, imm } => {
                let taken = cpu.read(rs) == cpu.read(rt);
                branch(cpu, taken, imm);
            }
            Insn::Bne { rs, rt, imm } => {
                let taken = cpu.read(rs) != cpu.read(rt);
                branch(cpu, taken, imm);
            }
            Insn::Blez { rs, imm } => {
                let taken = cpu.read(rs) as i32 <= 0;
                branch(cpu, taken, imm);
            }
            Insn::Bgtz { rs, imm } => {
                let taken = cpu.read(rs) as i32 > 0;
                branch(cpu, taken, imm);
            }
            Insn::Bltz { rs, imm } => {
                let taken = (cpu.read(rs) as i32) < 0;
                branch(cpu, taken, imm);
            }
            Insn::Bgez { rs, imm } => {
                let taken = cpu.read(rs) as i32 >= 0;
                branch(cpu, taken, imm);
            }
            // The link register is written whether or not the branch is taken.
            Insn::Bltzal { rs, imm } => {
                let taken = (cpu.read(rs) as i32) < 0;
                cpu.write(reg::RA, cpu.pc);
                branch(cpu, taken, imm);
            }
            Insn::Bgezal { rs, imm } => {
                let taken = cpu.read(rs) as i32 >= 0;
                cpu.write(reg::RA, cpu.pc);
                branch(cpu, taken, imm);
            }

            Insn::Addi { rt, rs, imm } => {
                let res = (cpu.read(rs) as i32)
                    .checked_add(sign_extend(imm) as i32)
                    .ok_or(Trap::Overflow)?;
                cpu.write(rt, res as u32);
            }
            Insn::Addiu { rt, rs, imm } => {
                cpu.write(rt, cpu.read(rs).wrapping_add(sign_extend(imm)))
            }
            Insn::Slti { rt, rs, imm } => {
                let v = (cpu.read(rs) as i32) < sign_extend(imm) as i32;
                cpu.write(rt, v as u32);
            }
            Insn::Sltiu { rt, rs, imm } => {
                cpu.write(rt, (cpu.read(rs) < sign_extend(imm)) as u32)
            }
            Insn::Andi { rt, rs, imm } => cpu.write(rt, cpu.read(rs) & zero_extend(imm)),
            Insn::Ori { rt, rs, imm } => cpu.write(rt, cpu.read(rs) | zero_extend(imm)),
            Insn::Xori { rt, rs, imm } => cpu.write(rt, cpu.read(rs) ^ zero_extend(imm)),
            Insn::Lui { rt, imm } => cpu.write(rt, zero_extend(imm) << 16),

            Insn::Lb { rt, rs, imm } => {
                let v = load(bus, ea(cpu, rs, imm), 1)?;
                cpu.write(rt, v as u8 as i8 as i32 as u32);
            }
            Insn::Lbu { rt, rs, imm } => {
                let v = load(bus, ea(cpu, rs, imm), 1)?;
                cpu.write(rt, v);
            }
            Insn::Lh { rt, rs, imm } => {
                let v = load(bus, ea(cpu, rs, imm), 2)?;
                cpu.write(rt, v as u16 as i16 as i32 as u32);
            }
            Insn::Lhu { rt, rs, imm } => {
                let v = load(bus, ea(cpu, rs, imm), 2)?;
                cpu.write(rt, v);
            }
            Insn::Lw { rt, rs, imm } | Insn::Ll { rt, rs, imm } => {
                let v = load(bus, ea(cpu, rs, imm), 4)?;
                cpu.write(rt, v);
            }
            Insn::Lwl { rt, rs, imm } => {
                let addr = ea(cpu, rs, imm);
                let word = load(bus, addr & !3, 4)?;
                cpu.write(rt, merge_left(cpu.read(rt), word, addr));
            }
            Insn::Lwr { rt, rs, imm } => {
                let addr = ea(cpu, rs, imm);
                let word = load(bus, addr & !3, 4)?;
                cpu.write(rt, merge_right(cpu.read(rt), word, addr));
            }
            Insn::Sb { rt, rs, imm } => store(bus, ea(cpu, rs, imm), 1, cpu.read(rt))?,
            Insn::Sh { rt, rs, imm } => store(bus, ea(cpu, rs, imm), 2, cpu.read(rt))?,
            Insn::Sw { rt, rs, imm } => store(bus, ea(cpu, rs, imm), 4, cpu.read(rt))?,
            // Single hart: the link is never broken, so sc always succeeds.
            Insn::Sc { rt, rs, imm } => {
                store(bus, ea(cpu, rs, imm), 4, cpu.read(rt))?;
                cpu.write(rt, 1);
            }
            Insn::Swl { rt, rs, imm } => {
                let addr = ea(cpu, rs, imm);
                let word = load(bus, addr & !3, 4)?;
                store(bus, addr & !3, 4, store_left(cpu.read(rt), word, addr))?;
            }
            Insn::Swr { rt, rs, imm } => {
                let addr = ea(cpu, rs, imm);
                let word = load(bus, addr & !3, 4)?;
                store(bus, addr & !3, 4, store_right(cpu.read(rt), word, addr))?;
            }
        }
        Ok(())
    }
}
