use mips_rs::cpu::reg;
use mips_rs::exec::IntExecutor;
use mips_rs::isa::mips32::Mips32Decoder;
use mips_rs::memory::TEXT_BASE;
use mips_rs::{Cpu, CpuConfig, MemoryLayout, VirtualMemory};

const T0: u32 = 8;
const T1: u32 = 9;

fn enc_i(op: u32, rs: u32, rt: u32, imm: i16) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | u32::from(imm as u16)
}

fn enc_j(op: u32, addr: u32) -> u32 {
    (op << 26) | ((addr >> 2) & 0x03FF_FFFF)
}

fn enc_r(funct: u32, rs: u32, rt: u32, rd: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | funct
}

fn setup(words: &[u32]) -> (Cpu, VirtualMemory) {
    let mut mem = VirtualMemory::new(MemoryLayout::default());
    mem.load_text(words).unwrap();
    let mut cpu = Cpu::new(CpuConfig::default());
    cpu.reset(TEXT_BASE);
    (cpu, mem)
}

fn step(cpu: &mut Cpu, mem: &mut VirtualMemory) {
    cpu.step(mem, &Mips32Decoder::new(), &IntExecutor).unwrap();
}

#[test]
fn beq_skips_three_instructions() {
    // beq $t0, $t0, +3 ; three fillers ; target
    let (mut cpu, mut mem) = setup(&[enc_i(0x04, T0, T0, 3), 0, 0, 0, 0]);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE + 16);
}

#[test]
fn not_taken_falls_through() {
    let (mut cpu, mut mem) = setup(&[enc_i(0x05, T0, T0, 3)]);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE + 4);
}

#[test]
fn backward_branch() {
    let (mut cpu, mut mem) = setup(&[0, 0, enc_i(0x07, T0, 0, -3)]);
    cpu.gpr[T0 as usize] = 1;
    cpu.pc = TEXT_BASE + 8;
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE);
}

#[test]
fn sign_tests() {
    let (mut cpu, mut mem) = setup(&[
        enc_i(0x06, T0, 0, 1),    // blez taken
        0,
        enc_i(0x01, T0, 0x00, 1), // bltz not taken
        enc_i(0x01, T0, 0x01, 1), // bgez taken
        0,
    ]);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE + 8);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE + 12);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE + 20);
}

#[test]
fn branch_and_link_always_links() {
    let (mut cpu, mut mem) = setup(&[enc_i(0x01, T0, 0x10, 4)]);
    cpu.gpr[T0 as usize] = 5;
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE + 4);
    assert_eq!(cpu.read(reg::RA), TEXT_BASE + 4);
}

#[test]
fn bgezal_reads_rs_before_linking() {
    let (mut cpu, mut mem) = setup(&[enc_i(0x01, 31, 0x11, 2)]);
    cpu.gpr[31] = (-1i32) as u32;
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE + 4);
    assert_eq!(cpu.read(reg::RA), TEXT_BASE + 4);
}

#[test]
fn jump_and_link() {
    let (mut cpu, mut mem) = setup(&[enc_j(0x03, TEXT_BASE + 12), 0, 0, enc_r(0x08, 31, 0, 0)]);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE + 12);
    assert_eq!(cpu.read(reg::RA), TEXT_BASE + 4);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE + 4);
}

#[test]
fn jalr_links_into_rd() {
    let (mut cpu, mut mem) = setup(&[enc_r(0x09, T1, 0, T0)]);
    cpu.gpr[T1 as usize] = TEXT_BASE + 0x40;
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, TEXT_BASE + 0x40);
    assert_eq!(cpu.gpr[T0 as usize], TEXT_BASE + 4);
}

#[test]
fn jump_keeps_region_bits() {
    let (mut cpu, mut mem) = setup(&[enc_j(0x02, 0x0040_0100)]);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.pc, 0x0040_0100);
}
