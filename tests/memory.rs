use mips_rs::cpu::Trap;
use mips_rs::exec::IntExecutor;
use mips_rs::isa::mips32::Mips32Decoder;
use mips_rs::memory::TEXT_BASE;
use mips_rs::{Bus, Cpu, CpuConfig, MemoryLayout, VirtualMemory};

const T0: u32 = 8;
const T1: u32 = 9;
const DATA: u32 = 0x0050_0000;

fn enc_mem(op: u32, rt: u32, base: u32, off: i16) -> u32 {
    (op << 26) | (base << 21) | (rt << 16) | u32::from(off as u16)
}

fn setup(words: &[u32]) -> (Cpu, VirtualMemory) {
    let mut mem = VirtualMemory::new(MemoryLayout::default());
    mem.load_text(words).unwrap();
    let mut cpu = Cpu::new(CpuConfig::default());
    cpu.reset(TEXT_BASE);
    cpu.gpr[T1 as usize] = DATA;
    (cpu, mem)
}

fn step(cpu: &mut Cpu, mem: &mut VirtualMemory) -> Result<(), Trap> {
    cpu.step(mem, &Mips32Decoder::new(), &IntExecutor)
}

#[test]
fn memory_is_big_endian() {
    let mut mem = VirtualMemory::new(MemoryLayout::default());
    mem.write_u32(DATA, 0x1122_3344).unwrap();
    assert_eq!(mem.read_u8(DATA).unwrap(), 0x11);
    assert_eq!(mem.read_u16(DATA + 2).unwrap(), 0x3344);
}

#[test]
fn narrow_loads_extend() {
    let (mut cpu, mut mem) = setup(&[
        enc_mem(0x20, T0, T1, 1),
        enc_mem(0x24, T0, T1, 1),
        enc_mem(0x21, T0, T1, 2),
        enc_mem(0x25, T0, T1, 2),
    ]);
    mem.write_u32(DATA, 0x7F80_FFFE).unwrap();
    step(&mut cpu, &mut mem).unwrap();
    assert_eq!(cpu.gpr[T0 as usize], 0xFFFF_FF80);
    step(&mut cpu, &mut mem).unwrap();
    assert_eq!(cpu.gpr[T0 as usize], 0x80);
    step(&mut cpu, &mut mem).unwrap();
    assert_eq!(cpu.gpr[T0 as usize], 0xFFFF_FFFE);
    step(&mut cpu, &mut mem).unwrap();
    assert_eq!(cpu.gpr[T0 as usize], 0xFFFE);
}

#[test]
fn stores_then_loads() {
    let (mut cpu, mut mem) = setup(&[
        enc_mem(0x2B, T0, T1, 4),
        enc_mem(0x28, T0, T1, 8),
        enc_mem(0x29, T0, T1, 10),
        enc_mem(0x23, T0, T1, 4),
    ]);
    cpu.gpr[T0 as usize] = 0xCAFE_BABE;
    for _ in 0..3 {
        step(&mut cpu, &mut mem).unwrap();
    }
    assert_eq!(mem.read_u32(DATA + 4).unwrap(), 0xCAFE_BABE);
    assert_eq!(mem.read_u32(DATA + 8).unwrap(), 0xBE00_BABE);
    cpu.gpr[T0 as usize] = 0;
    step(&mut cpu, &mut mem).unwrap();
    assert_eq!(cpu.gpr[T0 as usize], 0xCAFE_BABE);
}

#[test]
fn unaligned_word_traps() {
    let (mut cpu, mut mem) = setup(&[enc_mem(0x23, T0, T1, 2), enc_mem(0x29, T0, T1, 1)]);
    assert!(matches!(
        step(&mut cpu, &mut mem),
        Err(Trap::Unaligned { addr }) if addr == DATA + 2
    ));
    assert!(matches!(
        step(&mut cpu, &mut mem),
        Err(Trap::Unaligned { addr }) if addr == DATA + 1
    ));
}

#[test]
fn out_of_range_is_a_bus_error() {
    let (mut cpu, mut mem) = setup(&[enc_mem(0x23, T0, 0, 0)]);
    assert!(matches!(
        step(&mut cpu, &mut mem),
        Err(Trap::Bus { addr: 0, .. })
    ));
}

#[test]
fn unaligned_load_pair_assembles_a_word() {
    // lwl $t0, 1($t1) ; lwr $t0, 4($t1) reads the word at DATA + 1
    let (mut cpu, mut mem) = setup(&[enc_mem(0x22, T0, T1, 1), enc_mem(0x26, T0, T1, 4)]);
    mem.write_bytes(DATA, &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]).unwrap();
    step(&mut cpu, &mut mem).unwrap();
    step(&mut cpu, &mut mem).unwrap();
    assert_eq!(cpu.gpr[T0 as usize], 0x1122_3344);
}

#[test]
fn unaligned_store_pair_writes_a_word() {
    // swl $t0, 1($t1) ; swr $t0, 4($t1)
    let (mut cpu, mut mem) = setup(&[enc_mem(0x2A, T0, T1, 1), enc_mem(0x2E, T0, T1, 4)]);
    cpu.gpr[T0 as usize] = 0xAABB_CCDD;
    step(&mut cpu, &mut mem).unwrap();
    step(&mut cpu, &mut mem).unwrap();
    assert_eq!(
        mem.read_bytes(DATA, 6).unwrap(),
        &[0x00, 0xAA, 0xBB, 0xCC, 0xDD, 0x00]
    );
}

#[test]
fn store_conditional_succeeds() {
    let (mut cpu, mut mem) = setup(&[enc_mem(0x30, T0, T1, 0), enc_mem(0x38, T0, T1, 4)]);
    mem.write_u32(DATA, 41).unwrap();
    step(&mut cpu, &mut mem).unwrap();
    assert_eq!(cpu.gpr[T0 as usize], 41);
    step(&mut cpu, &mut mem).unwrap();
    assert_eq!(mem.read_u32(DATA + 4).unwrap(), 41);
    assert_eq!(cpu.gpr[T0 as usize], 1);
}
