use std::io::{empty, BufReader, Empty};

use mips_rs::cpu::{reg, Trap};
use mips_rs::{Halt, Machine, MachineConfig, Program};

fn li(rt: u8, imm: i16) -> u32 {
    (0x09 << 26) | (u32::from(rt) << 16) | u32::from(imm as u16)
}

fn machine(cfg: MachineConfig, text: Vec<u32>) -> Machine<BufReader<Empty>, Vec<u8>> {
    let mut m = Machine::new(cfg, BufReader::new(empty()), Vec::new());
    m.load(&Program { data: vec![], text }).unwrap();
    m
}

#[test]
fn runs_until_pc_leaves_text() {
    let mut m = machine(MachineConfig::default(), vec![li(8, 1), li(9, 2)]);
    assert_eq!(m.run().unwrap(), Halt::LeftText { pc: 0x0040_0008 });
    assert_eq!(m.steps(), 2);
    assert_eq!(m.cpu.read(9), 2);
}

#[test]
fn initial_state() {
    let m = machine(MachineConfig::default(), vec![0]);
    assert_eq!(m.cpu.pc, 0x0040_0000);
    assert_eq!(m.cpu.read(reg::SP), 0x00A0_0000);
    assert_eq!(m.mem.dynamic_end, 0x0050_0000);
}

#[test]
fn step_limit_stops_infinite_loops() {
    // beq $zero, $zero, -1
    let looping = (0x04 << 26) | 0xFFFF;
    let cfg = MachineConfig {
        max_steps: Some(100),
        ..MachineConfig::default()
    };
    let mut m = machine(cfg, vec![looping]);
    let fault = m.run().unwrap_err();
    assert!(matches!(fault.trap, Trap::StepLimit { limit: 100 }));
    assert_eq!(m.steps(), 100);
}

#[test]
fn break_reports_its_pc() {
    let brk = (3 << 6) | 0x0D;
    let mut m = machine(MachineConfig::default(), vec![0, brk]);
    let fault = m.run().unwrap_err();
    assert_eq!(fault.pc, 0x0040_0004);
    assert!(matches!(fault.trap, Trap::Break { code: 3 }));
    assert_eq!(fault.to_string(), "Breakpoint (code 0x3) at pc 0x00400004");
}

#[test]
fn overflow_halts_the_run() {
    let lui = (0x0F << 26) | (8 << 16) | 0x7FFF;
    let ori = (0x0D << 26) | (8 << 21) | (8 << 16) | 0xFFFF;
    let addi = (0x08 << 26) | (8 << 21) | (8 << 16) | 1;
    let mut m = machine(MachineConfig::default(), vec![lui, ori, addi, li(9, 1)]);
    let fault = m.run().unwrap_err();
    assert!(matches!(fault.trap, Trap::Overflow));
    assert_eq!(fault.pc, 0x0040_0008);
    assert_eq!(m.cpu.read(9), 0);
}

#[test]
fn config_from_json_uses_defaults() {
    let cfg: MachineConfig =
        serde_json::from_str(r#"{ "max_steps": 5, "cpu": { "hardwired_zero": false } }"#).unwrap();
    assert_eq!(cfg.max_steps, Some(5));
    assert!(!cfg.cpu.hardwired_zero);
    assert_eq!(cfg.cpu.initial_sp, 0x00A0_0000);
    assert_eq!(cfg.layout.base, 0x0040_0000);
}

#[test]
fn exit_status_fits_a_byte() {
    assert_eq!(Halt::Exited(3).status(), Some(3));
    assert_eq!(Halt::LeftText { pc: 0x0040_0008 }.status(), Some(0));
    assert_eq!(Halt::Exited(255).status(), Some(255));
    assert_eq!(Halt::Exited(256).status(), None);
    assert_eq!(Halt::Exited(-1).status(), None);
}
