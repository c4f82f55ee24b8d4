use std::io::Cursor;

use mips_asm::{assemble_lines, assemble_source, AsmError};
use mips_rs::cpu::Trap;
use mips_rs::{Halt, Machine, MachineConfig, Program};
use pretty_assertions::assert_eq;

fn run(prog: &Program, input: &str) -> (Result<Halt, mips_rs::Fault>, String) {
    let mut m = Machine::new(
        MachineConfig {
            max_steps: Some(100_000),
            ..MachineConfig::default()
        },
        Cursor::new(input.as_bytes().to_vec()),
        Vec::new(),
    );
    m.load(prog).unwrap();
    let res = m.run();
    (res, String::from_utf8_lossy(m.output()).into_owned())
}

#[test]
fn prints_five() {
    let prog = assemble_lines(
        &[],
        &[
            "addi $t0 $zero 5",
            "addi $v0 $zero 1",
            "add $a0 $t0 $zero",
            "syscall",
        ],
    )
    .unwrap();
    let (res, out) = run(&prog, "");
    assert!(matches!(res, Ok(Halt::LeftText { .. })));
    assert_eq!(out, "5");
}

#[test]
fn beq_skips_three() {
    let prog = assemble_lines(
        &[],
        &[
            "beq $t0 $t0 label",
            "addi $t1 $t1 1",
            "addi $t1 $t1 1",
            "addi $t1 $t1 1",
            "label: addi $v0 $zero 1",
            "add $a0 $t1 $zero",
            "syscall",
        ],
    )
    .unwrap();
    let (_, out) = run(&prog, "");
    assert_eq!(out, "0");
}

#[test]
fn data_strings_pad() {
    let hi_z = assemble_lines(&[".asciiz \"hi\""], &[]).unwrap();
    assert_eq!(hi_z.data, vec![0x6869_0000]);
    let hi = assemble_lines(&[".ascii \"hi\""], &[]).unwrap();
    assert_eq!(hi.data, vec![0x6869_0000]);
    assert_eq!(
        hi_z.to_listing(),
        ".data\n01101000011010010000000000000000\n.text\n"
    );
}

const HELLO: &str = r#"
# greet the user
.data
greeting: .asciiz "Hello, "   # trailing comment
bang:     .asciiz "!\n"
.text
main:
    lui  $a0, 0x0050          # $a0 = &greeting
    addi $v0, $zero, 4
    syscall
    addi $v0, $zero, 5        # read_int
    syscall
    add  $a0, $v0, $zero
    addi $v0, $zero, 1
    syscall
    lui  $a0, 0x0050
    ori  $a0, $a0, 8          # &bang
    addi $v0, $zero, 4
    syscall
    addi $a0, $zero, 7
    addi $v0, $zero, 17
    syscall
"#;

#[test]
fn full_program_with_io() {
    let prog = assemble_source(HELLO).unwrap();
    assert_eq!(prog.data, vec![0x4865_6C6C, 0x6F2C_2000, 0x210A_0000]);
    assert_eq!(prog.text.len(), 15);
    let (res, out) = run(&prog, "42\n");
    assert_eq!(res.unwrap(), Halt::Exited(7));
    assert_eq!(out, "Hello, 42!\n");
}

const LOOP: &str = r#"
.text
        addi $t0, $zero, 0      # i
        addi $t1, $zero, 0      # sum
        addi $t2, $zero, 10
loop:   beq  $t0, $t2, done
        addi $t0, $t0, 1
        add  $t1, $t1, $t0
        j    loop
done:   add  $a0, $t1, $zero
        addi $v0, $zero, 1
        syscall
        addi $v0, $zero, 10
        syscall
"#;

#[test]
fn counting_loop() {
    let prog = assemble_source(LOOP).unwrap();
    let (res, out) = run(&prog, "");
    assert_eq!(res.unwrap(), Halt::Exited(0));
    assert_eq!(out, "55");
}

const CALL: &str = r#"
.text
main:   addi $a0, $zero, 6
        jal  square
        add  $a0, $v0, $zero
        addi $v0, $zero, 1
        syscall
        addi $v0, $zero, 10
        syscall
square: mul  $v0, $a0, $a0
        jr   $ra
"#;

#[test]
fn call_and_return() {
    let prog = assemble_source(CALL).unwrap();
    let (res, out) = run(&prog, "");
    assert_eq!(res.unwrap(), Halt::Exited(0));
    assert_eq!(out, "36");
}

const STACK: &str = r#"
.data
buf: .space 8
.text
        addi $sp, $sp, -8
        addi $t0, $zero, -3
        sw   $t0, 4($sp)
        lw   $a0, 4($sp)
        addi $sp, $sp, 8
        addi $v0, $zero, 1
        syscall
        lui  $t1, 0x0050
        addi $t2, $zero, 65
        sb   $t2, 3($t1)
        lbu  $a0, 3($t1)
        addi $v0, $zero, 11
        syscall
"#;

#[test]
fn stack_and_bytes() {
    let prog = assemble_source(STACK).unwrap();
    assert_eq!(prog.data, vec![0, 0]);
    let (res, out) = run(&prog, "");
    assert!(matches!(res, Ok(Halt::LeftText { .. })));
    assert_eq!(out, "-3A");
}

#[test]
fn overflow_is_reported() {
    let prog = assemble_source(
        "lui $t0, 0x7FFF\nori $t0, $t0, 0xFFFF\naddi $t0, $t0, 1\n",
    )
    .unwrap();
    let (res, _) = run(&prog, "");
    let fault = res.unwrap_err();
    assert!(matches!(fault.trap, Trap::Overflow));
    assert_eq!(fault.pc, 0x0040_0008);
}

#[test]
fn listing_round_trips() {
    let prog = assemble_source(LOOP).unwrap();
    assert_eq!(Program::parse_listing(&prog.to_listing()).unwrap(), prog);
}

#[test]
fn duplicate_labels_rejected() {
    let err = assemble_source("x: nop\nx: nop\n").unwrap_err();
    assert_eq!(
        err,
        AsmError::DuplicateLabel {
            line: 2,
            label: "x".into()
        }
    );
}
