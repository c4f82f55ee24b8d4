use crate::decoder::Decoder;
use crate::exec::Executor;
use crate::memory::Bus;
use anyhow::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NUM_GPR: usize = 32;

/// Conventional register numbers.
pub mod reg {
    pub const ZERO: u8 = 0;
    pub const AT: u8 = 1;
    pub const V0: u8 = 2;
    pub const V1: u8 = 3;
    pub const A0: u8 = 4;
    pub const A1: u8 = 5;
    pub const A2: u8 = 6;
    pub const A3: u8 = 7;
    pub const T0: u8 = 8;
    pub const GP: u8 = 28;
    pub const SP: u8 = 29;
    pub const FP: u8 = 30;
    pub const RA: u8 = 31;
}

pub const REG_NAMES: [&str; NUM_GPR] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
    "fp", "ra",
];

/// Resolve `$t0`, `$8`, `$zero`, ... to a register number.
pub fn register_index(name: &str) -> Option<u8> {
    let name = name.strip_prefix('$')?;
    if let Ok(n) = name.parse::<u8>() {
        return (usize::from(n) < NUM_GPR).then_some(n);
    }
    if name == "s8" {
        return Some(reg::FP);
    }
    REG_NAMES.iter().position(|r| *r == name).map(|i| i as u8)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Discard writes to `$zero`.
    pub hardwired_zero: bool,
    pub initial_sp: u32,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            hardwired_zero: true,
            initial_sp: 0x00A0_0000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: u32,
    pub gpr: [u32; NUM_GPR],
    pub hi: u32,
    pub lo: u32,
    pub cfg: CpuConfig,
}

/// Condition that fired a trap instruction (`teq`, `tgei`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapKind {
    Eq,
    Ne,
    Ge,
    GeU,
    Lt,
    LtU,
}

impl fmt::Display for TrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrapKind::Eq => "equal",
            TrapKind::Ne => "not equal",
            TrapKind::Ge => "greater or equal",
            TrapKind::GeU => "greater or equal unsigned",
            TrapKind::Lt => "less than",
            TrapKind::LtU => "less than unsigned",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Trap {
    #[error("Illegal instruction {word:#010x}")]
    IllegalInstruction { word: u32 },
    #[error("Arithmetic overflow")]
    Overflow,
    #[error("Trap if {0}")]
    Trap(TrapKind),
    #[error("Breakpoint (code {code:#x})")]
    Break { code: u32 },
    /// Raised by `syscall`; the machine services it and resumes.
    #[error("System call")]
    Syscall,
    #[error("Unknown system call {code}")]
    UnknownSyscall { code: u32 },
    #[error("Unaligned access at {addr:#010x}")]
    Unaligned { addr: u32 },
    #[error("Bus error at {addr:#010x}: {source}")]
    Bus {
        addr: u32,
        #[source]
        source: Error,
    },
    #[error("Host I/O failed: {source}")]
    Host {
        #[source]
        source: Error,
    },
    #[error("Step limit of {limit} instructions reached")]
    StepLimit { limit: u64 },
}

impl Cpu {
    pub fn new(cfg: CpuConfig) -> Self {
        Self {
            pc: 0,
            gpr: [0; NUM_GPR],
            hi: 0,
            lo: 0,
            cfg,
        }
    }

    pub fn reset(&mut self, reset_pc: u32) {
        self.pc = reset_pc;
        self.gpr = [0; NUM_GPR];
        self.hi = 0;
        self.lo = 0;
        self.gpr[reg::SP as usize] = self.cfg.initial_sp;
    }

    #[inline]
    pub fn read(&self, r: u8) -> u32 {
        self.gpr[usize::from(r) & 0x1F]
    }

    #[inline]
    pub fn write(&mut self, r: u8, val: u32) {
        if r == reg::ZERO && self.cfg.hardwired_zero {
            return;
        }
        self.gpr[usize::from(r) & 0x1F] = val;
    }

    /// Fetch, decode and execute one instruction. `pc` is advanced by 4
    /// before the executor runs, so control transfers overwrite it.
    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<(), Trap> {
        let pc = self.pc;
        let raw32 = bus
            .read_u32(pc)
            .map_err(|source| Trap::Bus { addr: pc, source })?;
        let insn = dec
            .decode(raw32)
            .ok_or(Trap::IllegalInstruction { word: raw32 })?;
        tracing::trace!("{pc:#010x}: {}", crate::disasm::fmt_insn(&insn));
        self.pc = pc.wrapping_add(4);
        exec.exec(self, bus, insn)
    }
}
