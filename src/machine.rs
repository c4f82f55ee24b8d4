use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cpu::{Cpu, CpuConfig, Trap};
use crate::exec::IntExecutor;
use crate::isa::mips32::Mips32Decoder;
use crate::loader::Program;
use crate::memory::{MemoryLayout, VirtualMemory};
use crate::syscall::SyscallBridge;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub layout: MemoryLayout,
    pub cpu: CpuConfig,
    /// Stop with [`Trap::StepLimit`] after this many instructions.
    pub max_steps: Option<u64>,
}

impl MachineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// A runtime fault, with the address of the instruction that raised it.
#[derive(thiserror::Error, Debug)]
#[error("{trap} at pc {pc:#010x}")]
pub struct Fault {
    pub pc: u32,
    #[source]
    pub trap: Trap,
}

/// How a run ended without faulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// `exit` (code 0) or `exit2`.
    Exited(i32),
    /// `pc` walked off the end of the text segment.
    LeftText { pc: u32 },
}

impl Halt {
    pub fn exit_code(self) -> i32 {
        match self {
            Halt::Exited(code) => code,
            Halt::LeftText { .. } => 0,
        }
    }

    /// Process exit status, `None` when the code does not fit in a byte.
    pub fn status(self) -> Option<u8> {
        u8::try_from(self.exit_code()).ok()
    }
}

pub struct Machine<I, O> {
    pub cpu: Cpu,
    pub mem: VirtualMemory,
    sys: SyscallBridge<I, O>,
    dec: Mips32Decoder,
    exec: IntExecutor,
    steps: u64,
    max_steps: Option<u64>,
}

impl<I: BufRead, O: Write> Machine<I, O> {
    pub fn new(cfg: MachineConfig, input: I, output: O) -> Self {
        let mut cpu = Cpu::new(cfg.cpu);
        cpu.reset(cfg.layout.text_base());
        Self {
            cpu,
            mem: VirtualMemory::new(cfg.layout),
            sys: SyscallBridge::new(input, output),
            dec: Mips32Decoder::new(),
            exec: IntExecutor,
            steps: 0,
            max_steps: cfg.max_steps,
        }
    }

    /// Load a program into fresh memory and point `pc` at its first
    /// instruction.
    pub fn load(&mut self, prog: &Program) -> Result<()> {
        self.mem = VirtualMemory::new(self.mem.layout);
        prog.load_into(&mut self.mem)?;
        self.cpu.reset(self.mem.layout.text_base());
        self.steps = 0;
        Ok(())
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn output(&self) -> &O {
        self.sys.output()
    }

    pub fn into_output(self) -> O {
        self.sys.into_output()
    }

    /// Execute one instruction. `Ok(Some(_))` once the program has halted.
    pub fn step(&mut self) -> Result<Option<Halt>, Fault> {
        let pc = self.cpu.pc;
        if !self.mem.in_text(pc) {
            return Ok(Some(Halt::LeftText { pc }));
        }
        if let Some(limit) = self.max_steps {
            if self.steps >= limit {
                return Err(Fault {
                    pc,
                    trap: Trap::StepLimit { limit },
                });
            }
        }
        self.steps += 1;
        match self.cpu.step(&mut self.mem, &self.dec, &self.exec) {
            Ok(()) => Ok(None),
            Err(Trap::Syscall) => match self.sys.dispatch(&mut self.cpu, &mut self.mem) {
                Ok(Some(code)) => Ok(Some(Halt::Exited(code))),
                Ok(None) => Ok(None),
                Err(trap) => Err(Fault { pc, trap }),
            },
            Err(trap) => Err(Fault { pc, trap }),
        }
    }

    /// Run until the program exits, leaves the text segment or faults.
    /// The output stream is flushed in every case.
    pub fn run(&mut self) -> Result<Halt, Fault> {
        let res = loop {
            match self.step() {
                Ok(None) => {}
                Ok(Some(halt)) => break Ok(halt),
                Err(fault) => break Err(fault),
            }
        };
        debug!(steps = self.steps, ?res, "run finished");
        let flushed = self.sys.flush();
        match (res, flushed) {
            (Ok(_), Err(trap)) => Err(Fault {
                pc: self.cpu.pc,
                trap,
            }),
            (res, _) => res,
        }
    }
}
