pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod instructions;
pub mod loader;
pub mod machine;
pub mod memory;
pub mod syscall;

pub mod isa {
    pub mod mips32; // MIPS32 release 1 integer subset
}

pub use cpu::{Cpu, CpuConfig, Trap, TrapKind};
pub use loader::Program;
pub use machine::{Fault, Halt, Machine, MachineConfig};
pub use memory::{Bus, MemoryLayout, VirtualMemory};
