use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, Read, Write};

use anyhow::anyhow;
use bitflags::bitflags;
use tracing::{debug, warn};

use crate::cpu::{reg, Cpu, Trap};
use crate::memory::VirtualMemory;

const EBADF: i32 = 9;

/// Service numbers understood by the bridge, selected by `$v0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    PrintInt,
    PrintString,
    ReadInt,
    ReadString,
    Sbrk,
    Exit,
    PrintChar,
    ReadChar,
    Open,
    Read,
    Write,
    Close,
    Exit2,
}

impl TryFrom<u32> for Syscall {
    type Error = Trap;

    fn try_from(code: u32) -> Result<Self, Trap> {
        Ok(match code {
            1 => Syscall::PrintInt,
            4 => Syscall::PrintString,
            5 => Syscall::ReadInt,
            8 => Syscall::ReadString,
            9 => Syscall::Sbrk,
            10 => Syscall::Exit,
            11 => Syscall::PrintChar,
            12 => Syscall::ReadChar,
            13 => Syscall::Open,
            14 => Syscall::Read,
            15 => Syscall::Write,
            16 => Syscall::Close,
            17 => Syscall::Exit2,
            _ => return Err(Trap::UnknownSyscall { code }),
        })
    }
}

bitflags! {
    /// `$a1` of the open call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const WRONLY = 0x1;
        const APPEND = 0x8;
    }
}

impl OpenFlags {
    /// Host open options. A nonzero `mode` sets the permission bits of a
    /// newly created file on Unix hosts; elsewhere it is ignored.
    fn options(self, mode: u32) -> OpenOptions {
        let mut opts = OpenOptions::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            if mode != 0 {
                opts.mode(mode);
            }
        }
        #[cfg(not(unix))]
        let _ = mode;
        if self.contains(OpenFlags::WRONLY) {
            opts.write(true).create(true);
            if self.contains(OpenFlags::APPEND) {
                opts.append(true);
            } else {
                opts.truncate(true);
            }
        } else {
            opts.read(true);
        }
        opts
    }
}

fn host(e: impl Into<anyhow::Error>) -> Trap {
    Trap::Host { source: e.into() }
}

fn errno(e: &io::Error) -> i32 {
    -e.raw_os_error().unwrap_or(1)
}

/// Bridges the program's system calls to the host. Fd 0 and 1 are the
/// configured input and output streams, fd 2 is the host stderr and
/// files opened by the program are numbered from 3.
pub struct SyscallBridge<I, O> {
    input: I,
    output: O,
    files: HashMap<u32, File>,
    next_fd: u32,
}

impl<I: BufRead, O: Write> SyscallBridge<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self {
            input,
            output,
            files: HashMap::new(),
            next_fd: 3,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    pub fn flush(&mut self) -> Result<(), Trap> {
        self.output.flush().map_err(host)
    }

    /// Service the call selected by `$v0`. Returns the exit code when the
    /// program asked to terminate.
    pub fn dispatch(&mut self, cpu: &mut Cpu, mem: &mut VirtualMemory) -> Result<Option<i32>, Trap> {
        let call = Syscall::try_from(cpu.read(reg::V0))?;
        let (a0, a1, a2) = (cpu.read(reg::A0), cpu.read(reg::A1), cpu.read(reg::A2));
        debug!(?call, a0, a1, a2, "syscall");

        match call {
            Syscall::PrintInt => write!(self.output, "{}", a0 as i32).map_err(host)?,
            Syscall::PrintString => {
                let s = mem
                    .read_cstring(a0)
                    .map_err(|source| Trap::Bus { addr: a0, source })?;
                self.output.write_all(&s).map_err(host)?;
            }
            Syscall::ReadInt => {
                let v = self.read_int()?;
                cpu.write(reg::V0, v as u32);
            }
            Syscall::ReadString => self.read_string(mem, a0, a1 as i32)?,
            Syscall::Sbrk => {
                if (a0 as i32) < 0 {
                    warn!(incr = a0 as i32, "negative sbrk ignored");
                }
                let prev = mem.sbrk(a0 as i32);
                if mem.dynamic_end > cpu.read(reg::SP) {
                    warn!(
                        "heap break {:#010x} grew past the stack pointer",
                        mem.dynamic_end
                    );
                }
                cpu.write(reg::V0, prev);
            }
            Syscall::Exit => return Ok(Some(0)),
            Syscall::PrintChar => self.output.write_all(&[a0 as u8]).map_err(host)?,
            Syscall::ReadChar => {
                let c = self.read_byte()?.map_or(-1, i32::from);
                cpu.write(reg::V0, c as u32);
            }
            Syscall::Open => {
                let v = self.open(mem, a0, a1, a2)?;
                cpu.write(reg::V0, v as u32);
            }
            Syscall::Read => {
                let v = self.read(mem, a0, a1, a2)?;
                cpu.write(reg::V0, v as u32);
            }
            Syscall::Write => {
                let v = self.write(mem, a0, a1, a2)?;
                cpu.write(reg::V0, v as u32);
            }
            Syscall::Close => {
                let v = self.close(a0);
                cpu.write(reg::V0, v as u32);
            }
            Syscall::Exit2 => return Ok(Some(a0 as i32)),
        }
        Ok(None)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, Trap> {
        let buf = self.input.fill_buf().map_err(host)?;
        let Some(&b) = buf.first() else {
            return Ok(None);
        };
        self.input.consume(1);
        Ok(Some(b))
    }

    /// Next whitespace-delimited token parsed as a decimal integer.
    fn read_int(&mut self) -> Result<i32, Trap> {
        let mut tok = Vec::new();
        while let Some(b) = self.read_byte()? {
            if b.is_ascii_whitespace() {
                if tok.is_empty() {
                    continue;
                }
                break;
            }
            tok.push(b);
        }
        let s = String::from_utf8_lossy(&tok);
        s.trim()
            .parse::<i32>()
            .map_err(|e| host(anyhow!("read_int: invalid integer {s:?}: {e}")))
    }

    /// Up to `len - 1` bytes, stopping after a newline, then a NUL.
    fn read_string(&mut self, mem: &mut VirtualMemory, addr: u32, len: i32) -> Result<(), Trap> {
        if len < 1 {
            return Ok(());
        }
        let mut buf = Vec::new();
        (&mut self.input)
            .take(len as u64 - 1)
            .read_until(b'\n', &mut buf)
            .map_err(host)?;
        buf.push(0);
        mem.write_bytes(addr, &buf)
            .map_err(|source| Trap::Bus { addr, source })
    }

    fn open(&mut self, mem: &VirtualMemory, name: u32, flags: u32, mode: u32) -> Result<i32, Trap> {
        let raw = mem
            .read_cstring(name)
            .map_err(|source| Trap::Bus { addr: name, source })?;
        let path = String::from_utf8_lossy(&raw).into_owned();
        let flags = OpenFlags::from_bits_truncate(flags);
        match flags.options(mode).open(&path) {
            Ok(f) => {
                let fd = self.next_fd;
                self.next_fd += 1;
                self.files.insert(fd, f);
                debug!(fd, %path, ?flags, "opened");
                Ok(fd as i32)
            }
            Err(e) => {
                debug!(%path, error = %e, "open failed");
                Ok(errno(&e))
            }
        }
    }

    fn read(&mut self, mem: &mut VirtualMemory, fd: u32, addr: u32, len: u32) -> Result<i32, Trap> {
        // The whole destination must be mapped before anything is read.
        mem.read_bytes(addr, len as usize)
            .map_err(|source| Trap::Bus { addr, source })?;
        let mut buf = vec![0u8; len as usize];
        let res = match fd {
            0 => self.input.read(&mut buf),
            _ => match self.files.get_mut(&fd) {
                Some(f) => f.read(&mut buf),
                None => return Ok(-EBADF),
            },
        };
        match res {
            Ok(n) => {
                mem.write_bytes(addr, &buf[..n])
                    .map_err(|source| Trap::Bus { addr, source })?;
                Ok(n as i32)
            }
            Err(e) => Ok(errno(&e)),
        }
    }

    fn write(&mut self, mem: &VirtualMemory, fd: u32, addr: u32, len: u32) -> Result<i32, Trap> {
        let bytes = mem
            .read_bytes(addr, len as usize)
            .map_err(|source| Trap::Bus { addr, source })?;
        let res = match fd {
            1 => return self.output.write_all(bytes).map(|_| len as i32).map_err(host),
            2 => io::stderr().write_all(bytes),
            _ => match self.files.get_mut(&fd) {
                Some(f) => f.write_all(bytes),
                None => return Ok(-EBADF),
            },
        };
        Ok(match res {
            Ok(()) => len as i32,
            Err(e) => errno(&e),
        })
    }

    fn close(&mut self, fd: u32) -> i32 {
        if fd < 3 {
            return 0;
        }
        match self.files.remove(&fd) {
            Some(_) => 0,
            None => -EBADF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_map_to_services() {
        assert_eq!(Syscall::try_from(1).unwrap(), Syscall::PrintInt);
        assert_eq!(Syscall::try_from(17).unwrap(), Syscall::Exit2);
        assert!(matches!(
            Syscall::try_from(2),
            Err(Trap::UnknownSyscall { code: 2 })
        ));
    }

    #[test]
    fn open_flag_bits() {
        assert_eq!(OpenFlags::from_bits_truncate(9), OpenFlags::WRONLY | OpenFlags::APPEND);
        assert!(OpenFlags::from_bits_truncate(0).is_empty());
    }
}
