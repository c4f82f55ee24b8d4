use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

pub const TEXT_BASE: u32 = 0x0040_0000;

pub trait Bus {
    fn read_u8(&mut self, addr: u32) -> Result<u8>;
    fn read_u16(&mut self, addr: u32) -> Result<u16>;
    fn read_u32(&mut self, addr: u32) -> Result<u32>;
    fn write_u8(&mut self, addr: u32, val: u8) -> Result<()>;
    fn write_u16(&mut self, addr: u32, val: u16) -> Result<()>;
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<()>;
}

/// Placement of the four regions inside the simulated address space.
///
/// ```text
/// base + size            <- initial $sp, stack grows down
///   ...
/// dynamic_end            <- moved up by sbrk
/// static_end             <- end of .data
/// base + static_offset   <- .data
/// text_end
/// base                   <- .text
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryLayout {
    pub base: u32,
    pub size: u32,
    pub static_offset: u32,
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self {
            base: TEXT_BASE,
            size: 6 * 1024 * 1024,
            static_offset: 1024 * 1024,
        }
    }
}

impl MemoryLayout {
    pub fn text_base(&self) -> u32 {
        self.base
    }

    pub fn static_base(&self) -> u32 {
        self.base.wrapping_add(self.static_offset)
    }

    pub fn stack_top(&self) -> u32 {
        self.base.wrapping_add(self.size)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct VirtualMemory {
    pub mem: Vec<u8>,
    pub layout: MemoryLayout,
    pub text_end: u32,
    pub static_end: u32,
    pub dynamic_end: u32,
}

impl VirtualMemory {
    pub fn new(layout: MemoryLayout) -> Self {
        let static_base = layout.static_base();
        Self {
            mem: vec![0; layout.size as usize],
            layout,
            text_end: layout.text_base(),
            static_end: static_base,
            dynamic_end: static_base,
        }
    }

    /// Translate a simulated address into an index, checking that
    /// `len` bytes starting there are backed.
    fn translate(&self, addr: u32, len: usize) -> Result<usize> {
        let Some(off) = addr.checked_sub(self.layout.base) else {
            bail!("address {addr:#010x} below simulated memory");
        };
        let off = off as usize;
        match off.checked_add(len) {
            Some(end) if end <= self.mem.len() => Ok(off),
            _ => bail!("address {addr:#010x} beyond simulated memory"),
        }
    }

    /// Whether `pc` lies inside the loaded text region.
    pub fn in_text(&self, pc: u32) -> bool {
        pc >= self.layout.text_base() && pc < self.text_end
    }

    /// Place instruction words at the text base. Loaded once per run.
    pub fn load_text(&mut self, words: &[u32]) -> Result<()> {
        let len = words.len() * 4;
        ensure!(
            len <= self.layout.static_offset as usize,
            "text segment of {len} bytes overlaps static data"
        );
        let base = self.layout.text_base();
        self.store_words(base, words)?;
        self.text_end = base.wrapping_add(len as u32);
        Ok(())
    }

    /// Place data words at the static base; the heap starts right after.
    pub fn load_static(&mut self, words: &[u32]) -> Result<()> {
        let base = self.layout.static_base();
        self.store_words(base, words)?;
        self.static_end = base.wrapping_add((words.len() * 4) as u32);
        self.dynamic_end = self.static_end;
        Ok(())
    }

    fn store_words(&mut self, base: u32, words: &[u32]) -> Result<()> {
        let off = self.translate(base, words.len() * 4)?;
        for (i, w) in words.iter().enumerate() {
            self.mem[off + i * 4..off + i * 4 + 4].copy_from_slice(&w.to_be_bytes());
        }
        Ok(())
    }

    /// Grow the heap by `incr` bytes, returning the previous break. The
    /// break never moves down: a negative increment leaves it in place.
    pub fn sbrk(&mut self, incr: i32) -> u32 {
        let prev = self.dynamic_end;
        self.dynamic_end = prev.saturating_add(incr.max(0) as u32);
        prev
    }

    pub fn read_bytes(&self, addr: u32, len: usize) -> Result<&[u8]> {
        let off = self.translate(addr, len)?;
        Ok(&self.mem[off..off + len])
    }

    pub fn write_bytes(&mut self, addr: u32, bytes: &[u8]) -> Result<()> {
        let off = self.translate(addr, bytes.len())?;
        self.mem[off..off + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Bytes from `addr` up to (not including) the first NUL.
    pub fn read_cstring(&self, addr: u32) -> Result<Vec<u8>> {
        let off = self.translate(addr, 0)?;
        match self.mem[off..].iter().position(|b| *b == 0) {
            Some(n) => Ok(self.mem[off..off + n].to_vec()),
            None => bail!("unterminated string at {addr:#010x}"),
        }
    }
}

impl Bus for VirtualMemory {
    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        let off = self.translate(addr, 1)?;
        Ok(self.mem[off])
    }
    fn read_u16(&mut self, addr: u32) -> Result<u16> {
        let off = self.translate(addr, 2)?;
        Ok(u16::from_be_bytes([self.mem[off], self.mem[off + 1]]))
    }
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        let off = self.translate(addr, 4)?;
        Ok(u32::from_be_bytes([
            self.mem[off],
            self.mem[off + 1],
            self.mem[off + 2],
            self.mem[off + 3],
        ]))
    }
    fn write_u8(&mut self, addr: u32, val: u8) -> Result<()> {
        let off = self.translate(addr, 1)?;
        self.mem[off] = val;
        Ok(())
    }
    fn write_u16(&mut self, addr: u32, val: u16) -> Result<()> {
        let off = self.translate(addr, 2)?;
        self.mem[off..off + 2].copy_from_slice(&val.to_be_bytes());
        Ok(())
    }
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<()> {
        let off = self.translate(addr, 4)?;
        self.mem[off..off + 4].copy_from_slice(&val.to_be_bytes());
        Ok(())
    }
}
