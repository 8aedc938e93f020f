use crate::error::{Error, Result};

pub const MEM_SIZE: usize = 0x10000;

/// Flat 64KB address space. There is no banking and no I/O mapping: every
/// address is plain RAM.
pub struct Memory {
  data: Vec<u8>,
}

impl Memory {
  pub fn new() -> Memory {
    Memory {
      data: vec![0; MEM_SIZE],
    }
  }

  /// Build a memory with `image` copied in at address 0.
  pub fn with_image(image: &[u8]) -> Result<Memory> {
    let mut mem = Memory::new();
    mem.write(0, image)?;
    Ok(mem)
  }

  /// Read a byte at address `addr`.
  pub fn rb(&self, addr: usize) -> Result<u8> {
    self
      .data
      .get(addr)
      .copied()
      .ok_or(Error::AddressOutOfRange { addr })
  }

  /// Read a 2-byte little-endian word from `addr`.
  pub fn rw(&self, addr: usize) -> Result<u16> {
    let a = u16::from(self.rb(addr)?);
    let b = u16::from(self.rb(addr + 1)?);
    Ok((b << 8) | a)
  }

  /// Write `value` at address `addr`.
  pub fn wb(&mut self, addr: usize, value: u8) -> Result<()> {
    match self.data.get_mut(addr) {
      Some(cell) => {
        *cell = value;
        Ok(())
      }
      None => Err(Error::AddressOutOfRange { addr }),
    }
  }

  /// Write a 2-byte little-endian word to `addr`.
  /// Both bytes are checked before either is written.
  pub fn ww(&mut self, addr: usize, value: u16) -> Result<()> {
    if addr + 1 >= MEM_SIZE {
      return Err(Error::AddressOutOfRange { addr: addr + 1 });
    }
    self.wb(addr, (value & 0xff) as u8)?;
    self.wb(addr + 1, (value >> 8) as u8)
  }

  /// Write an arbitrary number of bytes to memory.
  pub fn write(&mut self, addr: usize, values: &[u8]) -> Result<()> {
    let end = addr
      .checked_add(values.len())
      .filter(|&end| end <= MEM_SIZE)
      .ok_or(Error::ImageTooLarge {
        offset: addr,
        len: values.len(),
      })?;
    self.data[addr..end].copy_from_slice(values);
    Ok(())
  }

  pub fn as_slice(&self) -> &[u8] {
    &self.data
  }
}

impl Default for Memory {
  fn default() -> Memory {
    Memory::new()
  }
}
