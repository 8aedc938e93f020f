use log::{debug, info};

use crate::cpu::CPU;
use crate::disasm;
use crate::error::Result;
use crate::mem::Memory;

/// Why `GameBoy::run` returned.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Exit {
  Halted,
  StepLimit,
}

pub struct GameBoy {
  cpu: CPU,
  mem: Memory,
  steps: u64,
}

impl GameBoy {
  pub fn new() -> GameBoy {
    GameBoy {
      cpu: CPU::new(),
      mem: Memory::new(),
      steps: 0,
    }
  }

  /// A machine with `rom` loaded at address 0.
  pub fn with_rom(rom: &[u8]) -> Result<GameBoy> {
    let mut gb = GameBoy::new();
    gb.load(rom, 0)?;
    Ok(gb)
  }

  /// Copy `bytes` into memory starting at `offset`.
  pub fn load(&mut self, bytes: &[u8], offset: usize) -> Result<()> {
    self.mem.write(offset, bytes)?;
    info!("loaded {} bytes at {:#06x}", bytes.len(), offset);
    Ok(())
  }

  /// Execute one instruction and return the new PC.
  pub fn step(&mut self) -> Result<u16> {
    let pc = self.cpu.step(&mut self.mem)?;
    self.steps += 1;
    Ok(pc)
  }

  pub fn is_halted(&self) -> bool {
    self.cpu.is_halted()
  }

  /// Step until HALT, or until `max_steps` more instructions have run.
  /// Without a limit an endless loop in the program never returns.
  pub fn run(&mut self, max_steps: Option<u64>) -> Result<Exit> {
    let mut ran = 0;
    while !self.cpu.is_halted() {
      if max_steps.map_or(false, |max| ran >= max) {
        info!("step limit reached at pc={:#06x}", self.cpu.regs.pc);
        return Ok(Exit::StepLimit);
      }
      self.step()?;
      ran += 1;
    }
    debug!("halted after {} steps", self.steps);
    Ok(Exit::Halted)
  }

  pub fn disassemble(&self, pc: u16) -> Result<String> {
    disasm::disassemble(&self.mem, pc)
  }

  pub fn cpu(&self) -> &CPU {
    &self.cpu
  }

  pub fn cpu_mut(&mut self) -> &mut CPU {
    &mut self.cpu
  }

  pub fn mem(&self) -> &Memory {
    &self.mem
  }

  pub fn mem_mut(&mut self) -> &mut Memory {
    &mut self.mem
  }

  /// Instructions executed so far.
  pub fn steps(&self) -> u64 {
    self.steps
  }
}

impl Default for GameBoy {
  fn default() -> GameBoy {
    GameBoy::new()
  }
}
