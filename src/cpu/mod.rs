mod alu;
mod cb;
#[allow(clippy::module_inception)]
mod cpu;
pub mod op;
pub mod reg;

pub use self::reg::{Flags, Registers};

#[derive(Debug, Default)]
pub struct CPU {
  pub regs: Registers,

  /// Set by HALT. The driver polls it between steps.
  halt: bool,
}

#[cfg(test)]
mod optest;
