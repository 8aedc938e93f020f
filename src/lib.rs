pub mod cpu;
pub mod disasm;
mod error;
mod gameboy;
pub mod mem;

pub use crate::cpu::{Flags, Registers, CPU};
pub use crate::error::{Error, Result};
pub use crate::gameboy::{Exit, GameBoy};
pub use crate::mem::Memory;
