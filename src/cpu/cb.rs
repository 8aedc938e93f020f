use crate::cpu::alu;
use crate::cpu::op::{CbKind, CB_OPCODES};
use crate::cpu::CPU;
use crate::error::Result;
use crate::mem::Memory;

impl CPU {
  /// Execute the CB-prefixed instruction at PC. PC itself is advanced by the
  /// caller.
  pub(super) fn exec_cb(&mut self, mem: &mut Memory) -> Result<()> {
    let code = mem.rb(usize::from(self.regs.pc) + 1)?;
    let op = CB_OPCODES[usize::from(code)];
    let n = self.read_r8(mem, op.target)?;

    match op.kind {
      CbKind::Shift(kind) => {
        let result = alu::shift(&mut self.regs.flags, kind, n);
        self.write_r8(mem, op.target, result)?;
      }
      CbKind::Bit(b) => alu::bit(&mut self.regs.flags, n, b),
      CbKind::Res(b) => self.write_r8(mem, op.target, n & !(1 << b))?,
      CbKind::Set(b) => self.write_r8(mem, op.target, n | (1 << b))?,
    }
    Ok(())
  }
}
