use log::{debug, log_enabled, trace, Level};

use crate::cpu::alu;
use crate::cpu::op::{Cond, Indirect, Op, Shift, Stack16, OPCODES, R16, R8};
use crate::cpu::reg::Registers;
use crate::cpu::CPU;
use crate::disasm;
use crate::error::{Error, Result};
use crate::mem::Memory;

/// Where PC goes once an instruction has run.
pub(super) enum Flow {
  /// Fall through past the instruction's encoded length.
  Next,
  Jump(u16),
}

impl CPU {
  pub fn new() -> CPU {
    CPU {
      regs: Registers::new(),
      halt: false,
    }
  }

  pub fn is_halted(&self) -> bool {
    self.halt
  }

  /// Run one instruction.
  /// Return the program counter of the next instruction.
  pub fn step(&mut self, mem: &mut Memory) -> Result<u16> {
    let pc = self.regs.pc;
    let opcode = mem.rb(usize::from(pc))?;
    let op = OPCODES[usize::from(opcode)];
    if log_enabled!(Level::Trace) {
      if let Ok(text) = disasm::disassemble(mem, pc) {
        trace!("{:04X}  {}", pc, text);
      }
    }

    self.regs.pc = match self.exec(mem, op)? {
      Flow::Next => pc.wrapping_add(op.len()),
      Flow::Jump(target) => target,
    };
    Ok(self.regs.pc)
  }

  /// Execute `op`, the instruction at PC.
  fn exec(&mut self, mem: &mut Memory, op: Op) -> Result<Flow> {
    let pc = self.regs.pc;

    macro_rules! imm8 {
      () => {
        mem.rb(usize::from(pc) + 1)?
      };
    }
    macro_rules! imm16 {
      () => {
        mem.rw(usize::from(pc) + 1)?
      };
    }
    macro_rules! flags {
      () => {
        &mut self.regs.flags
      };
    }

    match op {
      Op::Nop => (),
      Op::Stop => debug!("STOP at {:#06x}", pc),
      Op::Halt => {
        debug!("HALT at {:#06x}", pc);
        self.halt = true;
      }
      // No interrupt controller to talk to.
      Op::Di => debug!("DI at {:#06x}", pc),
      Op::Ei => debug!("EI at {:#06x}", pc),
      Op::Undefined(code) => {
        debug!("undefined opcode {:#04x} at {:#06x}, skipping", code, pc)
      }

      Op::LdR16Imm(r) => {
        let nn = imm16!();
        self.set_r16(r, nn);
      }
      Op::LdIndA(ind) => {
        let addr = self.indirect(ind);
        mem.wb(usize::from(addr), self.regs.a)?;
      }
      Op::LdAInd(ind) => {
        let addr = self.indirect(ind);
        self.regs.a = mem.rb(usize::from(addr))?;
      }
      Op::LdImmSp => {
        let nn = imm16!();
        mem.ww(usize::from(nn), self.regs.sp)?;
      }
      Op::IncR16(r) => {
        let n = self.r16(r).wrapping_add(1);
        self.set_r16(r, n);
      }
      Op::DecR16(r) => {
        let n = self.r16(r).wrapping_sub(1);
        self.set_r16(r, n);
      }
      Op::AddHl(r) => {
        let (hl, n) = (self.regs.hl(), self.r16(r));
        let result = alu::add_hl(flags!(), hl, n);
        self.regs.set_hl(result);
      }

      Op::IncR8(r) => {
        let n = self.read_r8(mem, r)?;
        let result = alu::inc(flags!(), n);
        self.write_r8(mem, r, result)?;
      }
      Op::DecR8(r) => {
        let n = self.read_r8(mem, r)?;
        let result = alu::dec(flags!(), n);
        self.write_r8(mem, r, result)?;
      }
      Op::LdR8Imm(r) => {
        let n = imm8!();
        self.write_r8(mem, r, n)?;
      }
      Op::LdR8R8(dst, src) => {
        let n = self.read_r8(mem, src)?;
        self.write_r8(mem, dst, n)?;
      }

      Op::Rlca => self.rotate_a(Shift::Rlc),
      Op::Rrca => self.rotate_a(Shift::Rrc),
      Op::Rla => self.rotate_a(Shift::Rl),
      Op::Rra => self.rotate_a(Shift::Rr),
      Op::Daa => self.regs.a = alu::daa(flags!(), self.regs.a),
      Op::Cpl => {
        self.regs.a = !self.regs.a;
        self.regs.flags.half_carry = true;
      }
      Op::Scf => {
        self.regs.flags.carry = true;
        self.regs.flags.half_carry = false;
      }
      Op::Ccf => {
        self.regs.flags.carry = !self.regs.flags.carry;
        self.regs.flags.half_carry = false;
      }

      Op::AluR8(kind, r) => {
        let n = self.read_r8(mem, r)?;
        self.regs.a = alu::alu(flags!(), kind, self.regs.a, n);
      }
      Op::AluImm(kind) => {
        let n = imm8!();
        self.regs.a = alu::alu(flags!(), kind, self.regs.a, n);
      }

      Op::Jr(cond) => {
        // Relative to the end of the instruction.
        let e = imm8!() as i8 as u16;
        if self.check(cond) {
          return Ok(Flow::Jump(pc.wrapping_add(2).wrapping_add(e)));
        }
      }
      Op::Jp(cond) => {
        let nn = imm16!();
        if self.check(cond) {
          return Ok(Flow::Jump(nn));
        }
      }
      Op::JpHl => return Ok(Flow::Jump(self.regs.hl())),
      Op::Call(cond) => {
        let nn = imm16!();
        if self.check(cond) {
          self.push(mem, pc.wrapping_add(op.len()))?;
          return Ok(Flow::Jump(nn));
        }
      }
      Op::Ret(cond) => {
        if self.check(cond) {
          return Ok(Flow::Jump(self.pop(mem)?));
        }
      }
      // No interrupt master enable to restore, so this is a plain RET.
      Op::Reti => return Ok(Flow::Jump(self.pop(mem)?)),
      Op::Rst(vector) => {
        self.push(mem, pc.wrapping_add(op.len()))?;
        return Ok(Flow::Jump(u16::from(vector)));
      }
      Op::Push(r) => {
        let n = self.stack16(r);
        self.push(mem, n)?;
      }
      Op::Pop(r) => {
        let n = self.pop(mem)?;
        self.set_stack16(r, n);
      }

      Op::Prefix => self.exec_cb(mem)?,

      Op::LdhImmA => {
        let n = imm8!();
        mem.wb(0xff00 + usize::from(n), self.regs.a)?;
      }
      Op::LdhAImm => {
        let n = imm8!();
        self.regs.a = mem.rb(0xff00 + usize::from(n))?;
      }
      Op::LdhCA => mem.wb(0xff00 + usize::from(self.regs.c), self.regs.a)?,
      Op::LdhAC => self.regs.a = mem.rb(0xff00 + usize::from(self.regs.c))?,
      Op::LdAbsA => {
        let nn = imm16!();
        mem.wb(usize::from(nn), self.regs.a)?;
      }
      Op::LdAAbs => {
        let nn = imm16!();
        self.regs.a = mem.rb(usize::from(nn))?;
      }
      Op::AddSpImm => {
        let e = imm8!();
        self.regs.sp = alu::add_sp(flags!(), self.regs.sp, e);
      }
      Op::LdHlSpImm => {
        let e = imm8!();
        let hl = alu::add_sp(flags!(), self.regs.sp, e);
        self.regs.set_hl(hl);
      }
      Op::LdSpHl => self.regs.sp = self.regs.hl(),
    }

    Ok(Flow::Next)
  }

  /// RLCA, RRCA, RLA, RRA: the CB rotate on A, except that Sign, Zero and
  /// Parity always end up cleared.
  fn rotate_a(&mut self, kind: Shift) {
    self.regs.a = alu::shift(&mut self.regs.flags, kind, self.regs.a);
    self.regs.flags.sign = false;
    self.regs.flags.zero = false;
    self.regs.flags.parity = false;
  }

  fn check(&self, cond: Option<Cond>) -> bool {
    let flags = &self.regs.flags;
    match cond {
      None => true,
      Some(Cond::NZ) => !flags.zero,
      Some(Cond::Z) => flags.zero,
      Some(Cond::NC) => !flags.carry,
      Some(Cond::C) => flags.carry,
    }
  }

  /// Address for `LD (rr), A` / `LD A, (rr)`, applying the HL post
  /// increment or decrement.
  fn indirect(&mut self, ind: Indirect) -> u16 {
    match ind {
      Indirect::BC => self.regs.bc(),
      Indirect::DE => self.regs.de(),
      Indirect::HLInc => {
        let hl = self.regs.hl();
        self.regs.hl_inc();
        hl
      }
      Indirect::HLDec => {
        let hl = self.regs.hl();
        self.regs.hl_dec();
        hl
      }
    }
  }

  pub(super) fn read_r8(&self, mem: &Memory, r: R8) -> Result<u8> {
    Ok(match r {
      R8::A => self.regs.a,
      R8::B => self.regs.b,
      R8::C => self.regs.c,
      R8::D => self.regs.d,
      R8::E => self.regs.e,
      R8::H => self.regs.h,
      R8::L => self.regs.l,
      R8::HLm => mem.rb(usize::from(self.regs.hl()))?,
    })
  }

  pub(super) fn write_r8(
    &mut self,
    mem: &mut Memory,
    r: R8,
    value: u8,
  ) -> Result<()> {
    match r {
      R8::A => self.regs.a = value,
      R8::B => self.regs.b = value,
      R8::C => self.regs.c = value,
      R8::D => self.regs.d = value,
      R8::E => self.regs.e = value,
      R8::H => self.regs.h = value,
      R8::L => self.regs.l = value,
      R8::HLm => mem.wb(usize::from(self.regs.hl()), value)?,
    }
    Ok(())
  }

  fn r16(&self, r: R16) -> u16 {
    match r {
      R16::BC => self.regs.bc(),
      R16::DE => self.regs.de(),
      R16::HL => self.regs.hl(),
      R16::SP => self.regs.sp,
    }
  }

  fn set_r16(&mut self, r: R16, value: u16) {
    match r {
      R16::BC => self.regs.set_bc(value),
      R16::DE => self.regs.set_de(value),
      R16::HL => self.regs.set_hl(value),
      R16::SP => self.regs.sp = value,
    }
  }

  fn stack16(&self, r: Stack16) -> u16 {
    match r {
      Stack16::BC => self.regs.bc(),
      Stack16::DE => self.regs.de(),
      Stack16::HL => self.regs.hl(),
      Stack16::AF => self.regs.af(),
    }
  }

  fn set_stack16(&mut self, r: Stack16, value: u16) {
    match r {
      Stack16::BC => self.regs.set_bc(value),
      Stack16::DE => self.regs.set_de(value),
      Stack16::HL => self.regs.set_hl(value),
      Stack16::AF => self.regs.set_af(value),
    }
  }

  /// Predecrement SP by 2, then store the low byte at SP and the high byte
  /// at SP+1.
  fn push(&mut self, mem: &mut Memory, value: u16) -> Result<()> {
    let sp = self
      .regs
      .sp
      .checked_sub(2)
      .ok_or(Error::StackOverflow { sp: self.regs.sp })?;
    mem.ww(usize::from(sp), value)?;
    self.regs.sp = sp;
    Ok(())
  }

  /// Inverse of `push`.
  fn pop(&mut self, mem: &Memory) -> Result<u16> {
    let value = mem.rw(usize::from(self.regs.sp))?;
    self.regs.sp = self.regs.sp.wrapping_add(2);
    Ok(value)
  }
}
