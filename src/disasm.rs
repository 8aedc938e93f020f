//! Disassembler for the base and CB tables.
//!
//! Text is produced from the same `Op` values the executor runs, so the
//! bytes consumed here always match how far `CPU::step` advances PC.

use crate::cpu::op::{Op, CB_OPCODES, OPCODES};
use crate::error::Result;
use crate::mem::{Memory, MEM_SIZE};

/// Encoded length of the instruction at `pc`.
pub fn instruction_len(mem: &Memory, pc: u16) -> Result<u16> {
  let opcode = mem.rb(usize::from(pc))?;
  Ok(OPCODES[usize::from(opcode)].len())
}

/// Disassemble the instruction at `pc`. Fails if its operand bytes run past
/// the end of memory.
pub fn disassemble(mem: &Memory, pc: u16) -> Result<String> {
  let len = instruction_len(mem, pc)?;
  let mut bytes = [0u8; 3];
  for (i, byte) in bytes.iter_mut().enumerate().take(usize::from(len)) {
    *byte = mem.rb(usize::from(pc) + i)?;
  }
  Ok(mnemonic(pc, bytes))
}

/// Render one instruction. `bytes` holds the opcode and up to two operand
/// bytes; bytes past the instruction's length are ignored.
pub fn mnemonic(pc: u16, bytes: [u8; 3]) -> String {
  let op = OPCODES[usize::from(bytes[0])];
  let n = bytes[1];
  let nn = u16::from_le_bytes([bytes[1], bytes[2]]);
  // JR targets are shown resolved.
  let rel = pc.wrapping_add(2).wrapping_add(n as i8 as u16);

  match op {
    Op::Nop => "NOP".to_string(),
    Op::Stop => "STOP".to_string(),
    Op::Halt => "HALT".to_string(),
    Op::Di => "DI".to_string(),
    Op::Ei => "EI".to_string(),
    Op::Undefined(code) => format!("DB 0x{:02X}", code),

    Op::LdR16Imm(r) => format!("LD {}, 0x{:04X}", r, nn),
    Op::LdIndA(ind) => format!("LD {}, A", ind),
    Op::LdAInd(ind) => format!("LD A, {}", ind),
    Op::LdImmSp => format!("LD (0x{:04X}), SP", nn),
    Op::IncR16(r) => format!("INC {}", r),
    Op::DecR16(r) => format!("DEC {}", r),
    Op::AddHl(r) => format!("ADD HL, {}", r),

    Op::IncR8(r) => format!("INC {}", r),
    Op::DecR8(r) => format!("DEC {}", r),
    Op::LdR8Imm(r) => format!("LD {}, 0x{:02X}", r, n),
    Op::LdR8R8(dst, src) => format!("LD {}, {}", dst, src),

    Op::Rlca => "RLCA".to_string(),
    Op::Rrca => "RRCA".to_string(),
    Op::Rla => "RLA".to_string(),
    Op::Rra => "RRA".to_string(),
    Op::Daa => "DAA".to_string(),
    Op::Cpl => "CPL".to_string(),
    Op::Scf => "SCF".to_string(),
    Op::Ccf => "CCF".to_string(),

    Op::AluR8(kind, r) => format!("{}{}", kind, r),
    Op::AluImm(kind) => format!("{}0x{:02X}", kind, n),

    Op::Jr(None) => format!("JR 0x{:04X}", rel),
    Op::Jr(Some(cond)) => format!("JR {}, 0x{:04X}", cond, rel),
    Op::Jp(None) => format!("JP 0x{:04X}", nn),
    Op::Jp(Some(cond)) => format!("JP {}, 0x{:04X}", cond, nn),
    Op::JpHl => "JP (HL)".to_string(),
    Op::Call(None) => format!("CALL 0x{:04X}", nn),
    Op::Call(Some(cond)) => format!("CALL {}, 0x{:04X}", cond, nn),
    Op::Ret(None) => "RET".to_string(),
    Op::Ret(Some(cond)) => format!("RET {}", cond),
    Op::Reti => "RETI".to_string(),
    Op::Rst(vector) => format!("RST 0x{:02X}", vector),
    Op::Pop(r) => format!("POP {}", r),
    Op::Push(r) => format!("PUSH {}", r),

    Op::Prefix => CB_OPCODES[usize::from(n)].to_string(),

    Op::LdhImmA => format!("LDH (0x{:02X}), A", n),
    Op::LdhAImm => format!("LDH A, (0x{:02X})", n),
    Op::LdhCA => "LD (C), A".to_string(),
    Op::LdhAC => "LD A, (C)".to_string(),
    Op::LdAbsA => format!("LD (0x{:04X}), A", nn),
    Op::LdAAbs => format!("LD A, (0x{:04X})", nn),
    Op::AddSpImm => format!("ADD SP, 0x{:02X}", n),
    Op::LdHlSpImm => format!("LD HL, SP+0x{:02X}", n),
    Op::LdSpHl => "LD SP, HL".to_string(),
  }
}

/// Up to `count` consecutive instructions starting at `start`. Stops early
/// at the end of memory or at an instruction that runs past it.
pub fn listing(mem: &Memory, start: u16, count: usize) -> Vec<(u16, String)> {
  let mut lines = Vec::with_capacity(count);
  let mut addr = usize::from(start);
  while lines.len() < count && addr < MEM_SIZE {
    let pc = addr as u16;
    let text = match disassemble(mem, pc) {
      Ok(text) => text,
      Err(_) => break,
    };
    lines.push((pc, text));
    addr += usize::from(OPCODES[usize::from(mem.as_slice()[addr])].len());
  }
  lines
}

/// Instructions around `pc`: up to `before` that precede it, `pc` itself,
/// then up to `after` that follow.
///
/// Preceding instructions are found by decoding forward from address 0, so
/// they line up with `pc` only when the code before it is contiguous.
pub fn window(
  mem: &Memory,
  pc: u16,
  before: usize,
  after: usize,
) -> Vec<(u16, String)> {
  let mut preceding = Vec::new();
  let mut addr = 0usize;
  while addr < usize::from(pc) {
    preceding.push(addr as u16);
    addr += usize::from(OPCODES[usize::from(mem.as_slice()[addr])].len());
  }
  let skip = preceding.len().saturating_sub(before);

  let mut lines: Vec<(u16, String)> = preceding[skip..]
    .iter()
    .filter_map(|&addr| disassemble(mem, addr).ok().map(|text| (addr, text)))
    .collect();
  lines.extend(listing(mem, pc, after + 1));
  lines
}
