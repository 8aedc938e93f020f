//! Arithmetic and logic with their flag side effects.
//!
//! Each helper takes the operands and the flag set, updates exactly the
//! flags its instruction class defines, and returns the result. Nothing
//! here touches registers or memory.

use crate::cpu::op::{Alu, Shift};
use crate::cpu::reg::{is_even, Flags};

/// Apply an accumulator ALU operation. Returns the new value of A
/// (unchanged for CP).
pub fn alu(flags: &mut Flags, op: Alu, a: u8, n: u8) -> u8 {
  match op {
    Alu::Add => add(flags, a, n, false),
    Alu::Adc => {
      let c = flags.carry;
      add(flags, a, n, c)
    }
    Alu::Sub => sub(flags, a, n, false),
    Alu::Sbc => {
      let c = flags.carry;
      sub(flags, a, n, c)
    }
    Alu::And => and(flags, a, n),
    Alu::Xor => xor(flags, a, n),
    Alu::Or => or(flags, a, n),
    Alu::Cp => {
      sub(flags, a, n, false);
      a
    }
  }
}

pub fn add(flags: &mut Flags, a: u8, n: u8, carry: bool) -> u8 {
  let c = u8::from(carry);
  let result = a.wrapping_add(n).wrapping_add(c);
  flags.half_carry = (a & 0xf) + (n & 0xf) + c > 0xf;
  flags.carry = u16::from(a) + u16::from(n) + u16::from(c) > 0xff;
  flags.set_szp(result);
  result
}

pub fn sub(flags: &mut Flags, a: u8, n: u8, borrow: bool) -> u8 {
  let c = u8::from(borrow);
  let result = a.wrapping_sub(n).wrapping_sub(c);
  flags.half_carry = (a & 0xf) < (n & 0xf) + c;
  flags.carry = u16::from(a) < u16::from(n) + u16::from(c);
  flags.set_szp(result);
  result
}

pub fn and(flags: &mut Flags, a: u8, n: u8) -> u8 {
  let result = a & n;
  flags.half_carry = true;
  flags.carry = false;
  flags.set_szp(result);
  result
}

pub fn or(flags: &mut Flags, a: u8, n: u8) -> u8 {
  let result = a | n;
  flags.half_carry = false;
  flags.carry = false;
  flags.set_szp(result);
  result
}

pub fn xor(flags: &mut Flags, a: u8, n: u8) -> u8 {
  let result = a ^ n;
  flags.half_carry = false;
  flags.carry = false;
  flags.set_szp(result);
  result
}

/// 8-bit increment. Carry is preserved.
pub fn inc(flags: &mut Flags, n: u8) -> u8 {
  let result = n.wrapping_add(1);
  flags.half_carry = result & 0xf == 0;
  flags.set_szp(result);
  result
}

/// 8-bit decrement. Carry is preserved.
pub fn dec(flags: &mut Flags, n: u8) -> u8 {
  let result = n.wrapping_sub(1);
  flags.half_carry = result & 0xf == 0xf;
  flags.set_szp(result);
  result
}

/// ADD HL, rr.
pub fn add_hl(flags: &mut Flags, hl: u16, n: u16) -> u16 {
  let result = hl.wrapping_add(n);
  flags.sign = false;
  flags.zero = false;
  flags.half_carry = (hl & 0xfff) + (n & 0xfff) > 0xfff;
  flags.carry = u32::from(hl) + u32::from(n) > 0xffff;
  flags.parity = is_even((result >> 8) as u8);
  result
}

/// SP plus a signed immediate, shared by ADD SP, e and LD HL, SP+e.
/// Half-carry and carry come from the unsigned low-byte addition.
pub fn add_sp(flags: &mut Flags, sp: u16, e: u8) -> u16 {
  let result = sp.wrapping_add(e as i8 as u16);
  flags.sign = false;
  flags.zero = false;
  flags.half_carry = (sp & 0xf) + u16::from(e & 0xf) > 0xf;
  flags.carry = (sp & 0xff) + u16::from(e) > 0xff;
  flags.parity = is_even((result >> 8) as u8);
  result
}

pub fn daa(flags: &mut Flags, a: u8) -> u8 {
  let mut a = u16::from(a);
  if (a & 0xf) > 9 || flags.half_carry {
    a += 0x06;
  }
  if a > 0x9f || flags.carry {
    a += 0x60;
    flags.carry = true;
  } else {
    flags.carry = false;
  }
  let result = a as u8;
  flags.half_carry = false;
  flags.set_szp(result);
  result
}

/// CB-table rotates, shifts and SWAP.
pub fn shift(flags: &mut Flags, op: Shift, n: u8) -> u8 {
  let carry_in = flags.carry;
  let (result, carry) = match op {
    Shift::Rlc => (n.rotate_left(1), n & 0x80 != 0),
    Shift::Rrc => (n.rotate_right(1), n & 0x01 != 0),
    Shift::Rl => ((n << 1) | u8::from(carry_in), n & 0x80 != 0),
    Shift::Rr => ((n >> 1) | (u8::from(carry_in) << 7), n & 0x01 != 0),
    Shift::Sla => (n << 1, n & 0x80 != 0),
    // Sign extend.
    Shift::Sra => (((n as i8) >> 1) as u8, n & 0x01 != 0),
    Shift::Swap => ((n << 4) | (n >> 4), false),
    Shift::Srl => (n >> 1, n & 0x01 != 0),
  };
  flags.carry = carry;
  flags.half_carry = false;
  flags.set_szp(result);
  result
}

/// BIT b, n. Only flags change.
pub fn bit(flags: &mut Flags, n: u8, b: u8) {
  let masked = n & (1 << b);
  flags.zero = masked == 0;
  flags.sign = masked & 0x80 != 0;
  flags.parity = is_even(masked);
  flags.half_carry = true;
}
