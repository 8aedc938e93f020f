use std::fmt;

/// Bit positions of the flags when packed into the F byte (PUSH AF/POP AF).
pub const Z: u8 = 0x80;
pub const S: u8 = 0x40;
pub const H: u8 = 0x20;
pub const P: u8 = 0x04;
pub const C: u8 = 0x01;

/// Condition flags, kept as discrete booleans.
///
/// `parity` does not hold population parity: it is set when the low bit of
/// the tested value is clear, i.e. the value is even.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct Flags {
  pub zero: bool,
  pub carry: bool,
  pub sign: bool,
  pub half_carry: bool,
  pub parity: bool,
}

impl Flags {
  /// Recompute Sign, Zero and Parity from `value`.
  pub fn set_szp(&mut self, value: u8) {
    self.sign = value & 0x80 != 0;
    self.zero = value == 0;
    self.parity = is_even(value);
  }

  pub fn to_byte(self) -> u8 {
    let mut f = 0;
    if self.zero {
      f |= Z;
    }
    if self.sign {
      f |= S;
    }
    if self.half_carry {
      f |= H;
    }
    if self.parity {
      f |= P;
    }
    if self.carry {
      f |= C;
    }
    f
  }

  pub fn from_byte(f: u8) -> Flags {
    Flags {
      zero: f & Z != 0,
      sign: f & S != 0,
      half_carry: f & H != 0,
      parity: f & P != 0,
      carry: f & C != 0,
    }
  }
}

pub fn is_even(value: u8) -> bool {
  value & 0x01 == 0
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Registers {
  /// General-purpose registers.
  pub a: u8,
  pub b: u8,
  pub c: u8,
  pub d: u8,
  pub e: u8,
  pub h: u8,
  pub l: u8,

  pub flags: Flags,

  /// Program counter.
  pub pc: u16,

  /// Stack pointer.
  pub sp: u16,
}

impl Registers {
  pub fn new() -> Registers {
    Registers::default()
  }

  pub fn af(&self) -> u16 {
    (u16::from(self.a) << 8) | u16::from(self.flags.to_byte())
  }
  pub fn bc(&self) -> u16 {
    (u16::from(self.b) << 8) | u16::from(self.c)
  }
  pub fn de(&self) -> u16 {
    (u16::from(self.d) << 8) | u16::from(self.e)
  }
  pub fn hl(&self) -> u16 {
    (u16::from(self.h) << 8) | u16::from(self.l)
  }

  pub fn set_af(&mut self, value: u16) {
    self.a = (value >> 8) as u8;
    self.flags = Flags::from_byte(value as u8);
  }
  pub fn set_bc(&mut self, value: u16) {
    self.b = (value >> 8) as u8;
    self.c = value as u8;
  }
  pub fn set_de(&mut self, value: u16) {
    self.d = (value >> 8) as u8;
    self.e = value as u8;
  }
  pub fn set_hl(&mut self, value: u16) {
    self.h = (value >> 8) as u8;
    self.l = value as u8;
  }

  pub fn hl_inc(&mut self) {
    let hl = self.hl().wrapping_add(1);
    self.set_hl(hl);
  }
  pub fn hl_dec(&mut self) {
    let hl = self.hl().wrapping_sub(1);
    self.set_hl(hl);
  }
}

impl fmt::Display for Registers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "A  = 0x{:02X}   B  = 0x{:02X}   C  = 0x{:02X}   D  = 0x{:02X}",
      self.a, self.b, self.c, self.d
    )?;
    writeln!(
      f,
      "E  = 0x{:02X}   H  = 0x{:02X}   L  = 0x{:02X}   PC = 0x{:04X}",
      self.e, self.h, self.l, self.pc
    )?;
    writeln!(f, "SP = 0x{:04X}", self.sp)?;
    let bit = |b: bool| if b { 1 } else { 0 };
    write!(
      f,
      "Z = {}   S = {}   P = {}   H = {}   C = {}",
      bit(self.flags.zero),
      bit(self.flags.sign),
      bit(self.flags.parity),
      bit(self.flags.half_carry),
      bit(self.flags.carry),
    )
  }
}
