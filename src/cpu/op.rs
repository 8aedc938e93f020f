//! Opcode decoding.
//!
//! Every opcode byte maps to one `Op` through `OPCODES`, and every byte
//! following a 0xCB prefix maps to one `CbOp` through `CB_OPCODES`. Both
//! tables are built at compile time and are total. Instruction lengths come
//! from `Op::len`, which the executor and the disassembler both use.

use std::fmt;

/// 8-bit operand, in the order the opcode encodes it (`(HL)` is index 6).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum R8 {
  B,
  C,
  D,
  E,
  H,
  L,
  HLm,
  A,
}

impl R8 {
  const fn from_index(i: u8) -> R8 {
    match i & 7 {
      0 => R8::B,
      1 => R8::C,
      2 => R8::D,
      3 => R8::E,
      4 => R8::H,
      5 => R8::L,
      6 => R8::HLm,
      _ => R8::A,
    }
  }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum R16 {
  BC,
  DE,
  HL,
  SP,
}

impl R16 {
  const fn from_index(i: u8) -> R16 {
    match i & 3 {
      0 => R16::BC,
      1 => R16::DE,
      2 => R16::HL,
      _ => R16::SP,
    }
  }
}

/// Register pairs as PUSH and POP see them.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Stack16 {
  BC,
  DE,
  HL,
  AF,
}

impl Stack16 {
  const fn from_index(i: u8) -> Stack16 {
    match i & 3 {
      0 => Stack16::BC,
      1 => Stack16::DE,
      2 => Stack16::HL,
      _ => Stack16::AF,
    }
  }
}

/// Memory operands of `LD (rr), A` and `LD A, (rr)`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Indirect {
  BC,
  DE,
  HLInc,
  HLDec,
}

impl Indirect {
  const fn from_index(i: u8) -> Indirect {
    match i & 3 {
      0 => Indirect::BC,
      1 => Indirect::DE,
      2 => Indirect::HLInc,
      _ => Indirect::HLDec,
    }
  }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Cond {
  NZ,
  Z,
  NC,
  C,
}

impl Cond {
  const fn from_index(i: u8) -> Cond {
    match i & 3 {
      0 => Cond::NZ,
      1 => Cond::Z,
      2 => Cond::NC,
      _ => Cond::C,
    }
  }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Alu {
  Add,
  Adc,
  Sub,
  Sbc,
  And,
  Xor,
  Or,
  Cp,
}

impl Alu {
  const fn from_index(i: u8) -> Alu {
    match i & 7 {
      0 => Alu::Add,
      1 => Alu::Adc,
      2 => Alu::Sub,
      3 => Alu::Sbc,
      4 => Alu::And,
      5 => Alu::Xor,
      6 => Alu::Or,
      _ => Alu::Cp,
    }
  }
}

/// Rotates and shifts of the CB table (rows 0x00-0x3f).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Shift {
  Rlc,
  Rrc,
  Rl,
  Rr,
  Sla,
  Sra,
  Swap,
  Srl,
}

impl Shift {
  const fn from_index(i: u8) -> Shift {
    match i & 7 {
      0 => Shift::Rlc,
      1 => Shift::Rrc,
      2 => Shift::Rl,
      3 => Shift::Rr,
      4 => Shift::Sla,
      5 => Shift::Sra,
      6 => Shift::Swap,
      _ => Shift::Srl,
    }
  }
}

/// A base-table instruction. `None` conditions are the unconditional forms.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Op {
  Nop,
  Stop,
  Halt,
  Di,
  Ei,
  /// One of the eleven opcodes the LR35902 leaves undefined. Runs as a
  /// one-byte no-op.
  Undefined(u8),

  LdR16Imm(R16),
  LdIndA(Indirect),
  LdAInd(Indirect),
  LdImmSp,
  IncR16(R16),
  DecR16(R16),
  AddHl(R16),

  IncR8(R8),
  DecR8(R8),
  LdR8Imm(R8),
  LdR8R8(R8, R8),

  Rlca,
  Rrca,
  Rla,
  Rra,
  Daa,
  Cpl,
  Scf,
  Ccf,

  AluR8(Alu, R8),
  AluImm(Alu),

  Jr(Option<Cond>),
  Jp(Option<Cond>),
  JpHl,
  Call(Option<Cond>),
  Ret(Option<Cond>),
  Reti,
  Rst(u8),
  Pop(Stack16),
  Push(Stack16),

  /// 0xCB: the next byte selects a `CbOp`.
  Prefix,

  LdhImmA,
  LdhAImm,
  LdhCA,
  LdhAC,
  LdAbsA,
  LdAAbs,
  AddSpImm,
  LdHlSpImm,
  LdSpHl,
}

impl Op {
  /// Encoded length in bytes, opcode included.
  pub const fn len(self) -> u16 {
    match self {
      Op::LdR16Imm(_)
      | Op::LdImmSp
      | Op::Jp(_)
      | Op::Call(_)
      | Op::LdAbsA
      | Op::LdAAbs => 3,
      Op::LdR8Imm(_)
      | Op::AluImm(_)
      | Op::Jr(_)
      | Op::Stop
      | Op::Prefix
      | Op::LdhImmA
      | Op::LdhAImm
      | Op::AddSpImm
      | Op::LdHlSpImm => 2,
      _ => 1,
    }
  }

  /// True for instructions that may set PC to something other than the
  /// next instruction.
  pub const fn is_branch(self) -> bool {
    matches!(
      self,
      Op::Jr(_)
        | Op::Jp(_)
        | Op::JpHl
        | Op::Call(_)
        | Op::Ret(_)
        | Op::Reti
        | Op::Rst(_)
    )
  }
}

/// The operation half of a CB-prefixed instruction.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CbKind {
  Shift(Shift),
  Bit(u8),
  Res(u8),
  Set(u8),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CbOp {
  pub kind: CbKind,
  pub target: R8,
}

/// Every CB-prefixed instruction is the prefix plus one byte.
pub const CB_LEN: u16 = 2;

const fn decode(op: u8) -> Op {
  let x = op >> 6;
  let y = (op >> 3) & 7;
  let z = op & 7;
  let p = y >> 1;
  let q = y & 1;

  match x {
    0 => match z {
      0 => match y {
        0 => Op::Nop,
        1 => Op::LdImmSp,
        2 => Op::Stop,
        3 => Op::Jr(None),
        _ => Op::Jr(Some(Cond::from_index(y - 4))),
      },
      1 if q == 0 => Op::LdR16Imm(R16::from_index(p)),
      1 => Op::AddHl(R16::from_index(p)),
      2 if q == 0 => Op::LdIndA(Indirect::from_index(p)),
      2 => Op::LdAInd(Indirect::from_index(p)),
      3 if q == 0 => Op::IncR16(R16::from_index(p)),
      3 => Op::DecR16(R16::from_index(p)),
      4 => Op::IncR8(R8::from_index(y)),
      5 => Op::DecR8(R8::from_index(y)),
      6 => Op::LdR8Imm(R8::from_index(y)),
      _ => match y {
        0 => Op::Rlca,
        1 => Op::Rrca,
        2 => Op::Rla,
        3 => Op::Rra,
        4 => Op::Daa,
        5 => Op::Cpl,
        6 => Op::Scf,
        _ => Op::Ccf,
      },
    },
    1 if op == 0x76 => Op::Halt,
    1 => Op::LdR8R8(R8::from_index(y), R8::from_index(z)),
    2 => Op::AluR8(Alu::from_index(y), R8::from_index(z)),
    _ => match z {
      0 => match y {
        0..=3 => Op::Ret(Some(Cond::from_index(y))),
        4 => Op::LdhImmA,
        5 => Op::AddSpImm,
        6 => Op::LdhAImm,
        _ => Op::LdHlSpImm,
      },
      1 if q == 0 => Op::Pop(Stack16::from_index(p)),
      1 => match p {
        0 => Op::Ret(None),
        1 => Op::Reti,
        2 => Op::JpHl,
        _ => Op::LdSpHl,
      },
      2 => match y {
        0..=3 => Op::Jp(Some(Cond::from_index(y))),
        4 => Op::LdhCA,
        5 => Op::LdAbsA,
        6 => Op::LdhAC,
        _ => Op::LdAAbs,
      },
      3 => match y {
        0 => Op::Jp(None),
        1 => Op::Prefix,
        6 => Op::Di,
        7 => Op::Ei,
        _ => Op::Undefined(op),
      },
      4 => match y {
        0..=3 => Op::Call(Some(Cond::from_index(y))),
        _ => Op::Undefined(op),
      },
      5 if q == 0 => Op::Push(Stack16::from_index(p)),
      5 if p == 0 => Op::Call(None),
      5 => Op::Undefined(op),
      6 => Op::AluImm(Alu::from_index(y)),
      _ => Op::Rst(y * 8),
    },
  }
}

const fn decode_cb(op: u8) -> CbOp {
  let y = (op >> 3) & 7;
  let kind = match op >> 6 {
    0 => CbKind::Shift(Shift::from_index(y)),
    1 => CbKind::Bit(y),
    2 => CbKind::Res(y),
    _ => CbKind::Set(y),
  };
  CbOp {
    kind,
    target: R8::from_index(op),
  }
}

const fn build_table() -> [Op; 256] {
  let mut table = [Op::Nop; 256];
  let mut i = 0;
  while i < 256 {
    table[i] = decode(i as u8);
    i += 1;
  }
  table
}

const fn build_cb_table() -> [CbOp; 256] {
  let mut table = [CbOp {
    kind: CbKind::Bit(0),
    target: R8::B,
  }; 256];
  let mut i = 0;
  while i < 256 {
    table[i] = decode_cb(i as u8);
    i += 1;
  }
  table
}

pub const OPCODES: [Op; 256] = build_table();
pub const CB_OPCODES: [CbOp; 256] = build_cb_table();

impl fmt::Display for R8 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      R8::B => "B",
      R8::C => "C",
      R8::D => "D",
      R8::E => "E",
      R8::H => "H",
      R8::L => "L",
      R8::HLm => "(HL)",
      R8::A => "A",
    })
  }
}

impl fmt::Display for R16 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      R16::BC => "BC",
      R16::DE => "DE",
      R16::HL => "HL",
      R16::SP => "SP",
    })
  }
}

impl fmt::Display for Stack16 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Stack16::BC => "BC",
      Stack16::DE => "DE",
      Stack16::HL => "HL",
      Stack16::AF => "AF",
    })
  }
}

impl fmt::Display for Indirect {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Indirect::BC => "(BC)",
      Indirect::DE => "(DE)",
      Indirect::HLInc => "(HL+)",
      Indirect::HLDec => "(HL-)",
    })
  }
}

impl fmt::Display for Cond {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Cond::NZ => "NZ",
      Cond::Z => "Z",
      Cond::NC => "NC",
      Cond::C => "C",
    })
  }
}

impl fmt::Display for Alu {
  /// The mnemonic up to and including the separator before the operand.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Alu::Add => "ADD A, ",
      Alu::Adc => "ADC A, ",
      Alu::Sub => "SUB ",
      Alu::Sbc => "SBC A, ",
      Alu::And => "AND ",
      Alu::Xor => "XOR ",
      Alu::Or => "OR ",
      Alu::Cp => "CP ",
    })
  }
}

impl fmt::Display for Shift {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Shift::Rlc => "RLC",
      Shift::Rrc => "RRC",
      Shift::Rl => "RL",
      Shift::Rr => "RR",
      Shift::Sla => "SLA",
      Shift::Sra => "SRA",
      Shift::Swap => "SWAP",
      Shift::Srl => "SRL",
    })
  }
}

impl fmt::Display for CbOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.kind {
      CbKind::Shift(s) => write!(f, "{} {}", s, self.target),
      CbKind::Bit(b) => write!(f, "BIT {}, {}", b, self.target),
      CbKind::Res(b) => write!(f, "RES {}, {}", b, self.target),
      CbKind::Set(b) => write!(f, "SET {}, {}", b, self.target),
    }
  }
}
