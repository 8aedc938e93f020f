use crate::cpu::op::{Op, OPCODES};
use crate::cpu::CPU;
use crate::error::Error;
use crate::mem::Memory;

fn init() -> (CPU, Memory) {
  let mut cpu = CPU::new();
  let mem = Memory::new();
  // Start in WRAM with room for a stack above.
  cpu.regs.pc = 0xc000;
  cpu.regs.sp = 0xfffe;
  (cpu, mem)
}

/// Place `code` at PC, run one instruction and check PC advanced by `len`.
fn run(cpu: &mut CPU, mem: &mut Memory, code: &[u8], len: u16) {
  let start = cpu.regs.pc;
  mem.write(usize::from(start), code).unwrap();
  let next = cpu.step(mem).unwrap();
  assert_eq!(next, start.wrapping_add(len));
  assert_eq!(cpu.regs.pc, next);
}

/// Place `program` at PC and step until HALT.
fn run_program(cpu: &mut CPU, mem: &mut Memory, program: &[u8]) {
  mem.write(usize::from(cpu.regs.pc), program).unwrap();
  for _ in 0..1000 {
    cpu.step(mem).unwrap();
    if cpu.is_halted() {
      return;
    }
  }
  panic!("program did not halt");
}

#[test]
fn nop() {
  let (mut cpu, mut mem) = init();
  let regs = cpu.regs.clone();
  run(&mut cpu, &mut mem, &[0x00], 1);
  assert_eq!(cpu.regs.flags, regs.flags);
  assert_eq!(cpu.regs.sp, regs.sp);
}

#[test]
fn ld_nn_n() {
  macro_rules! run_test {
    ($reg:ident, $opcode:expr) => {{
      let (mut cpu, mut mem) = init();
      let f = cpu.regs.flags;
      run(&mut cpu, &mut mem, &[$opcode, 0x42], 2);
      assert_eq!(cpu.regs.flags, f);
      assert_eq!(cpu.regs.$reg, 0x42);
    }};
  }
  run_test!(b, 0x06);
  run_test!(c, 0x0e);
  run_test!(d, 0x16);
  run_test!(e, 0x1e);
  run_test!(h, 0x26);
  run_test!(l, 0x2e);
  run_test!(a, 0x3e);
}

#[test]
fn ld_r1_r2() {
  macro_rules! reg_reg {
    ($r1:ident, $r2:ident, $opcode:expr) => {{
      let (mut cpu, mut mem) = init();
      cpu.regs.$r2 = 0x42;
      let f = cpu.regs.flags;
      run(&mut cpu, &mut mem, &[$opcode], 1);
      assert_eq!(cpu.regs.flags, f);
      assert_eq!(cpu.regs.$r1, 0x42);
      assert_eq!(cpu.regs.$r2, 0x42);
    }};
  }

  reg_reg!(a, a, 0x7f);
  reg_reg!(a, b, 0x78);
  reg_reg!(a, c, 0x79);
  reg_reg!(a, d, 0x7a);
  reg_reg!(a, e, 0x7b);
  reg_reg!(a, h, 0x7c);
  reg_reg!(a, l, 0x7d);

  reg_reg!(b, c, 0x41);
  reg_reg!(b, a, 0x47);
  reg_reg!(c, d, 0x4a);
  reg_reg!(d, e, 0x53);
  reg_reg!(e, h, 0x5c);
  reg_reg!(h, l, 0x65);
  reg_reg!(l, b, 0x68);
}

#[test]
fn ld_hl_indirect() {
  let (mut cpu, mut mem) = init();
  cpu.regs.a = 0x42;
  run(&mut cpu, &mut mem, &[0x21, 0x34, 0x12], 3);
  assert_eq!(cpu.regs.hl(), 0x1234);
  run(&mut cpu, &mut mem, &[0x77], 1);
  assert_eq!(mem.rb(0x1234).unwrap(), 0x42);
  assert_eq!(cpu.regs.hl(), 0x1234);

  // LD B, (HL)
  run(&mut cpu, &mut mem, &[0x46], 1);
  assert_eq!(cpu.regs.b, 0x42);
  // LD (HL), 0x99
  run(&mut cpu, &mut mem, &[0x36, 0x99], 2);
  assert_eq!(mem.rb(0x1234).unwrap(), 0x99);
}

#[test]
fn ld_hl_inc_dec() {
  let (mut cpu, mut mem) = init();
  cpu.regs.a = 0x11;
  cpu.regs.set_hl(0xd000);
  run(&mut cpu, &mut mem, &[0x22], 1);
  assert_eq!(mem.rb(0xd000).unwrap(), 0x11);
  assert_eq!(cpu.regs.hl(), 0xd001);
  run(&mut cpu, &mut mem, &[0x32], 1);
  assert_eq!(mem.rb(0xd001).unwrap(), 0x11);
  assert_eq!(cpu.regs.hl(), 0xd000);

  mem.wb(0xd000, 0x77).unwrap();
  run(&mut cpu, &mut mem, &[0x2a], 1);
  assert_eq!(cpu.regs.a, 0x77);
  assert_eq!(cpu.regs.hl(), 0xd001);
  run(&mut cpu, &mut mem, &[0x3a], 1);
  assert_eq!(cpu.regs.hl(), 0xd000);
}

#[test]
fn ld_high_page() {
  let (mut cpu, mut mem) = init();
  cpu.regs.a = 0x5a;
  run(&mut cpu, &mut mem, &[0xe0, 0x80], 2);
  assert_eq!(mem.rb(0xff80).unwrap(), 0x5a);

  cpu.regs.c = 0x81;
  run(&mut cpu, &mut mem, &[0xe2], 1);
  assert_eq!(mem.rb(0xff81).unwrap(), 0x5a);

  mem.wb(0xff90, 0x33).unwrap();
  run(&mut cpu, &mut mem, &[0xf0, 0x90], 2);
  assert_eq!(cpu.regs.a, 0x33);

  mem.wb(0xff81, 0x44).unwrap();
  run(&mut cpu, &mut mem, &[0xf2], 1);
  assert_eq!(cpu.regs.a, 0x44);
}

#[test]
fn ld_absolute() {
  let (mut cpu, mut mem) = init();
  cpu.regs.a = 0x12;
  run(&mut cpu, &mut mem, &[0xea, 0x00, 0xd0], 3);
  assert_eq!(mem.rb(0xd000).unwrap(), 0x12);
  cpu.regs.a = 0;
  run(&mut cpu, &mut mem, &[0xfa, 0x00, 0xd0], 3);
  assert_eq!(cpu.regs.a, 0x12);

  cpu.regs.sp = 0xbeef;
  run(&mut cpu, &mut mem, &[0x08, 0x10, 0xd0], 3);
  assert_eq!(mem.rw(0xd010).unwrap(), 0xbeef);
}

#[test]
fn inc_dec_round_trip() {
  macro_rules! run_test {
    ($reg:ident, $inc:expr, $dec:expr) => {{
      for value in 0..=255u8 {
        let (mut cpu, mut mem) = init();
        cpu.regs.$reg = value;
        run(&mut cpu, &mut mem, &[$inc], 1);
        assert_eq!(cpu.regs.$reg, value.wrapping_add(1));
        run(&mut cpu, &mut mem, &[$dec], 1);
        assert_eq!(cpu.regs.$reg, value);
      }
    }};
  }
  run_test!(b, 0x04, 0x05);
  run_test!(c, 0x0c, 0x0d);
  run_test!(d, 0x14, 0x15);
  run_test!(e, 0x1c, 0x1d);
  run_test!(h, 0x24, 0x25);
  run_test!(l, 0x2c, 0x2d);
  run_test!(a, 0x3c, 0x3d);
}

#[test]
fn inc_dec_hl_memory() {
  let (mut cpu, mut mem) = init();
  cpu.regs.set_hl(0xd000);
  mem.wb(0xd000, 0xff).unwrap();
  cpu.regs.flags.carry = true;
  run(&mut cpu, &mut mem, &[0x34], 1);
  assert_eq!(mem.rb(0xd000).unwrap(), 0x00);
  assert!(cpu.regs.flags.zero && cpu.regs.flags.half_carry);
  assert!(cpu.regs.flags.carry);
  run(&mut cpu, &mut mem, &[0x35], 1);
  assert_eq!(mem.rb(0xd000).unwrap(), 0xff);
}

#[test]
fn inc_dec_16() {
  let (mut cpu, mut mem) = init();
  cpu.regs.set_bc(0xffff);
  cpu.regs.flags.zero = true;
  let f = cpu.regs.flags;
  run(&mut cpu, &mut mem, &[0x03], 1);
  assert_eq!(cpu.regs.bc(), 0x0000);
  assert_eq!(cpu.regs.flags, f);
  run(&mut cpu, &mut mem, &[0x0b], 1);
  assert_eq!(cpu.regs.bc(), 0xffff);

  cpu.regs.sp = 0;
  run(&mut cpu, &mut mem, &[0x3b], 1);
  assert_eq!(cpu.regs.sp, 0xffff);
}

#[test]
fn add_a_a_0x80() {
  let (mut cpu, mut mem) = init();
  cpu.regs.a = 0x80;
  run(&mut cpu, &mut mem, &[0x87], 1);
  let f = cpu.regs.flags;
  assert_eq!(cpu.regs.a, 0);
  assert!(f.zero && f.carry);
  assert!(!f.sign);
  // Low nibbles 0 + 0 produce no half carry.
  assert!(!f.half_carry);
}

#[test]
fn xor_a() {
  let (mut cpu, mut mem) = init();
  cpu.regs.a = 0x5d;
  cpu.regs.flags.carry = true;
  cpu.regs.flags.half_carry = true;
  run(&mut cpu, &mut mem, &[0xaf], 1);
  let f = cpu.regs.flags;
  assert_eq!(cpu.regs.a, 0);
  assert!(f.zero && f.parity);
  assert!(!f.carry && !f.half_carry && !f.sign);
}

#[test]
fn alu_immediate_and_memory() {
  let (mut cpu, mut mem) = init();
  cpu.regs.a = 0x10;
  run(&mut cpu, &mut mem, &[0xd6, 0x01], 2);
  assert_eq!(cpu.regs.a, 0x0f);
  assert!(cpu.regs.flags.half_carry);

  cpu.regs.set_hl(0xd000);
  mem.wb(0xd000, 0x0f).unwrap();
  // CP (HL)
  run(&mut cpu, &mut mem, &[0xbe], 1);
  assert_eq!(cpu.regs.a, 0x0f);
  assert!(cpu.regs.flags.zero);

  // ADC A, 0x00 with carry set.
  cpu.regs.flags.carry = true;
  run(&mut cpu, &mut mem, &[0xce, 0x00], 2);
  assert_eq!(cpu.regs.a, 0x10);
  assert!(cpu.regs.flags.half_carry && !cpu.regs.flags.carry);
}

#[test]
fn daa_after_add() {
  let (mut cpu, mut mem) = init();
  // LD A, 0x09; ADD A, A; DAA; HALT
  run_program(&mut cpu, &mut mem, &[0x3e, 0x09, 0x87, 0x27, 0x76]);
  assert_eq!(cpu.regs.a, 0x18);
  assert!(!cpu.regs.flags.carry);
}

#[test]
fn cpl_scf_ccf() {
  let (mut cpu, mut mem) = init();
  cpu.regs.a = 0x35;
  run(&mut cpu, &mut mem, &[0x2f], 1);
  assert_eq!(cpu.regs.a, 0xca);
  assert!(cpu.regs.flags.half_carry);

  run(&mut cpu, &mut mem, &[0x37], 1);
  assert!(cpu.regs.flags.carry && !cpu.regs.flags.half_carry);
  run(&mut cpu, &mut mem, &[0x3f], 1);
  assert!(!cpu.regs.flags.carry);
  run(&mut cpu, &mut mem, &[0x3f], 1);
  assert!(cpu.regs.flags.carry);
}

#[test]
fn accumulator_rotates_clear_szp() {
  let (mut cpu, mut mem) = init();
  cpu.regs.a = 0x80;
  run(&mut cpu, &mut mem, &[0x07], 1);
  assert_eq!(cpu.regs.a, 0x01);
  assert!(cpu.regs.flags.carry);

  // RLA of 0x80 gives zero but Zero stays clear.
  cpu.regs.a = 0x80;
  cpu.regs.flags.carry = false;
  run(&mut cpu, &mut mem, &[0x17], 1);
  assert_eq!(cpu.regs.a, 0x00);
  let f = cpu.regs.flags;
  assert!(f.carry && !f.zero && !f.sign && !f.parity && !f.half_carry);

  // RRA pulls the carry into bit 7.
  run(&mut cpu, &mut mem, &[0x1f], 1);
  assert_eq!(cpu.regs.a, 0x80);
  assert!(!cpu.regs.flags.carry && !cpu.regs.flags.sign);

  run(&mut cpu, &mut mem, &[0x0f], 1);
  assert_eq!(cpu.regs.a, 0x40);
}

#[test]
fn add_hl_rr() {
  let (mut cpu, mut mem) = init();
  cpu.regs.set_hl(0x8a23);
  cpu.regs.set_bc(0x0605);
  run(&mut cpu, &mut mem, &[0x09], 1);
  assert_eq!(cpu.regs.hl(), 0x9028);
  assert!(cpu.regs.flags.half_carry && !cpu.regs.flags.carry);

  // ADD HL, HL
  run(&mut cpu, &mut mem, &[0x29], 1);
  assert_eq!(cpu.regs.hl(), 0x2050);
  assert!(cpu.regs.flags.carry);
}

#[test]
fn sp_offsets() {
  let (mut cpu, mut mem) = init();
  cpu.regs.sp = 0xd000;
  run(&mut cpu, &mut mem, &[0xe8, 0xfe], 2);
  assert_eq!(cpu.regs.sp, 0xcffe);

  run(&mut cpu, &mut mem, &[0xf8, 0x02], 2);
  assert_eq!(cpu.regs.hl(), 0xd000);
  assert_eq!(cpu.regs.sp, 0xcffe);
  assert!(!cpu.regs.flags.zero && !cpu.regs.flags.sign);

  cpu.regs.set_hl(0xe000);
  run(&mut cpu, &mut mem, &[0xf9], 1);
  assert_eq!(cpu.regs.sp, 0xe000);
}

#[test]
fn push_pop() {
  let (mut cpu, mut mem) = init();
  cpu.regs.set_bc(0x1234);
  let sp = cpu.regs.sp;
  run(&mut cpu, &mut mem, &[0xc5], 1);
  assert_eq!(cpu.regs.sp, sp - 2);
  // Low byte at SP, high byte at SP+1.
  assert_eq!(mem.rb(usize::from(sp - 2)).unwrap(), 0x34);
  assert_eq!(mem.rb(usize::from(sp - 1)).unwrap(), 0x12);

  run(&mut cpu, &mut mem, &[0xd1], 1);
  assert_eq!((cpu.regs.d, cpu.regs.e), (0x12, 0x34));
  assert_eq!(cpu.regs.sp, sp);
}

#[test]
fn pop_af_restores_flags() {
  let (mut cpu, mut mem) = init();
  cpu.regs.set_hl(0x4285);
  run(&mut cpu, &mut mem, &[0xe5], 1);
  run(&mut cpu, &mut mem, &[0xf1], 1);
  assert_eq!(cpu.regs.a, 0x42);
  let f = cpu.regs.flags;
  assert!(f.zero && f.carry && f.parity);
  assert!(!f.sign && !f.half_carry);

  run(&mut cpu, &mut mem, &[0xf5], 1);
  assert_eq!(mem.rb(usize::from(cpu.regs.sp)).unwrap(), 0x85);
}

#[test]
fn jr_nz() {
  // Taken.
  let (mut cpu, mut mem) = init();
  let start = cpu.regs.pc;
  mem.write(usize::from(start), &[0x20, 0x05]).unwrap();
  assert_eq!(cpu.step(&mut mem).unwrap(), start + 7);

  // Not taken.
  let (mut cpu, mut mem) = init();
  cpu.regs.flags.zero = true;
  run(&mut cpu, &mut mem, &[0x20, 0x05], 2);
}

#[test]
fn jr_backwards() {
  let (mut cpu, mut mem) = init();
  let start = cpu.regs.pc;
  mem.write(usize::from(start), &[0x18, 0xfe]).unwrap();
  assert_eq!(cpu.step(&mut mem).unwrap(), start);
}

#[test]
fn jp() {
  let (mut cpu, mut mem) = init();
  mem.write(0xc000, &[0xc3, 0x50, 0x01]).unwrap();
  assert_eq!(cpu.step(&mut mem).unwrap(), 0x0150);

  let (mut cpu, mut mem) = init();
  // JP C, not taken.
  run(&mut cpu, &mut mem, &[0xda, 0x50, 0x01], 3);

  let (mut cpu, mut mem) = init();
  cpu.regs.set_hl(0x4000);
  mem.wb(0xc000, 0xe9).unwrap();
  assert_eq!(cpu.step(&mut mem).unwrap(), 0x4000);
}

#[test]
fn call_ret() {
  let (mut cpu, mut mem) = init();
  let sp = cpu.regs.sp;
  mem.write(0xc000, &[0xcd, 0xcd, 0xab]).unwrap();
  mem.wb(0xabcd, 0xc9).unwrap();

  assert_eq!(cpu.step(&mut mem).unwrap(), 0xabcd);
  assert_eq!(cpu.regs.sp, sp - 2);
  assert_eq!(mem.rw(usize::from(cpu.regs.sp)).unwrap(), 0xc003);

  assert_eq!(cpu.step(&mut mem).unwrap(), 0xc003);
  assert_eq!(cpu.regs.sp, sp);
}

#[test]
fn conditional_call_ret() {
  let (mut cpu, mut mem) = init();
  let sp = cpu.regs.sp;
  // CALL NZ with Zero set falls through without touching the stack.
  cpu.regs.flags.zero = true;
  run(&mut cpu, &mut mem, &[0xc4, 0x00, 0xd0], 3);
  assert_eq!(cpu.regs.sp, sp);
  // RET NZ likewise.
  run(&mut cpu, &mut mem, &[0xc0], 1);
  assert_eq!(cpu.regs.sp, sp);

  // CALL Z is taken.
  let start = cpu.regs.pc;
  mem.write(usize::from(start), &[0xcc, 0x00, 0xd0]).unwrap();
  assert_eq!(cpu.step(&mut mem).unwrap(), 0xd000);
  // RETI returns like RET.
  mem.wb(0xd000, 0xd9).unwrap();
  assert_eq!(cpu.step(&mut mem).unwrap(), start + 3);
  assert_eq!(cpu.regs.sp, sp);
}

#[test]
fn rst() {
  let (mut cpu, mut mem) = init();
  mem.wb(0xc000, 0xef).unwrap();
  assert_eq!(cpu.step(&mut mem).unwrap(), 0x0028);
  // The return address is the byte after RST.
  assert_eq!(mem.rw(usize::from(cpu.regs.sp)).unwrap(), 0xc001);
}

#[test]
fn halt_latches() {
  let (mut cpu, mut mem) = init();
  assert!(!cpu.is_halted());
  run(&mut cpu, &mut mem, &[0x76], 1);
  assert!(cpu.is_halted());
}

#[test]
fn stop_di_ei_advance_only() {
  let (mut cpu, mut mem) = init();
  let regs = cpu.regs.clone();
  run(&mut cpu, &mut mem, &[0x10, 0x00], 2);
  run(&mut cpu, &mut mem, &[0xf3], 1);
  run(&mut cpu, &mut mem, &[0xfb], 1);
  assert_eq!(cpu.regs.flags, regs.flags);
  assert_eq!(cpu.regs.sp, regs.sp);
  assert!(!cpu.is_halted());
}

#[test]
fn undefined_opcodes_are_skipped() {
  for code in 0..=255u8 {
    if let Op::Undefined(_) = OPCODES[usize::from(code)] {
      let (mut cpu, mut mem) = init();
      let mut regs = cpu.regs.clone();
      run(&mut cpu, &mut mem, &[code], 1);
      regs.pc += 1;
      assert_eq!(cpu.regs, regs);
    }
  }
}

#[test]
fn cb_ops() {
  let (mut cpu, mut mem) = init();
  cpu.regs.h = 0x80;
  // BIT 7, H
  run(&mut cpu, &mut mem, &[0xcb, 0x7c], 2);
  assert!(!cpu.regs.flags.zero && cpu.regs.flags.half_carry);
  // BIT 0, H
  run(&mut cpu, &mut mem, &[0xcb, 0x44], 2);
  assert!(cpu.regs.flags.zero);
  assert_eq!(cpu.regs.h, 0x80);

  // SWAP A
  cpu.regs.a = 0xab;
  run(&mut cpu, &mut mem, &[0xcb, 0x37], 2);
  assert_eq!(cpu.regs.a, 0xba);

  // RL C through the carry.
  cpu.regs.c = 0x80;
  cpu.regs.flags.carry = false;
  run(&mut cpu, &mut mem, &[0xcb, 0x11], 2);
  assert_eq!(cpu.regs.c, 0x00);
  assert!(cpu.regs.flags.carry && cpu.regs.flags.zero);
}

#[test]
fn cb_res_set_keep_flags() {
  let (mut cpu, mut mem) = init();
  cpu.regs.b = 0xff;
  cpu.regs.flags.zero = true;
  cpu.regs.flags.carry = true;
  let f = cpu.regs.flags;
  // RES 3, B
  run(&mut cpu, &mut mem, &[0xcb, 0x98], 2);
  assert_eq!(cpu.regs.b, 0xf7);
  // SET 3, B
  run(&mut cpu, &mut mem, &[0xcb, 0xd8], 2);
  assert_eq!(cpu.regs.b, 0xff);
  assert_eq!(cpu.regs.flags, f);
}

#[test]
fn cb_hl_memory() {
  let (mut cpu, mut mem) = init();
  cpu.regs.set_hl(0xd000);
  mem.wb(0xd000, 0x01).unwrap();
  // SLA (HL)
  run(&mut cpu, &mut mem, &[0xcb, 0x26], 2);
  assert_eq!(mem.rb(0xd000).unwrap(), 0x02);
  // SET 7, (HL)
  run(&mut cpu, &mut mem, &[0xcb, 0xfe], 2);
  assert_eq!(mem.rb(0xd000).unwrap(), 0x82);
  // BIT 1, (HL) leaves memory alone.
  run(&mut cpu, &mut mem, &[0xcb, 0x4e], 2);
  assert!(!cpu.regs.flags.zero);
  assert_eq!(mem.rb(0xd000).unwrap(), 0x82);
}

#[test]
fn loads_keep_flags() {
  let (mut cpu, mut mem) = init();
  cpu.regs.flags.zero = true;
  cpu.regs.flags.half_carry = true;
  let f = cpu.regs.flags;
  run(&mut cpu, &mut mem, &[0x01, 0x00, 0x00], 3);
  run(&mut cpu, &mut mem, &[0x3e, 0x00], 2);
  run(&mut cpu, &mut mem, &[0x02], 1);
  run(&mut cpu, &mut mem, &[0x0a], 1);
  assert_eq!(cpu.regs.flags, f);
}

#[test]
fn pc_wraps() {
  let (mut cpu, mut mem) = init();
  cpu.regs.pc = 0xffff;
  mem.wb(0xffff, 0x00).unwrap();
  assert_eq!(cpu.step(&mut mem).unwrap(), 0x0000);
}

#[test]
fn operand_fetch_past_end() {
  let (mut cpu, mut mem) = init();
  cpu.regs.pc = 0xffff;
  mem.wb(0xffff, 0x3e).unwrap();
  assert_eq!(
    cpu.step(&mut mem),
    Err(Error::AddressOutOfRange { addr: 0x10000 })
  );
}

#[test]
fn push_below_zero() {
  let (mut cpu, mut mem) = init();
  cpu.regs.sp = 0x0001;
  mem.wb(0xc000, 0xc5).unwrap();
  assert_eq!(cpu.step(&mut mem), Err(Error::StackOverflow { sp: 0x0001 }));
  assert_eq!(cpu.regs.sp, 0x0001);
  assert_eq!(cpu.regs.pc, 0xc000);
}

#[test]
fn pop_at_top_of_memory() {
  let (mut cpu, mut mem) = init();
  cpu.regs.sp = 0xffff;
  mem.wb(0xc000, 0xc1).unwrap();
  assert!(cpu.step(&mut mem).is_err());
}
