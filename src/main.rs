use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use log::info;

use gb_cpu::{disasm, Exit, GameBoy};

#[derive(Parser, Debug)]
#[command(name = "gb-cpu", version, about = "Game Boy CPU core runner")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run a ROM until HALT and dump the machine state.
  Run(RunArgs),
  /// Print a disassembly listing of a ROM.
  Disasm(DisasmArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
  rom: PathBuf,

  /// Load address of the ROM.
  #[arg(long, default_value = "0", value_parser = parse_addr)]
  offset: u16,

  /// Initial program counter.
  #[arg(long, default_value = "0", value_parser = parse_addr)]
  pc: u16,

  /// Initial stack pointer.
  #[arg(long, default_value = "0", value_parser = parse_addr)]
  sp: u16,

  /// Overwrite memory after loading, e.g. `0x00e9=0000`. Repeatable.
  #[arg(long, value_parser = parse_patch)]
  patch: Vec<Patch>,

  /// Give up after this many instructions.
  #[arg(long)]
  max_steps: Option<u64>,

  /// Instructions shown on each side of PC in the final disassembly.
  #[arg(long, default_value_t = 3)]
  window: usize,

  /// Fail if the step limit is reached before HALT.
  #[arg(long)]
  strict: bool,
}

#[derive(clap::Args, Debug)]
struct DisasmArgs {
  rom: PathBuf,

  #[arg(long, default_value = "0", value_parser = parse_addr)]
  offset: u16,

  /// First address to disassemble.
  #[arg(long, default_value = "0", value_parser = parse_addr)]
  start: u16,

  /// Number of instructions.
  #[arg(long, default_value_t = 32)]
  count: usize,
}

#[derive(Debug, Clone)]
struct Patch {
  addr: u16,
  bytes: Vec<u8>,
}

/// Accepts `0x`-prefixed hex or decimal.
fn parse_addr(s: &str) -> anyhow::Result<u16> {
  let s = s.trim();
  let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
    Some(hex) => u16::from_str_radix(hex, 16),
    None => s.parse::<u16>(),
  };
  value.with_context(|| format!("invalid address: {}", s))
}

/// `ADDR=HEXBYTES`, e.g. `0x100=c3`.
fn parse_patch(s: &str) -> anyhow::Result<Patch> {
  let (addr, hex) = s
    .split_once('=')
    .ok_or_else(|| anyhow!("expected ADDR=HEXBYTES, got {}", s))?;
  let addr = parse_addr(addr)?;
  if hex.is_empty() || hex.len() % 2 != 0 {
    bail!("patch bytes must be an even number of hex digits: {}", hex);
  }
  let bytes = (0..hex.len())
    .step_by(2)
    .map(|i| {
      hex
        .get(i..i + 2)
        .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        .ok_or_else(|| anyhow!("invalid hex byte in patch: {}", hex))
    })
    .collect::<anyhow::Result<Vec<u8>>>()?;
  Ok(Patch { addr, bytes })
}

fn load(rom: &Path, offset: u16) -> anyhow::Result<GameBoy> {
  let bytes =
    fs::read(rom).with_context(|| format!("reading {}", rom.display()))?;
  let mut gb = GameBoy::new();
  gb.load(&bytes, usize::from(offset))
    .with_context(|| format!("loading {}", rom.display()))?;
  Ok(gb)
}

fn run(args: RunArgs) -> anyhow::Result<()> {
  let mut gb = load(&args.rom, args.offset)?;
  for patch in &args.patch {
    gb.mem_mut()
      .write(usize::from(patch.addr), &patch.bytes)
      .with_context(|| format!("applying patch at {:#06x}", patch.addr))?;
    info!("patched {} bytes at {:#06x}", patch.bytes.len(), patch.addr);
  }
  gb.cpu_mut().regs.pc = args.pc;
  gb.cpu_mut().regs.sp = args.sp;

  let exit = gb.run(args.max_steps).with_context(|| {
    format!("execution failed at pc={:#06x}", gb.cpu().regs.pc)
  })?;

  println!("{}", gb.cpu().regs);
  println!(
    "HALT: {}   steps: {}",
    if gb.is_halted() { "yes" } else { "no" },
    gb.steps()
  );
  println!("----------------------------------------");
  let pc = gb.cpu().regs.pc;
  for (addr, text) in disasm::window(gb.mem(), pc, args.window, args.window) {
    let marker = if addr == pc { ">>" } else { "  " };
    println!("{} {:04X}  {}", marker, addr, text);
  }

  if exit == Exit::StepLimit && args.strict {
    bail!("step limit reached without HALT");
  }
  Ok(())
}

fn disassemble(args: DisasmArgs) -> anyhow::Result<()> {
  let gb = load(&args.rom, args.offset)?;
  for (addr, text) in disasm::listing(gb.mem(), args.start, args.count) {
    println!("{:04X}  {}", addr, text);
  }
  Ok(())
}

fn main() -> anyhow::Result<()> {
  env_logger::init();
  let cli = Cli::parse();

  match cli.command {
    Command::Run(args) => run(args),
    Command::Disasm(args) => disassemble(args),
  }
}
