// mpnum - Command-line calculator for the mpnum numeric tower
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use mpnum_core::{
    BinaryOp, Context, ContextOverride, Flag, Flags, Number, Outcome, RoundingMode, UnaryOp,
    apply, apply_unary, partial_cmp,
};
use rug::{Complex, Float, Integer, Rational};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mpnum",
    about = "Apply one operator under an arbitrary-precision context",
    version
)]
struct Cli {
    /// Operator to apply
    #[arg(value_enum)]
    op: OpArg,

    /// First operand: integer, p/q, decimal, or re,im
    #[arg(allow_hyphen_values = true)]
    x: String,

    /// Second operand, for binary operators
    #[arg(allow_hyphen_values = true)]
    y: Option<String>,

    /// Working precision in bits
    #[arg(long)]
    precision: Option<u32>,

    /// Rounding mode: nearest, zero, up, down or away
    #[arg(long)]
    round: Option<RoundingMode>,

    /// Smallest exponent
    #[arg(long, allow_negative_numbers = true)]
    emin: Option<i32>,

    /// Largest exponent
    #[arg(long, allow_negative_numbers = true)]
    emax: Option<i32>,

    /// Emulate subnormal numbers
    #[arg(long)]
    subnormalize: bool,

    /// Return complex results for real operations that need them
    #[arg(long)]
    allow_complex: bool,

    /// Trap a flag (repeatable)
    #[arg(long = "trap")]
    traps: Vec<Flag>,

    /// TOML file with context settings, applied before the flags above
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from the IEEE 754 binary format of this width
    #[arg(long)]
    ieee: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OpArg {
    Add,
    Sub,
    Mul,
    Div,
    Floordiv,
    Mod,
    Pow,
    Neg,
    Abs,
    Sqrt,
    Cmp,
}

enum Op {
    Binary(BinaryOp),
    Unary(UnaryOp),
    Compare,
}

impl OpArg {
    fn op(self) -> Op {
        match self {
            OpArg::Add => Op::Binary(BinaryOp::Add),
            OpArg::Sub => Op::Binary(BinaryOp::Sub),
            OpArg::Mul => Op::Binary(BinaryOp::Mul),
            OpArg::Div => Op::Binary(BinaryOp::Div),
            OpArg::Floordiv => Op::Binary(BinaryOp::FloorDiv),
            OpArg::Mod => Op::Binary(BinaryOp::Mod),
            OpArg::Pow => Op::Binary(BinaryOp::Pow),
            OpArg::Neg => Op::Unary(UnaryOp::Neg),
            OpArg::Abs => Op::Unary(UnaryOp::Abs),
            OpArg::Sqrt => Op::Unary(UnaryOp::Sqrt),
            OpArg::Cmp => Op::Compare,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MPNUM_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut ctx = build_context(cli)?;
    debug!(precision = ctx.precision(), rounding = %ctx.rounding(), "context ready");

    let x = parse_operand(&cli.x, &ctx)?;
    match cli.op.op() {
        Op::Unary(op) => {
            let out = apply_unary(op, &x, &mut ctx, None).map_err(|e| e.to_string())?;
            print_outcome(&out);
        }
        Op::Binary(op) => {
            let y = second_operand(cli, &ctx)?;
            let out = apply(op, &x, &y, &mut ctx, None).map_err(|e| e.to_string())?;
            print_outcome(&out);
        }
        Op::Compare => {
            let y = second_operand(cli, &ctx)?;
            let ord = partial_cmp(&x, &y).map_err(|e| e.to_string())?;
            let word = match ord {
                Some(std::cmp::Ordering::Less) => "less",
                Some(std::cmp::Ordering::Equal) => "equal",
                Some(std::cmp::Ordering::Greater) => "greater",
                None => "unordered",
            };
            println!("{}", word);
        }
    }
    Ok(())
}

fn second_operand(cli: &Cli, ctx: &Context) -> Result<Number, String> {
    match &cli.y {
        Some(y) => parse_operand(y, ctx),
        None => Err(format!("'{:?}' needs two operands", cli.op).to_lowercase()),
    }
}

/// IEEE base, then the config file, then individual flags.
fn build_context(cli: &Cli) -> Result<Context, String> {
    let mut ctx = match cli.ieee {
        Some(bits) => Context::ieee(bits).map_err(|e| e.to_string())?,
        None => Context::new(),
    };

    if let Some(path) = &cli.config {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("reading '{}': {}", path.display(), e))?;
        let file = ContextOverride::from_toml_str(&text)
            .map_err(|e| format!("in '{}': {}", path.display(), e))?;
        ctx.apply(&file).map_err(|e| e.to_string())?;
    }

    let mut flags = ContextOverride::new();
    flags.precision = cli.precision;
    flags.rounding = cli.round;
    flags.emin = cli.emin;
    flags.emax = cli.emax;
    if cli.subnormalize {
        flags.subnormalize = Some(true);
    }
    if cli.allow_complex {
        flags.allow_complex = Some(true);
    }
    if !cli.traps.is_empty() {
        flags.traps = Some(cli.traps.iter().copied().collect::<Flags>());
    }
    ctx.apply(&flags).map_err(|e| e.to_string())?;
    Ok(ctx)
}

/// Parse an operand literal. Integers and `p/q` stay exact; anything else
/// is read as a Real at the working precision; `re,im` is a Complex.
fn parse_operand(s: &str, ctx: &Context) -> Result<Number, String> {
    let s = s.trim();
    if let Some((re, im)) = s.split_once(',') {
        let re = parse_float(re.trim(), ctx.real_prec())?;
        let im = parse_float(im.trim(), ctx.imag_prec())?;
        return Ok(Number::Complex(Complex::with_val(
            (ctx.real_prec(), ctx.imag_prec()),
            (re, im),
        )));
    }
    if s.contains('/') {
        let q: Rational = s
            .parse()
            .map_err(|e| format!("invalid rational '{}': {}", s, e))?;
        return Ok(Number::Rational(q));
    }
    if let Ok(n) = s.parse::<Integer>() {
        return Ok(Number::Integer(n));
    }
    parse_float(s, ctx.precision()).map(Number::Real)
}

fn parse_float(s: &str, prec: u32) -> Result<Float, String> {
    let parsed = Float::parse(s).map_err(|e| format!("invalid number '{}': {}", s, e))?;
    Ok(Float::with_val(prec, parsed))
}

fn print_outcome(out: &Outcome) {
    println!("{}", out.value());
    println!("level: {}", out.level());
    let raised: Vec<String> = out.raised().members().map(|f| f.to_string()).collect();
    if raised.is_empty() {
        println!("flags: none");
    } else {
        println!("flags: {}", raised.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operand_levels() {
        let ctx = Context::new();
        assert_eq!(parse_operand("-42", &ctx).unwrap(), Number::integer(-42));
        assert_eq!(
            parse_operand("6/4", &ctx).unwrap(),
            Number::rational(3, 2).unwrap()
        );
        assert_eq!(parse_operand("2.5", &ctx).unwrap(), Number::real(2.5));
        assert_eq!(parse_operand("1e3", &ctx).unwrap(), Number::real(1000.0));
        assert_eq!(
            parse_operand("0, -1", &ctx).unwrap(),
            Number::complex(0.0, -1.0)
        );
        assert!(parse_operand("abc", &ctx).is_err());
        assert!(parse_operand("1/0", &ctx).is_err());
    }

    #[test]
    fn test_decimal_literal_uses_working_precision() {
        let mut ctx = Context::new();
        ctx.set_precision(200).unwrap();
        let x = parse_operand("0.1", &ctx).unwrap();
        assert_eq!(x.precision(), Some(200));
    }

    #[test]
    fn test_flags_override_ieee_base() {
        let cli = Cli::parse_from(["mpnum", "add", "1", "2", "--ieee", "32", "--precision", "30"]);
        let ctx = build_context(&cli).unwrap();
        assert_eq!(ctx.precision(), 30);
        assert_eq!(ctx.emax(), 128);
        assert!(ctx.subnormalize());
    }

    #[test]
    fn test_traps_and_rounding_flags() {
        let cli = Cli::parse_from([
            "mpnum", "div", "1", "0.0", "--trap", "div_by_zero", "--round", "zero", "--emin",
            "-50",
        ]);
        let mut ctx = build_context(&cli).unwrap();
        assert_eq!(ctx.rounding(), RoundingMode::ToZero);
        assert_eq!(ctx.emin(), -50);
        assert!(ctx.traps().has(Flag::DivByZero));
        assert!(run(&cli).is_err());
        assert!(apply(BinaryOp::Div, 1, 0.5, &mut ctx, None).is_ok());
    }
}
