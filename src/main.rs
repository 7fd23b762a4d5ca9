//! icm426xx-sim: run a scripted session against the ICM-426xx model

use std::env;

use anyhow::{bail, Context};
use icm426xx_sim::config::Config;
use icm426xx_sim::device::odr;
use icm426xx_sim::device::registers::{
    ACCEL_CONFIG0, ACCEL_CONFIG2, INT_FIFO_FULL, INT_FIFO_WATERMARK, PWR_MGMT0, PWR_SAMPLING_ENABLE,
};
use icm426xx_sim::emu::Simulator;

/// Command-line options.
struct Options {
    odr: u8,
    duration_ms: u64,
    watermark: u16,
    seed: Option<u64>,
    dump_registers: bool,
    max_print: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            odr: 6,
            duration_ms: 20,
            watermark: 0,
            seed: None,
            dump_registers: false,
            max_print: 16,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    if args.iter().any(|a| a == "--sample-config") {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    let options = parse_args(&args[1..])?;

    let mut config = Config::load();
    if options.seed.is_some() {
        config.seed = options.seed;
    }
    log::debug!("Effective configuration: {:?}", config);

    let period = odr::period_ns(options.odr)
        .with_context(|| format!("ODR code {} has no defined rate (use 1-15)", options.odr))?;

    let mut sim = Simulator::from_config(&config);

    println!(
        "ICM-426xx model: ODR code {} ({} ns period), {} ms, watermark {}",
        options.odr, period, options.duration_ms, options.watermark
    );
    println!();

    // Configure: watermark, rate, then enable sampling
    sim.write_registers(ACCEL_CONFIG2, &options.watermark.to_le_bytes());
    sim.write_registers(ACCEL_CONFIG0, &[options.odr]);
    sim.write_registers(PWR_MGMT0, &[PWR_SAMPLING_ENABLE]);

    let ticks = sim.advance_ns(options.duration_ms * 1_000_000);

    let status = sim.read_int_status();
    let count = sim.fifo_count();

    println!("Sample ticks:  {}", ticks);
    println!("FIFO count:    {} records", count);
    println!(
        "INT_STATUS:    0x{:02X}{}{}",
        status,
        if status & INT_FIFO_FULL != 0 { " FIFO_FULL" } else { "" },
        if status & INT_FIFO_WATERMARK != 0 { " WATERMARK" } else { "" },
    );

    let records = sim.drain_records(count as usize);
    println!();
    println!("Records ({} drained):", records.len());
    for (i, rec) in records.iter().take(options.max_print).enumerate() {
        println!(
            "  [{:3}] t={:5}us accel=({:6},{:6},{:6}) gyro=({:6},{:6},{:6}) temp={}",
            i,
            rec.timestamp,
            rec.accel[0],
            rec.accel[1],
            rec.accel[2],
            rec.gyro[0],
            rec.gyro[1],
            rec.gyro[2],
            rec.temperature
        );
    }
    if records.len() > options.max_print {
        println!("  ... ({} more)", records.len() - options.max_print);
    }

    println!();
    sim.print_status();

    if options.dump_registers {
        println!();
        sim.print_registers();
    }

    Ok(())
}

/// Parse command-line arguments (program name excluded).
fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--odr" => options.odr = next_value(&mut iter, arg)?,
            "--duration-ms" => options.duration_ms = next_value(&mut iter, arg)?,
            "--watermark" => options.watermark = next_value(&mut iter, arg)?,
            "--seed" => options.seed = Some(next_value(&mut iter, arg)?),
            "--print" => options.max_print = next_value(&mut iter, arg)?,
            "--dump-registers" => options.dump_registers = true,
            other => bail!("Unknown argument: {}", other),
        }
    }

    Ok(options)
}

fn next_value<'a, T>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = iter
        .next()
        .with_context(|| format!("{} requires a value", flag))?;
    raw.parse()
        .with_context(|| format!("Invalid value for {}: {}", flag, raw))
}

fn print_usage() {
    println!("icm426xx-sim - ICM-426xx SPI behavioral model");
    println!();
    println!("Usage: icm426xx-sim [options]");
    println!();
    println!("Options:");
    println!("  --odr CODE         ACCEL_CONFIG0 ODR code, 1-15 (default 6 = 1 kHz)");
    println!("  --duration-ms N    Simulated time to run (default 20)");
    println!("  --watermark N      FIFO watermark in records (default 0)");
    println!("  --seed N           Noise seed (overrides config)");
    println!("  --print N          Records to print (default 16)");
    println!("  --dump-registers   Print the modeled registers at the end");
    println!("  --sample-config    Print a sample config file and exit");
}
