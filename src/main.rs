use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use cic_decimator::calculate;
use cic_decimator::config::{FilterConfigFile, InputRange, Signedness};
use cic_decimator::output::{OutputFormat, create_formatter};

#[derive(Parser, Debug)]
#[command(name = "cic-decimator")]
#[command(about = "Compute CIC decimator register widths with Hogenauer pruning", long_about = None)]
struct Args {
    /// TOML filter configuration file (flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input data width, in bits
    #[arg(long, conflicts_with = "input_range")]
    input_bits: Option<u32>,

    /// Input data range, as MIN-MAX (e.g. "-512-511")
    #[arg(long, allow_hyphen_values = true)]
    input_range: Option<InputRange>,

    /// Decimation ratio R
    #[arg(short, long)]
    ratio: Option<u32>,

    /// Data type
    #[arg(short, long, value_enum)]
    dtype: Option<Signedness>,

    /// Number of cascaded stages N
    #[arg(short = 'n', long)]
    stages: Option<u32>,

    /// Output data width in bits; omit for full precision
    #[arg(short = 'b', long)]
    output_bits: Option<u32>,

    /// Report format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn to_config_file(&self) -> FilterConfigFile {
        FilterConfigFile {
            ratio: self.ratio,
            stages: self.stages,
            dtype: self.dtype,
            input_bits: self.input_bits,
            input_range: self.input_range.map(|r| r.to_string()),
            output_bits: self.output_bits,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let file_config = match args.config {
        Some(ref path) => {
            FilterConfigFile::from_file(path).context("Failed to load config file")?
        }
        None => FilterConfigFile::default(),
    };
    let config = file_config
        .overlay(args.to_config_file())
        .into_config()
        .context("Invalid filter configuration")?;

    let design = calculate(&config).context("Width calculation failed")?;

    let formatter = create_formatter(args.format, args.verbose > 0);
    let report = formatter.format(&design)?;

    match args.output {
        Some(ref path) => {
            fs::write(path, &report)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", report),
    }

    Ok(())
}
