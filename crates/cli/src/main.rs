//! # sensordump - Raw Data Partition Tool
//!
//! Decodes a dump of the sensor log partition, or produces an image that
//! erases it.
//!
//! ## Commands
//!
//! ```text
//! dump   [-f HEADER] [--csv] [--frequency HZ] [--image PATH]
//!        read <HEADER>_part.bin (or PATH), write <HEADER>_data.bin,
//!        with --csv also <HEADER>_data.csv and <HEADER>_snor.csv
//! clear  [--output PATH]
//!        write an all-0xFF partition image (default: erase.bin)
//! ```
//!
//! ## Configuration
//!
//! ```text
//! SENSORDUMP_BLOCK_SIZE    block size in bytes      (default: 4096)
//! SENSORDUMP_BLOCK_COUNT   blocks in the partition  (default: 506)
//! SENSORDUMP_FREQ          sampling frequency (Hz)  (default: 100)
//! SENSORDUMP_FILES_HEADER  output file prefix       (default: "dump")
//! RUST_LOG                 log filter on stderr     (default: "info")
//! ```
//!
//! Flags win over the environment.
//!
//! ## Example
//!
//! ```text
//! $ sensordump dump --csv
//! write cursor: 0x0001A2F4
//! read cursor:  0x00113A10
//! live range:   652016 bytes -> dump_data.bin
//! records:      12093
//! first:        81237 (0x00013D55)
//! last:         201722 (0x0003143A)
//! duration:     120485 ms
//! anomalies:    0
//! stop:         completed
//! ```

mod report;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Settings;
use engine::device::{clear, DumpFile, EraseFile, PartitionSource};
use engine::Decoder;
use sink::{CsvSink, NullSink};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sensordump", version, about = "Decode or erase the raw sensor data partition")]
struct Cli {
    #[command(flatten)]
    geometry: GeometryArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GeometryArgs {
    /// Block size in bytes
    #[arg(long, global = true)]
    block_size: Option<usize>,

    /// Number of blocks in the partition
    #[arg(long, global = true)]
    block_count: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a partition dump
    Dump(DumpArgs),
    /// Write an image that erases the partition
    Clear(ClearArgs),
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Prefix of the files read and written
    #[arg(short = 'f', long)]
    files_header: Option<String>,

    /// Also write the full-fidelity and paired CSV tables
    #[arg(long)]
    csv: bool,

    /// Sampling frequency in Hz used to timestamp paired rows
    #[arg(long)]
    frequency: Option<u32>,

    /// Partition image to read instead of <HEADER>_part.bin
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ClearArgs {
    /// Where to write the erase image
    #[arg(short, long, default_value = "erase.bin")]
    output: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(size) = cli.geometry.block_size {
        settings.block_size = size;
    }
    if let Some(count) = cli.geometry.block_count {
        settings.block_count = count;
    }

    match cli.command {
        Command::Dump(args) => {
            if let Some(header) = args.files_header {
                settings.files_header = header;
            }
            if let Some(frequency) = args.frequency {
                settings.frequency = frequency;
            }
            settings.validate().context("invalid settings")?;
            dump(&settings, args.image, args.csv)
        }
        Command::Clear(args) => {
            settings.validate().context("invalid settings")?;
            let target = EraseFile::new(&args.output);
            let bytes = clear(&settings.geometry(), &target)?;
            println!("erase image: {} bytes -> {}", bytes, args.output.display());
            Ok(())
        }
    }
}

fn dump(settings: &Settings, image: Option<PathBuf>, csv: bool) -> Result<()> {
    let image_path = image.unwrap_or_else(|| settings.partition_path());
    info!(
        image = %image_path.display(),
        block_size = settings.block_size,
        block_count = settings.block_count,
        frequency = settings.frequency,
        "decoding partition"
    );

    let image = DumpFile::new(settings.geometry()).fetch(&image_path)?;
    let decoder = Decoder::from_settings(settings)?;
    let (cursors, live) = decoder.live_range(&image)?;
    print!("{}", report::cursors(&cursors));

    let data_path = settings.data_path();
    fs::write(&data_path, &live)
        .with_context(|| format!("writing live range to {}", data_path.display()))?;
    println!("live range:   {} bytes -> {}", live.len(), data_path.display());

    let report = if csv {
        let (full, paired) = (settings.full_csv_path(), settings.paired_csv_path());
        let mut sink = CsvSink::create(&full, &paired).context("creating csv tables")?;
        let report = decoder.decode_live(cursors, &live, &mut sink)?;
        println!("csv tables:   {}, {}", full.display(), paired.display());
        report
    } else {
        decoder.decode_live(cursors, &live, &mut NullSink)?
    };
    print!("{}", report::summary(&report));
    Ok(())
}
