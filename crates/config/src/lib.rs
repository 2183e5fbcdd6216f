//! # Config - Runtime Settings
//!
//! Settings come from environment variables, each with a default:
//!
//! ```text
//! SENSORDUMP_BLOCK_SIZE    block size in bytes      (default: 4096)
//! SENSORDUMP_BLOCK_COUNT   blocks in the partition  (default: 506)
//! SENSORDUMP_FREQ          sampling frequency (Hz)  (default: 100)
//! SENSORDUMP_FILES_HEADER  output file prefix       (default: "dump")
//! ```
//!
//! A value that does not parse falls back to its default with a warning.
//! Command-line flags are applied on top by the binary, then
//! [`Settings::validate`] runs once before any work.

use std::path::PathBuf;

use partition::{Geometry, PartitionError, DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_SIZE};
use record::{RecordError, SampleClock, DEFAULT_FREQUENCY};
use thiserror::Error;
use tracing::warn;

pub const ENV_BLOCK_SIZE: &str = "SENSORDUMP_BLOCK_SIZE";
pub const ENV_BLOCK_COUNT: &str = "SENSORDUMP_BLOCK_COUNT";
pub const ENV_FREQUENCY: &str = "SENSORDUMP_FREQ";
pub const ENV_FILES_HEADER: &str = "SENSORDUMP_FILES_HEADER";

/// Default prefix of every file read or written by `dump`.
pub const DEFAULT_FILES_HEADER: &str = "dump";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Geometry(#[from] PartitionError),

    #[error(transparent)]
    Frequency(#[from] RecordError),

    #[error("files header must not be empty")]
    EmptyFilesHeader,
}

/// Everything a dump or clear run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub block_size: usize,
    pub block_count: usize,
    /// Sampling frequency in Hz, used by the paired table.
    pub frequency: u32,
    /// Prefix of `<header>_part.bin`, `<header>_data.bin` and the CSV files.
    pub files_header: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            block_count: DEFAULT_BLOCK_COUNT,
            frequency: DEFAULT_FREQUENCY,
            files_header: DEFAULT_FILES_HEADER.to_string(),
        }
    }
}

impl Settings {
    /// Reads the settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            block_size: parse_or(&lookup, ENV_BLOCK_SIZE, defaults.block_size),
            block_count: parse_or(&lookup, ENV_BLOCK_COUNT, defaults.block_count),
            frequency: parse_or(&lookup, ENV_FREQUENCY, defaults.frequency),
            files_header: lookup(ENV_FILES_HEADER).unwrap_or(defaults.files_header),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry().validate()?;
        SampleClock::from_frequency(self.frequency)?;
        if self.files_header.is_empty() {
            return Err(ConfigError::EmptyFilesHeader);
        }
        Ok(())
    }

    #[must_use]
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.block_size, self.block_count)
    }

    /// `<header>_part.bin`: the raw partition image.
    #[must_use]
    pub fn partition_path(&self) -> PathBuf {
        self.with_suffix("_part.bin")
    }

    /// `<header>_data.bin`: the linearized live range.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.with_suffix("_data.bin")
    }

    /// `<header>_data.csv`: full-fidelity table.
    #[must_use]
    pub fn full_csv_path(&self) -> PathBuf {
        self.with_suffix("_data.csv")
    }

    /// `<header>_snor.csv`: paired table.
    #[must_use]
    pub fn paired_csv_path(&self) -> PathBuf {
        self.with_suffix("_snor.csv")
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.files_header, suffix))
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, %default, "unparseable setting, using default");
            default
        }),
    }
}
