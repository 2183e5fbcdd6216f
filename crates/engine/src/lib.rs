//! # Engine - Partition Decode Orchestration
//!
//! Ties the [`partition`], [`record`] and [`sink`] crates into one decode pass
//! over a raw partition image.
//!
//! ## Pipeline
//!
//! ```text
//! image (block_count x block_size bytes)
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   DECODER                     │
//! │                                               │
//! │ locate_cursors  → write / read offsets        │
//! │       |                                       │
//! │       v                                       │
//! │ extract_live_range → linear bytes             │
//! │       |                                       │
//! │       v                                       │
//! │ pass.rs: ElementWalker → Record               │
//! │            ├─ decode_full   → sink.full_row   │
//! │            └─ decode_paired → sink.paired_row │
//! │       |                                       │
//! │       v                                       │
//! │ DecodeReport (summary, anomalies, stop)       │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                              |
//! |--------------|------------------------------------------------------|
//! | [`lib.rs`]   | `Decoder`, `DecodeReport`, `Stop`                    |
//! | `pass`       | the element loop: both policies, anomalies, stop     |
//! | [`device`]   | reading images from and programming images to files  |
//!
//! ## Failure model
//!
//! Missing cursors fail the whole decode before any row is written. Once the
//! pass runs, a bad element or a truncated sub-record stops it cleanly: every
//! row already handed to the sink stays there and the report says where and
//! why the pass stopped. A record is decoded by both policies before any of
//! its rows reach the sink, so a dropped record leaves no partial rows.
pub mod device;
mod pass;

use std::borrow::Cow;

use anyhow::{Context, Result};
use config::Settings;
use partition::{extract_live_range, locate_cursors, Cursors, Geometry};
use record::{Anomaly, RecordError, SampleClock};
use sink::{RecordSink, Summary};
use tracing::{debug, info};

/// How a decode pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop {
    /// Every element of the live range was decoded.
    Completed,
    /// The pass stopped at `offset` (in the live range) because of `reason`.
    Halted { offset: usize, reason: RecordError },
}

/// Outcome of one decode pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    pub cursors: Cursors,
    /// Length of the linearized live range.
    pub live_len: usize,
    pub summary: Summary,
    /// Non-fatal findings with the live-range offset of their element.
    pub anomalies: Vec<(usize, Anomaly)>,
    pub stop: Stop,
}

impl DecodeReport {
    /// Returns `true` if the pass reached the end of the live range.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stop == Stop::Completed
    }
}

/// Decodes partition images of one geometry at one sampling frequency.
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    geometry: Geometry,
    clock: SampleClock,
}

impl Decoder {
    /// Creates a decoder.
    ///
    /// # Errors
    ///
    /// Fails on an unusable geometry or a zero frequency.
    pub fn new(geometry: Geometry, frequency: u32) -> Result<Self> {
        geometry.validate().context("invalid partition geometry")?;
        let clock = SampleClock::from_frequency(frequency).context("invalid frequency")?;
        Ok(Self { geometry, clock })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.geometry(), settings.frequency)
    }

    #[must_use]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[must_use]
    pub fn clock(&self) -> SampleClock {
        self.clock
    }

    /// Recovers the write and read cursors of `image`.
    ///
    /// # Errors
    ///
    /// Wraps [`partition::PartitionError::CursorNotFound`] when either cursor is
    /// missing; use `downcast_ref` to inspect it.
    pub fn locate(&self, image: &[u8]) -> Result<Cursors> {
        let cursors = locate_cursors(image, &self.geometry).context("cannot locate cursors")?;
        debug!(
            write = cursors.write,
            read = cursors.read,
            elt_size = cursors.elt_size,
            wraps = cursors.wraps(),
            "cursors located"
        );
        Ok(cursors)
    }

    /// Locates the cursors and returns them with the live range, oldest byte first.
    pub fn live_range<'a>(&self, image: &'a [u8]) -> Result<(Cursors, Cow<'a, [u8]>)> {
        let cursors = self.locate(image)?;
        let live = extract_live_range(image, &cursors);
        Ok((cursors, live))
    }

    /// Runs a full decode of `image` into `sink`.
    ///
    /// # Errors
    ///
    /// Missing cursors or a failing sink. Decoding problems inside the live
    /// range are reported through [`DecodeReport::stop`] and
    /// [`DecodeReport::anomalies`] instead.
    pub fn decode<S: RecordSink>(&self, image: &[u8], sink: &mut S) -> Result<DecodeReport> {
        let (cursors, live) = self.live_range(image)?;
        self.decode_live(cursors, &live, sink)
    }

    /// Decodes an already extracted live range.
    pub fn decode_live<S: RecordSink>(
        &self,
        cursors: Cursors,
        live: &[u8],
        sink: &mut S,
    ) -> Result<DecodeReport> {
        let outcome = pass::run(live, usize::from(cursors.elt_size), &self.clock, sink)?;
        info!(
            records = outcome.summary.record_count,
            anomalies = outcome.anomalies.len(),
            complete = outcome.stop == Stop::Completed,
            "decode pass finished"
        );
        Ok(DecodeReport {
            cursors,
            live_len: live.len(),
            summary: outcome.summary,
            anomalies: outcome.anomalies,
            stop: outcome.stop,
        })
    }
}

#[cfg(test)]
mod tests;
