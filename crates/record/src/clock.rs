use crate::RecordError;

/// Default sensor sampling frequency in Hz.
pub const DEFAULT_FREQUENCY: u32 = 100;

/// Back-computes sample timestamps for a record holding samples taken at a
/// fixed rate.
///
/// A record carries one timestamp, the time of its most recent sample. Samples
/// are stored oldest first, so sample `i` of `n` was taken
/// `(n - 1 - i) * period` milliseconds before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleClock {
    period_ms: u32,
}

impl Default for SampleClock {
    fn default() -> Self {
        Self {
            period_ms: 1000 / DEFAULT_FREQUENCY,
        }
    }
}

impl SampleClock {
    /// Creates a clock for `frequency` Hz. The period is `1000 / frequency`
    /// truncated to whole milliseconds, so frequencies above 1 kHz give a zero
    /// period and every sample gets the record timestamp.
    ///
    /// # Errors
    ///
    /// [`RecordError::InvalidFrequency`] for a zero frequency.
    pub fn from_frequency(frequency: u32) -> Result<Self, RecordError> {
        if frequency == 0 {
            return Err(RecordError::InvalidFrequency);
        }
        Ok(Self {
            period_ms: 1000 / frequency,
        })
    }

    /// Milliseconds between two consecutive samples.
    #[must_use]
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Timestamp of sample `index` out of `count`, given the record timestamp.
    #[must_use]
    pub fn timestamp(&self, record_timestamp: u32, index: usize, count: usize) -> i64 {
        let behind = count.saturating_sub(1).saturating_sub(index) as i64;
        i64::from(record_timestamp) - behind * i64::from(self.period_ms)
    }
}
