//! Validation utilities for live feed samples.

use tapgrid_core::Kline;

/// Validate a sample has plottable values.
pub fn validate_kline(kline: &Kline) -> bool {
    kline.is_valid()
}

/// Drops samples that are invalid or do not strictly advance in time.
#[derive(Debug, Clone, Default)]
pub struct SequenceGuard {
    last_time: Option<i64>,
    dropped: u64,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the sample should be forwarded.
    pub fn accept(&mut self, kline: &Kline) -> bool {
        if !validate_kline(kline) {
            self.dropped += 1;
            return false;
        }
        if let Some(last) = self.last_time {
            if kline.time <= last {
                self.dropped += 1;
                return false;
            }
        }
        self.last_time = Some(kline.time);
        true
    }

    /// Time of the last accepted sample.
    pub fn last_time(&self) -> Option<i64> {
        self.last_time
    }

    /// Number of samples rejected so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
