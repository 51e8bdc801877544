//! Feed sample data structure.

use serde::{Deserialize, Serialize};

use crate::domain::DomainPos;

/// A single price sample from the feed.
///
/// `time` is a unix timestamp in milliseconds. Within one feed, times are
/// strictly increasing; consumers drop anything that is not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub time: i64,
    pub price: f64,
}

impl Kline {
    pub fn new(time: i64, price: f64) -> Self {
        Self { time, price }
    }

    /// Position of this sample in domain space.
    pub fn pos(&self) -> DomainPos {
        DomainPos::new(self.time as f64, self.price)
    }

    /// Whether the sample can be plotted at all.
    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0 && self.time >= 0
    }

    /// Whether this sample strictly follows `previous` in time.
    pub fn follows(&self, previous: &Kline) -> bool {
        self.time > previous.time
    }
}
