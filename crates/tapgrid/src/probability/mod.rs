//! Payout multipliers for the visible grid, computed off the render thread.

pub mod model;
pub mod worker;

pub use model::{compute_cells, normal_cdf, touch_probability, PayoutParams, ProbabilityRequest};
pub use worker::{ProbabilityResult, ProbabilityWorker, WorkerError};
