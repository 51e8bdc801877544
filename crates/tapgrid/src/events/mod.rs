//! Engine-to-host event plumbing.

pub mod bus;
pub mod types;

pub use bus::EventBus;
pub use types::{ChartEvent, Command, TapRejection};
