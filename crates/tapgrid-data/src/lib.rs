//! External adapters for tapgrid: price feeds and order submission.

pub mod gateway;
pub mod live;
pub mod source;
pub mod validation;

pub use gateway::{OrderGateway, PaperGateway, SubmitError};
pub use live::SimulatedFeed;
pub use source::{FeedAdapter, FeedEvent};
pub use validation::SequenceGuard;
