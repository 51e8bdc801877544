//! Tapgrid - a real-time grid trading chart engine.
//!
//! A live price line scrolls across a grid of time x price cells. Tapping a
//! cell in the future places a bet that the price will touch it. The engine
//! keeps the viewport following the live price, supports manual panning with
//! an animated recenter, overlays per-cell payout multipliers computed off
//! the main thread, and aggregates everyone's orders into per-cell markers.
//!
//! Everything except the probability worker runs on the caller's thread;
//! the host drives it through [`GridChartEngine::tick`].

pub mod controller;
pub mod coords;
pub mod engine;
pub mod events;
pub mod input;
pub mod orders;
pub mod pan;
pub mod probability;
pub mod recenter;
pub mod ripple;
pub mod smoother;
pub mod snap;
pub mod snapshot;
pub mod tween;

pub use controller::{ChartController, FollowMode};
pub use coords::{CoordinateSystem, ScreenPos, ScreenRect};
pub use engine::GridChartEngine;
pub use events::{ChartEvent, Command, EventBus, TapRejection};
pub use input::{InputAction, InputHandler, PointerEvent};
pub use orders::OrderBook;
pub use ripple::{Ripple, RippleBus, RippleFrame, RippleSubscription};
pub use snap::{GridSnapResolver, SnapRejection};
pub use snapshot::FrameSnapshot;
