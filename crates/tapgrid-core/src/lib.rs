//! Core types for the tapgrid chart engine.
//!
//! This crate holds the data model shared by every other crate and has no
//! dependencies beyond `serde`:
//! - `Kline` - a single feed sample (time, price)
//! - `Domain` / `ViewportBounding` - axis ranges and the pixel viewport
//! - `GridCell` / `PairConstants` - discrete cells and per-pair grid gaps
//! - `Order` / `OrderGroup` / `ProbabilityCell` - what gets drawn on the grid

pub mod domain;
pub mod grid;
pub mod kline;
pub mod order;

pub use domain::{Axis, Domain, DomainPos, ViewportBounding};
pub use grid::{decimal_digits, round_to, GridCell, PairConstants, KEY_PRECISION};
pub use kline::Kline;
pub use order::{MarkerLayout, Order, OrderGroup, OrderRequest, OrderStatus, ProbabilityCell};
