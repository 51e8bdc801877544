//! Feed adapter trait definition.

use tapgrid_core::Kline;
use tokio::sync::mpsc;

/// Events emitted by a price feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A new price sample.
    Tick(Kline),
    /// The feed is connected and streaming.
    Connected,
    /// The feed stopped.
    Disconnected,
    /// A recoverable feed error.
    Error(String),
}

/// Trait for anything that can stream samples for a symbol.
///
/// This trait uses `anyhow::Result` for flexible error handling.
pub trait FeedAdapter {
    /// Start streaming `symbol`, replacing any previous subscription.
    fn subscribe(&mut self, symbol: &str) -> anyhow::Result<mpsc::Receiver<FeedEvent>>;

    /// Stop the current subscription, if any.
    fn unsubscribe(&mut self);

    /// Currently subscribed symbol (empty when idle).
    fn symbol(&self) -> &str;
}
