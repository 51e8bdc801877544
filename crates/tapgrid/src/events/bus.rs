//! Event bus for queuing engine events and host commands.
//!
//! The engine pushes into the [`EventBus`] while it handles input, feed
//! samples and ticks. The host drains both queues once per frame.

use std::collections::VecDeque;

use super::types::{ChartEvent, Command};

/// Two FIFO queues: events to observe and commands to execute.
///
/// # Usage Pattern
///
/// ```ignore
/// engine.tick(Instant::now());
///
/// for event in engine.events().drain_events() {
///     if let ChartEvent::OrderFailed { reason, .. } = event {
///         toast(reason);
///     }
/// }
/// for cmd in engine.events().take_commands() {
///     if let Command::SubmitOrder(request) = cmd {
///         let result = gateway.submit(&request);
///         engine.complete_order(&request.temp_id, result);
///     }
/// }
/// ```
#[derive(Debug, Default)]
pub struct EventBus {
    events: VecDeque<ChartEvent>,
    commands: VecDeque<Command>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the host.
    pub fn emit(&mut self, event: ChartEvent) {
        self.events.push_back(event);
    }

    /// Queue a command for the host.
    ///
    /// Consecutive redraw requests collapse into one.
    pub fn dispatch(&mut self, cmd: Command) {
        if cmd == Command::RequestRedraw && self.commands.contains(&Command::RequestRedraw) {
            return;
        }
        self.commands.push_back(cmd);
    }

    /// Drain all pending events in FIFO order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ChartEvent> + '_ {
        self.events.drain(..)
    }

    /// Take all pending events as an owned `Vec`.
    #[must_use]
    pub fn take_events(&mut self) -> Vec<ChartEvent> {
        self.events.drain(..).collect()
    }

    /// Take all pending commands as an owned `Vec`.
    #[must_use]
    pub fn take_commands(&mut self) -> Vec<Command> {
        self.commands.drain(..).collect()
    }

    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    #[must_use]
    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Drop everything queued.
    pub fn clear(&mut self) {
        self.events.clear();
        self.commands.clear();
    }
}
