//! Tap acknowledgment ripples.
//!
//! A [`RippleBus`] broadcasts each ripple to every live [`RippleSubscription`].
//! A subscription holds one ripple at a time; a newer ripple replaces the
//! one still playing. Dropping the subscription unregisters it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

/// A tap to acknowledge, in screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Ripple {
    /// Key of the cell that was tapped.
    pub key: String,
    pub x: f64,
    pub y: f64,
}

/// One animation frame of a ripple.
#[derive(Debug, Clone, PartialEq)]
pub struct RippleFrame {
    pub key: String,
    pub x: f64,
    pub y: f64,
    /// Grows 0 -> 1.
    pub scale: f64,
    /// Fades 1 -> 0.
    pub opacity: f64,
}

#[derive(Debug)]
struct Slot {
    ripple: Ripple,
    started: Instant,
}

#[derive(Debug)]
struct Listeners {
    duration: Duration,
    next_id: u64,
    slots: BTreeMap<u64, Option<Slot>>,
}

/// Publisher side, cheap to clone.
#[derive(Debug, Clone)]
pub struct RippleBus {
    inner: Rc<RefCell<Listeners>>,
}

impl RippleBus {
    pub fn new(duration: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Listeners {
                duration,
                next_id: 0,
                slots: BTreeMap::new(),
            })),
        }
    }

    /// Register a new listener.
    pub fn subscribe(&self) -> RippleSubscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.slots.insert(id, None);
        RippleSubscription {
            id,
            bus: Rc::downgrade(&self.inner),
        }
    }

    /// Broadcast a ripple starting at `now`.
    pub fn add_ripple(&self, ripple: Ripple, now: Instant) {
        let mut inner = self.inner.borrow_mut();
        for slot in inner.slots.values_mut() {
            *slot = Some(Slot {
                ripple: ripple.clone(),
                started: now,
            });
        }
    }

    /// Drop every playing ripple; subscriptions stay registered.
    pub fn clear(&self) {
        for slot in self.inner.borrow_mut().slots.values_mut() {
            *slot = None;
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }
}

/// Listener side. Unsubscribes on drop.
#[derive(Debug)]
pub struct RippleSubscription {
    id: u64,
    bus: Weak<RefCell<Listeners>>,
}

impl RippleSubscription {
    /// Current frame of this subscription's ripple, clearing it once finished.
    pub fn frame(&self, now: Instant) -> Option<RippleFrame> {
        let bus = self.bus.upgrade()?;
        let mut inner = bus.borrow_mut();
        let duration = inner.duration;
        let slot = inner.slots.get_mut(&self.id)?;

        let playing = slot.as_ref()?;
        let elapsed = now.saturating_duration_since(playing.started);
        if duration.is_zero() || elapsed >= duration {
            *slot = None;
            return None;
        }

        let t = elapsed.as_secs_f64() / duration.as_secs_f64();
        Some(RippleFrame {
            key: playing.ripple.key.clone(),
            x: playing.ripple.x,
            y: playing.ripple.y,
            scale: t,
            opacity: 1.0 - t,
        })
    }

    pub fn is_playing(&self) -> bool {
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        let inner = bus.borrow();
        matches!(inner.slots.get(&self.id), Some(Some(_)))
    }
}

impl Drop for RippleSubscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut().slots.remove(&self.id);
        }
    }
}
