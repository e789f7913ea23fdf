//! Observer notifications.
//!
//! Observers are invoked synchronously, in subscription order, at the end of the
//! operation that raised the notification. They receive the notification by value and
//! have no access to the controller.

use crate::core::breakpoint::BreakpointHit;
use std::fmt;

/// Events raised by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A forward clock completed. Carries the new cycle count.
    Clocked {
        /// Cycle count after the clock.
        cycle: u64,
    },
    /// A clock was undone. Carries the restored cycle count.
    Reversed {
        /// Cycle count after the reversal.
        cycle: u64,
    },
    /// The processor was reset.
    Reset,
    /// A breakpoint address entered a stage during the latest clock.
    BreakpointHit(BreakpointHit),
    /// The pipeline drained after finalization began.
    Finished {
        /// Cycle count at which the last instruction left.
        cycle: u64,
    },
}

/// Handle identifying a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&Notification)>;

/// Ordered list of observers.
#[derive(Default)]
pub struct Observers {
    observers: Vec<(ObserverId, Observer)>,
    next_id: u64,
}

impl Observers {
    /// Adds an observer; it runs after every existing one.
    pub fn subscribe(&mut self, observer: impl FnMut(&Notification) + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Returns false for an unknown id.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Delivers `notification` to every observer in order.
    pub fn notify(&mut self, notification: &Notification) {
        for (_, observer) in &mut self.observers {
            observer(notification);
        }
    }

    /// Number of observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// True if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.observers.len())
            .finish()
    }
}
