//! Engine lifecycle signals.
//!
//! A closed signal set keeps the engine core independent of the
//! presentation layer: the shell (or a test) registers an observer and
//! reacts to transitions instead of handing callback closures into the
//! engine.

use super::modal::ModalKind;

/// Everything the engine announces about its own lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarSignal {
    /// Engine constructed and configuration resolved.
    Init,
    /// A full layout pass finished.
    Render,
    /// A fetch returned; the collection has been replaced.
    EventsFetched { count: usize },
    /// A fetch failed; the collection is unchanged.
    FetchFailed { error: String },
    /// A fetch finished either way; loading indicators clear here.
    FetchSettled,
    /// Events were added to the collection (create, link, override).
    EventsAdded { count: usize },
    /// An event left the collection.
    EventRemoved,
    /// The user activated an event bar.
    EventClicked { event_id: Option<i64> },
    ModalOpened { kind: ModalKind },
    ModalClosed { kind: ModalKind },
}

pub trait CalendarObserver {
    fn on_signal(&mut self, signal: &CalendarSignal);
}

/// Fan-out point for signals. Observers are notified in registration
/// order; the hub never reorders or drops signals.
#[derive(Default)]
pub struct SignalHub {
    observers: Vec<Box<dyn CalendarObserver>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Box<dyn CalendarObserver>) {
        self.observers.push(observer);
    }

    pub fn emit(&mut self, signal: CalendarSignal) {
        log::debug!("signal: {:?}", signal);
        for observer in &mut self.observers {
            observer.on_signal(&signal);
        }
    }
}

impl std::fmt::Debug for SignalHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalHub")
            .field("observers", &self.observers.len())
            .finish()
    }
}
