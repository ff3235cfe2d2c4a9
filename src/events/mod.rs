// src/events/mod.rs

//! Per-task lifecycle events.
//!
//! Each magic task owns one [`EventChannel`]. Subscribers register for a
//! single [`EventKind`] and are called synchronously, in subscription order,
//! from inside the task's own control flow. For one invocation the events
//! are totally ordered:
//!
//! `start` < `prebuild` < (`build` xor `error`) < `end`
//!
//! `prebuild` is skipped when discovery fails.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::errors::MagicError;
use crate::exec::BuildInfo;

/// The closed set of event kinds a magic task emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Prebuild,
    Build,
    Error,
    End,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Start => "start",
            EventKind::Prebuild => "prebuild",
            EventKind::Build => "build",
            EventKind::Error => "error",
            EventKind::End => "end",
        };
        f.write_str(s)
    }
}

/// An event together with its payload.
#[derive(Debug, Clone, Copy)]
pub enum MagicEvent<'a> {
    /// The task invocation began.
    Start,
    /// Discovery finished: explicitly registered nodes and targets.
    Prebuild {
        nodes: &'a [String],
        targets: &'a [String],
    },
    /// The build finished successfully (possibly with nothing built).
    Build(&'a BuildInfo),
    /// Discovery or the nested build failed.
    Error(&'a MagicError),
    /// The task invocation is over, whatever the outcome.
    End,
}

impl MagicEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            MagicEvent::Start => EventKind::Start,
            MagicEvent::Prebuild { .. } => EventKind::Prebuild,
            MagicEvent::Build(_) => EventKind::Build,
            MagicEvent::Error(_) => EventKind::Error,
            MagicEvent::End => EventKind::End,
        }
    }
}

type Handler = Arc<dyn Fn(&MagicEvent<'_>) + Send + Sync>;

/// Typed, synchronous publish/subscribe bus.
#[derive(Default)]
pub struct EventChannel {
    subscribers: Mutex<Vec<(EventKind, Handler)>>,
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &self.subscribers().len())
            .finish()
    }
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to events of `kind`.
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&MagicEvent<'_>) + Send + Sync + 'static,
    {
        self.subscribers().push((kind, Arc::new(handler)));
    }

    /// Deliver `event` to every subscriber of its kind, in subscription order.
    ///
    /// The subscriber list is snapshotted first, so a handler may itself
    /// subscribe without deadlocking; such a subscriber only sees later
    /// events.
    pub fn emit(&self, event: MagicEvent<'_>) {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .subscribers()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, h)| Arc::clone(h))
            .collect();

        trace!(event = %kind, handlers = handlers.len(), "emitting event");

        for handler in handlers {
            handler(&event);
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<(EventKind, Handler)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
