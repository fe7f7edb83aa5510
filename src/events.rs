//! In-process event channel attached to every generator.
//!
//! Handlers are called synchronously, in registration order, with no lock held.

use crate::error::GenerateError;
use crate::generator::Generator;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Event names a handler can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A generator was registered on, or fetched through, this instance
    Generator,
    /// A task list is about to run
    Generate,
    /// A generate call failed; propagates to every ancestor
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Generator => "generator",
            EventKind::Generate => "generate",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a `generator` notification was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorAction {
    Registered,
    Fetched,
}

#[derive(Clone)]
pub enum GeneratorEvent {
    Generator {
        action: GeneratorAction,
        generator: Arc<Generator>,
    },
    Generate {
        alias: String,
        tasks: Vec<String>,
        generator: Arc<Generator>,
    },
    Error(Arc<GenerateError>),
}

impl GeneratorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GeneratorEvent::Generator { .. } => EventKind::Generator,
            GeneratorEvent::Generate { .. } => EventKind::Generate,
            GeneratorEvent::Error(_) => EventKind::Error,
        }
    }
}

impl fmt::Debug for GeneratorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorEvent::Generator { action, generator } => f
                .debug_struct("Generator")
                .field("action", action)
                .field("generator", &generator.alias())
                .finish(),
            GeneratorEvent::Generate { alias, tasks, .. } => f
                .debug_struct("Generate")
                .field("alias", alias)
                .field("tasks", tasks)
                .finish(),
            GeneratorEvent::Error(err) => f.debug_tuple("Error").field(err).finish(),
        }
    }
}

pub type Handler = Arc<dyn Fn(&GeneratorEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventChannel {
    handlers: RwLock<Vec<(EventKind, Handler)>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&GeneratorEvent) + Send + Sync + 'static,
    {
        self.handlers.write().push((kind, Arc::new(handler)));
    }

    /// Deliver `event` to matching handlers; returns how many ran.
    pub fn emit(&self, event: &GeneratorEvent) -> usize {
        let kind = event.kind();
        let matching: Vec<Handler> = self
            .handlers
            .read()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in &matching {
            handler(event);
        }
        matching.len()
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("handlers", &self.handlers.read().len())
            .finish()
    }
}
