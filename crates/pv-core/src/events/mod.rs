use std::any::TypeId;
use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Session event bus
///
/// Handlers are registered per event type and run synchronously on the
/// publishing thread.
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Events published by the session controller
pub mod events {
    use super::Event;
    use crate::SessionId;

    /// A file finished loading and its session is now current
    #[derive(Debug, Clone)]
    pub struct SessionLoaded {
        pub session_id: SessionId,
        pub source_name: String,
        pub column_count: usize,
        pub preview_rows: usize,
    }

    /// A file could not be loaded; the previous session stays current
    #[derive(Debug, Clone)]
    pub struct SessionLoadFailed {
        pub source_name: String,
        pub error: String,
    }

    /// A statement finished and its result replaced the current one
    #[derive(Debug, Clone)]
    pub struct QueryCompleted {
        pub session_id: SessionId,
        pub statement: String,
        pub row_count: usize,
        pub column_count: usize,
    }

    /// A statement failed; the previous result is kept
    #[derive(Debug, Clone)]
    pub struct QueryFailed {
        pub session_id: SessionId,
        pub statement: String,
        pub error: String,
    }

    /// A query finished after its session was replaced
    #[derive(Debug, Clone)]
    pub struct StaleResultDropped {
        pub session_id: SessionId,
        pub statement: String,
    }

    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        SessionLoaded,
        SessionLoadFailed,
        QueryCompleted,
        QueryFailed,
        StaleResultDropped
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_insert_with(Vec::new).push(handler);
    }

    /// Publish an event
    ///
    /// Handlers must not publish from inside `handle`.
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = TypeId::of::<E>();
        let mut handlers = self.handlers.lock();

        if let Some(event_handlers) = handlers.get_mut(&type_id) {
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event handler backed by a closure
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

/// Create a handler that only sees events of type `E`
pub fn typed_handler<E, F>(mut f: F) -> Box<dyn EventHandler>
where
    E: Event,
    F: FnMut(&E) + Send + Sync + 'static,
{
    handler_from_fn(move |event| {
        if let Some(event) = event.as_any().downcast_ref::<E>() {
            f(event);
        }
    })
}
