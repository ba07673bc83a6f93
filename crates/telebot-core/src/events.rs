//! Named event registry.
//!
//! Command events are named after the command, so names are plain strings
//! resolved at runtime. Handlers for one name run in registration order.

use crate::{
    error::BotError,
    types::{CallbackQuery, Message},
};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

pub const MESSAGE: &str = "message";
pub const CALLBACK_QUERY: &str = "callback_query";
pub const RETRY: &str = "retry";
pub const ERROR: &str = "error";

/// Everything the client emits.
#[derive(Debug)]
pub enum Event {
    /// Every received message, new or edited.
    Message(Message),
    /// A `/command`, emitted under the command's own name.
    Command {
        name: String,
        message: Message,
        args: Option<Vec<String>>,
        target: Option<String>,
    },
    CallbackQuery(CallbackQuery),
    /// A host-not-found failure is being retried; `attempt` starts at 2.
    Retry { attempt: u32 },
    /// A poll failed. The loop keeps its own decision on whether to continue.
    Error(BotError),
}

impl Event {
    /// The registry name this event is emitted under.
    pub fn name(&self) -> &str {
        match self {
            Self::Message(_) => MESSAGE,
            Self::Command { name, .. } => name,
            Self::CallbackQuery(_) => CALLBACK_QUERY,
            Self::Retry { .. } => RETRY,
            Self::Error(_) => ERROR,
        }
    }
}

pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Mapping from event name to its ordered handlers.
#[derive(Default, Clone)]
pub struct EventRegistry {
    handlers: Arc<RwLock<HashMap<String, Vec<Handler>>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `name`.
    pub fn on<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.into())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Drop every handler registered for `name`.
    pub fn off(&self, name: &str) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Call the handlers for the event's own name. Returns how many ran.
    pub fn emit(&self, event: &Event) -> usize {
        // Snapshot so handlers may register further handlers.
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event.name())
            .cloned()
            .unwrap_or_default();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("EventRegistry").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_handlers_run_in_registration_order() {
        let registry = EventRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            registry.on(RETRY, move |_| seen.lock().unwrap().push(tag));
        }

        let ran = registry.emit(&Event::Retry { attempt: 2 });
        assert_eq!(ran, 3);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_emit_without_handlers() {
        let registry = EventRegistry::new();
        assert_eq!(registry.emit(&Event::Retry { attempt: 2 }), 0);
    }

    #[test]
    fn test_off_removes_handlers() {
        let registry = EventRegistry::new();
        registry.on(ERROR, |_| {});
        assert_eq!(registry.handler_count(ERROR), 1);
        registry.off(ERROR);
        assert_eq!(registry.handler_count(ERROR), 0);
    }

    #[test]
    fn test_handler_may_register_handler() {
        let registry = EventRegistry::new();
        let inner = registry.clone();
        registry.on(RETRY, move |_| inner.on(ERROR, |_| {}));
        registry.emit(&Event::Retry { attempt: 2 });
        assert_eq!(registry.handler_count(ERROR), 1);
    }

    #[test]
    fn test_command_event_name() {
        let message: Message =
            serde_json::from_str(r#"{"message_id": 1, "chat": {"id": 1}}"#).unwrap();
        let event = Event::Command {
            name: "start".into(),
            message,
            args: None,
            target: None,
        };
        assert_eq!(event.name(), "start");
    }
}
