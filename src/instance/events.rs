//! Instance events.
//!
//! Each instance has its own [`EventRegistry`]. Listeners the parent attached
//! in its template are adopted by [`ListenerWiring`] during initialization;
//! lifecycle hooks are additionally emitted as `hook:<name>` events once
//! anyone listens for one.

use std::collections::HashMap;

use crate::error::WiringError;
use crate::options::Listener;
use crate::value::Value;

use super::collaborators::EventWiring;
use super::{Instance, LifecycleFlags};

const HOOK_EVENT_PREFIX: &str = "hook:";

#[derive(Debug, Clone)]
struct Registered {
    listener: Listener,
    once: bool,
}

/// Listeners keyed by event name, in registration order.
#[derive(Debug, Default)]
pub struct EventRegistry {
    listeners: HashMap<String, Vec<Registered>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, event: impl Into<String>, listener: Listener) {
        self.add(event.into(), listener, false);
    }

    /// Register a listener removed after its first call.
    pub fn once(&mut self, event: impl Into<String>, listener: Listener) {
        self.add(event.into(), listener, true);
    }

    fn add(&mut self, event: String, listener: Listener, once: bool) {
        self.listeners
            .entry(event)
            .or_default()
            .push(Registered { listener, once });
    }

    /// Remove one listener of `event`, or all of them when `listener` is
    /// `None`.
    pub fn off(&mut self, event: &str, listener: Option<&Listener>) {
        match listener {
            None => {
                self.listeners.remove(event);
            }
            Some(listener) => {
                if let Some(registered) = self.listeners.get_mut(event) {
                    if let Some(pos) = registered.iter().position(|r| r.listener.ptr_eq(listener)) {
                        registered.remove(pos);
                    }
                    if registered.is_empty() {
                        self.listeners.remove(event);
                    }
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn has(&self, event: &str) -> bool {
        self.listeners.contains_key(event)
    }

    pub fn has_hook_listener(&self) -> bool {
        self.listeners.keys().any(|e| e.starts_with(HOOK_EVENT_PREFIX))
    }

    /// Listeners to call for one emission. One-shot listeners are removed.
    fn take_for_emit(&mut self, event: &str) -> Vec<Listener> {
        let Some(registered) = self.listeners.get_mut(event) else {
            return Vec::new();
        };
        let listeners = registered.iter().map(|r| r.listener.clone()).collect();
        registered.retain(|r| !r.once);
        if registered.is_empty() {
            self.listeners.remove(event);
        }
        listeners
    }
}

// =============================================================================
// Instance API
// =============================================================================

impl Instance {
    pub fn on(&self, event: impl Into<String>, listener: Listener) {
        let event = event.into();
        if event.starts_with(HOOK_EVENT_PREFIX) {
            self.insert_flags(LifecycleFlags::HAS_HOOK_EVENT);
        }
        self.0.events.borrow_mut().on(event, listener);
    }

    pub fn once(&self, event: impl Into<String>, listener: Listener) {
        let event = event.into();
        if event.starts_with(HOOK_EVENT_PREFIX) {
            self.insert_flags(LifecycleFlags::HAS_HOOK_EVENT);
        }
        self.0.events.borrow_mut().once(event, listener);
    }

    pub fn off(&self, event: &str, listener: Option<&Listener>) {
        self.0.events.borrow_mut().off(event, listener);
    }

    /// Call every listener of `event`. Returns how many were called.
    ///
    /// The registry is not borrowed while listeners run, so a listener may
    /// register or remove listeners.
    pub fn emit(&self, event: &str, args: &[Value]) -> usize {
        let listeners = self.0.events.borrow_mut().take_for_emit(event);
        for listener in &listeners {
            listener.call(self, args);
        }
        listeners.len()
    }

    pub(crate) fn clear_listeners(&self) {
        self.0.events.borrow_mut().clear();
    }
}

// =============================================================================
// ListenerWiring
// =============================================================================

/// Built-in [`EventWiring`]: registers the parent's listeners on the new
/// instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListenerWiring;

impl EventWiring for ListenerWiring {
    fn init_events(&self, vm: &Instance) -> Result<(), WiringError> {
        let options = vm.options();
        let mut registry = EventRegistry::new();
        for (event, listeners) in options.parent_listeners() {
            for listener in listeners {
                registry.on(event.clone(), listener.clone());
            }
        }
        if registry.has_hook_listener() {
            vm.insert_flags(LifecycleFlags::HAS_HOOK_EVENT);
        }
        *vm.0.events.borrow_mut() = registry;
        Ok(())
    }
}
