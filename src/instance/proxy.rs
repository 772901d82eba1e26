//! Property access.
//!
//! [`Instance::get`] looks a key up across props, data, computed values and
//! injections. In development mode the access guard is installed during
//! initialization and a read of a key that is declared nowhere reports
//! [`Diagnostic::UndeclaredProperty`]. In production there is no guard and
//! such reads are silently `None`.

use crate::config::{RuntimeConfig, report};
use crate::error::Diagnostic;
use crate::options::{Getter, Method};
use crate::value::Value;

use super::Instance;

/// Names starting with `$` or `_` belong to the runtime.
pub(crate) fn is_reserved(name: &str) -> bool {
    name.starts_with('$') || name.starts_with('_')
}

/// Install the access guard, unless running in production.
pub(crate) fn init_proxy(vm: &Instance, config: &RuntimeConfig) {
    vm.0.guarded.set(!config.production);
}

enum Slot {
    Field(spark_signals::Signal<Value>),
    Computed(Getter),
    Injected(Option<Value>),
}

impl Instance {
    /// Read a property. Reads are tracked when done inside an effect.
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = self.read(key);
        if value.is_none() && self.0.guarded.get() && !self.has(key) {
            report(Diagnostic::UndeclaredProperty {
                uid: self.uid(),
                component: self.name(),
                key: key.to_string(),
            });
        }
        value
    }

    /// Unguarded read.
    pub(crate) fn read(&self, key: &str) -> Option<Value> {
        let slot = {
            let state = self.0.state.borrow();
            state
                .fields
                .get(key)
                .map(|f| Slot::Field(f.signal.clone()))
                .or_else(|| state.computed.get(key).cloned().map(Slot::Computed))
        };
        let slot = slot.or_else(|| {
            self.0
                .injected
                .borrow()
                .get(key)
                .cloned()
                .map(Slot::Injected)
        });

        // No borrow is held here: getters read other properties.
        match slot? {
            Slot::Field(signal) => Some(signal.get()),
            Slot::Computed(getter) => Some(getter.call(self)),
            Slot::Injected(value) => value,
        }
    }

    /// Whether `key` is declared as a field, computed value, method or
    /// injection.
    pub fn has(&self, key: &str) -> bool {
        self.0.state.borrow().is_declared(key) || self.0.injected.borrow().contains_key(key)
    }

    /// Write a field. Returns `false` if `key` is not a prop or data field.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let signal = self
            .0
            .state
            .borrow()
            .fields
            .get(key)
            .map(|f| f.signal.clone());
        match signal {
            Some(signal) => {
                signal.set(value.into());
                true
            }
            None => {
                if self.0.guarded.get() {
                    report(Diagnostic::UndeclaredProperty {
                        uid: self.uid(),
                        component: self.name(),
                        key: key.to_string(),
                    });
                }
                false
            }
        }
    }

    /// Call a method. `None` if no method is declared under `name`.
    pub fn call(&self, name: &str, args: &[Value]) -> Option<Value> {
        let method: Option<Method> = self.0.state.borrow().methods.get(name).cloned();
        match method {
            Some(method) => Some(method.call(self, args)),
            None => {
                if self.0.guarded.get() {
                    report(Diagnostic::UndeclaredProperty {
                        uid: self.uid(),
                        component: self.name(),
                        key: name.to_string(),
                    });
                }
                None
            }
        }
    }

    /// Whether reads of undeclared keys are reported.
    pub fn is_guarded(&self) -> bool {
        self.0.guarded.get()
    }
}
