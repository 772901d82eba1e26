//! Reactive instance state on spark-signals.
//!
//! Props and data fields are `Signal<Value>`s, computed values are getters
//! evaluated on read, and each watcher is an effect over its key. Reads
//! inside an effect or a computed getter go through the signals, so
//! dependencies are tracked with no extra bookkeeping.
//!
//! # Order
//!
//! ```text
//! props -> methods -> data -> computed -> watch
//! ```
//!
//! Data initializers may read props and call methods; watchers may watch any
//! of the above.

use std::cell::RefCell;
use std::collections::HashMap;

use spark_signals::{Signal, effect, signal};
use tracing::trace;

use crate::config::{is_production, report};
use crate::error::{Diagnostic, WiringError};
use crate::options::{Getter, Item, Method, OptionKey, Watcher};
use crate::value::Value;

use super::Instance;
use super::collaborators::StateInitializer;
use super::proxy::is_reserved;

/// Where a field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Prop,
    Data,
}

#[derive(Clone)]
pub(crate) struct Field {
    pub(crate) kind: FieldKind,
    pub(crate) signal: Signal<Value>,
}

#[derive(Default)]
pub(crate) struct StateContainer {
    pub(crate) fields: HashMap<String, Field>,
    pub(crate) computed: HashMap<String, Getter>,
    pub(crate) methods: HashMap<String, Method>,
    stops: Vec<Box<dyn FnOnce()>>,
}

impl StateContainer {
    pub(crate) fn is_declared(&self, key: &str) -> bool {
        self.fields.contains_key(key)
            || self.computed.contains_key(key)
            || self.methods.contains_key(key)
    }
}

// =============================================================================
// Instance API
// =============================================================================

impl Instance {
    /// Declare a reactive field. Returns its signal.
    pub fn define_field(
        &self,
        kind: FieldKind,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Signal<Value> {
        let signal = signal(value.into());
        self.0.state.borrow_mut().fields.insert(
            name.into(),
            Field {
                kind,
                signal: signal.clone(),
            },
        );
        signal
    }

    pub fn define_computed(&self, name: impl Into<String>, getter: Getter) {
        self.0.state.borrow_mut().computed.insert(name.into(), getter);
    }

    pub fn define_method(&self, name: impl Into<String>, method: Method) {
        self.0.state.borrow_mut().methods.insert(name.into(), method);
    }

    /// Watch `key`. The watcher runs with the new and old value on every
    /// change, not for the initial value. It stops on destroy.
    pub fn watch(&self, key: impl Into<String>, watcher: Watcher) {
        let key = key.into();
        let weak = self.downgrade();
        let previous: RefCell<Option<Value>> = RefCell::new(None);
        let stop = effect(move || {
            let Some(vm) = weak.upgrade() else {
                return;
            };
            let current = vm.read(&key).unwrap_or_default();
            let old = previous.borrow_mut().replace(current.clone());
            match old {
                Some(old) if old != current => watcher.call(&vm, &current, &old),
                _ => {}
            }
        });
        self.0.state.borrow_mut().stops.push(Box::new(stop));
    }

    /// Stop every watcher.
    pub(crate) fn stop_watchers(&self) {
        let stops = std::mem::take(&mut self.0.state.borrow_mut().stops);
        for stop in stops {
            stop();
        }
    }

    /// The field kind of `key`, if it is a prop or data field.
    pub fn field_kind(&self, key: &str) -> Option<FieldKind> {
        self.0.state.borrow().fields.get(key).map(|f| f.kind)
    }
}

// =============================================================================
// SignalState
// =============================================================================

/// Built-in [`StateInitializer`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalState;

impl StateInitializer for SignalState {
    fn init_state(&self, vm: &Instance) -> Result<(), WiringError> {
        let options = vm.options();
        let config = options.config().clone();
        let checked = !is_production();

        if let Some(props) = config.map(OptionKey::Props) {
            for (name, item) in props {
                let Item::Prop(spec) = item else { continue };
                if checked && is_reserved(name) {
                    warn_reserved(vm, name);
                }
                let value = options
                    .props_data()
                    .get(name)
                    .cloned()
                    .or_else(|| spec.default.clone());
                if value.is_none() && spec.required {
                    report(Diagnostic::MissingProp {
                        uid: vm.uid(),
                        component: vm.name(),
                        key: name.clone(),
                    });
                }
                vm.define_field(FieldKind::Prop, name.clone(), value.unwrap_or_default());
            }
        }

        if let Some(methods) = config.map(OptionKey::Methods) {
            for (name, item) in methods {
                let Item::Method(method) = item else { continue };
                if checked && (is_reserved(name) || vm.field_kind(name).is_some()) {
                    warn_reserved(vm, name);
                }
                vm.define_method(name.clone(), method.clone());
            }
        }

        if let Some(data) = config.map(OptionKey::Data) {
            for (name, item) in data {
                let Item::Getter(init) = item else { continue };
                if is_reserved(name) || vm.0.state.borrow().is_declared(name) {
                    if checked {
                        warn_reserved(vm, name);
                    }
                    continue;
                }
                // The initializer may read props; no state borrow is held.
                let value = init.call(vm);
                vm.define_field(FieldKind::Data, name.clone(), value);
            }
        }

        if let Some(computed) = config.map(OptionKey::Computed) {
            for (name, item) in computed {
                let Item::Getter(getter) = item else { continue };
                if vm.0.state.borrow().is_declared(name) {
                    if checked {
                        warn_reserved(vm, name);
                    }
                    continue;
                }
                vm.define_computed(name.clone(), getter.clone());
            }
        }

        if let Some(watch) = config.map(OptionKey::Watch) {
            for (key, item) in watch {
                let Item::Watchers(watchers) = item else { continue };
                for watcher in watchers {
                    vm.watch(key.clone(), watcher.clone());
                }
            }
        }

        trace!(uid = vm.uid(), "state initialized");
        Ok(())
    }
}

fn warn_reserved(vm: &Instance, key: &str) {
    report(Diagnostic::ReservedProperty {
        uid: vm.uid(),
        component: vm.name(),
        key: key.to_string(),
    });
}
