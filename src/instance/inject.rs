//! Provide / inject.
//!
//! Injections are resolved before state, so data initializers can use them.
//! Provisions are resolved after state, so provider getters can read the
//! instance's own data.

use std::collections::HashMap;

use crate::config::report;
use crate::error::{Diagnostic, WiringError};
use crate::options::{Item, OptionKey};
use crate::value::Value;

use super::Instance;
use super::collaborators::Injector;

/// Built-in [`Injector`]: looks injections up along the parent chain,
/// nearest provider first.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParentChainInjector;

impl Injector for ParentChainInjector {
    fn resolve_injections(&self, vm: &Instance) -> Result<(), WiringError> {
        let options = vm.options();
        let Some(inject) = options.config().map(OptionKey::Inject) else {
            return Ok(());
        };

        let mut resolved = HashMap::with_capacity(inject.len());
        for (local, item) in inject {
            let Item::Inject(spec) = item else { continue };
            let value = lookup_provided(vm, &spec.from).or_else(|| spec.default.clone());
            if value.is_none() {
                report(Diagnostic::MissingInjection {
                    uid: vm.uid(),
                    component: vm.name(),
                    key: spec.from.clone(),
                });
            }
            resolved.insert(local.clone(), value);
        }
        *vm.0.injected.borrow_mut() = resolved;
        Ok(())
    }

    fn resolve_provisions(&self, vm: &Instance) -> Result<(), WiringError> {
        let options = vm.options();
        let Some(provide) = options.config().map(OptionKey::Provide) else {
            return Ok(());
        };

        let mut provided = HashMap::with_capacity(provide.len());
        for (name, item) in provide {
            if let Item::Getter(getter) = item {
                provided.insert(name.clone(), getter.call(vm));
            }
        }
        *vm.0.provided.borrow_mut() = provided;
        Ok(())
    }
}

fn lookup_provided(vm: &Instance, key: &str) -> Option<Value> {
    let mut source = vm.parent();
    while let Some(ancestor) = source {
        if let Some(value) = ancestor.provided(key) {
            return Some(value);
        }
        source = ancestor.parent();
    }
    None
}
