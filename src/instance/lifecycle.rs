//! Tree linking, hook dispatch and teardown.

use tracing::debug;

use crate::config::report;
use crate::error::Diagnostic;
use crate::options::HookKind;

use super::{Instance, LifecycleFlags, LifecyclePhase};

/// Link `vm` into the tree.
///
/// The parent is the nearest non-abstract ancestor of the one passed at
/// creation. Abstract instances keep their parent reference but are not
/// listed among its children.
pub(crate) fn init_lifecycle(vm: &Instance) {
    let options = vm.options();
    let mut parent = options.parent();

    if let Some(mut p) = parent.clone() {
        if !options.config().is_abstract() {
            while p.options().config().is_abstract() {
                match p.parent() {
                    Some(up) => p = up,
                    None => break,
                }
            }
            p.0.children.borrow_mut().push(vm.clone());
            parent = Some(p);
        }
    }

    *vm.0.root.borrow_mut() = parent.as_ref().map(|p| p.root().downgrade());
    *vm.0.parent.borrow_mut() = parent.map(|p| p.downgrade());
}

/// Run every hook of `kind`, in merge order.
///
/// A failing hook is reported as [`Diagnostic::HookFailed`] and the
/// remaining hooks still run. If anyone listens for `hook:<name>`, the event
/// is emitted afterwards.
pub fn call_hook(vm: &Instance, kind: HookKind) {
    for hook in vm.options().hooks(kind) {
        if let Err(error) = hook.call(vm) {
            report(Diagnostic::HookFailed {
                uid: vm.uid(),
                component: vm.name(),
                hook: kind,
                label: hook.label().to_string(),
                error,
            });
        }
    }
    if vm.flags().contains(LifecycleFlags::HAS_HOOK_EVENT) {
        vm.emit(&kind.event_name(), &[]);
    }
}

impl Instance {
    /// Tear the instance down.
    ///
    /// Fires `before_destroy`, unlinks from the parent, stops watchers,
    /// destroys children, fires `destroyed`, then drops every listener.
    /// Calling it again does nothing.
    pub fn destroy(&self) {
        if self.is_being_destroyed() {
            return;
        }
        call_hook(self, HookKind::BeforeDestroy);
        self.insert_flags(LifecycleFlags::BEING_DESTROYED);
        self.advance(LifecyclePhase::BeingDestroyed);

        if let Some(parent) = self.parent() {
            if !parent.is_being_destroyed() {
                parent.0.children.borrow_mut().retain(|c| !c.ptr_eq(self));
            }
        }

        self.stop_watchers();

        let children = std::mem::take(&mut *self.0.children.borrow_mut());
        for child in children {
            child.destroy();
        }
        self.0.vnode.borrow_mut().take();

        self.insert_flags(LifecycleFlags::DESTROYED);
        self.advance(LifecyclePhase::Destroyed);
        call_hook(self, HookKind::Destroyed);
        self.clear_listeners();
        debug!(uid = self.uid(), component = %self.name(), "destroyed");
    }
}
