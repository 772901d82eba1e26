//! Instance Initializer.
//!
//! Two ways to attach configuration:
//! - Full path: resolve the type, then merge the per-instantiation
//!   configuration over it.
//! - Internal fast path: used for children created from a component
//!   placeholder. The type's cached resolution is shared as is and the
//!   per-instance data is read off the placeholder; no merge happens.
//!
//! Both paths yield the same hooks, components and render function for the
//! same type.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::debug;

use crate::config::{config, report};
use crate::engine::{ComponentType, resolve_constructor_options};
use crate::error::{Diagnostic, InitError, WiringError};
use crate::options::{Configuration, HookKind, Listener, RenderFn, merge_options};
use crate::value::Value;

use super::collaborators::Collaborators;
use super::lifecycle::{call_hook, init_lifecycle};
use super::proxy::init_proxy;
use super::render::VNode;
use super::{Instance, InstanceOptions, LifecyclePhase};

static NEXT_UID: AtomicU64 = AtomicU64::new(0);

// =============================================================================
// Creation options
// =============================================================================

/// Data for the internal fast path.
#[derive(Debug, Clone)]
pub struct InternalComponentOptions {
    pub parent: Instance,
    /// The component placeholder this instance is created for.
    pub parent_vnode: VNode,
    /// Overrides the type's render function for this instance.
    pub render: Option<RenderFn>,
}

/// Per-instantiation input to [`create_instance`].
#[derive(Debug, Default)]
pub struct CreateOptions {
    /// Merged over the type's resolution. Ignored on the fast path.
    pub config: Configuration,
    pub parent: Option<Instance>,
    pub props_data: HashMap<String, Value>,
    pub listeners: HashMap<String, Vec<Listener>>,
    /// Defaults to the parent's set, else the built-ins.
    pub collaborators: Option<Collaborators>,
    /// Selects the internal fast path.
    pub internal: Option<InternalComponentOptions>,
}

impl CreateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Configuration) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn internal(internal: InternalComponentOptions) -> Self {
        Self {
            internal: Some(internal),
            ..Default::default()
        }
    }

    pub fn parent(mut self, parent: &Instance) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props_data.insert(name.into(), value.into());
        self
    }

    pub fn on(mut self, event: impl Into<String>, listener: Listener) -> Self {
        self.listeners.entry(event.into()).or_default().push(listener);
        self
    }

    pub fn collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = Some(collaborators);
        self
    }
}

// =============================================================================
// create_instance
// =============================================================================

/// Create and initialize an instance of `ty`.
///
/// Only a resolution failure aborts creation. Failing hooks and
/// collaborators are reported and initialization carries on. If the
/// effective configuration names an `el`, the instance is mounted there
/// before returning.
pub fn create_instance(ty: ComponentType, options: CreateOptions) -> Result<Instance, InitError> {
    let uid = NEXT_UID.fetch_add(1, Ordering::Relaxed);
    let runtime = config();
    let started = runtime.performance.then(Instant::now);

    let CreateOptions {
        config: instance_config,
        parent,
        props_data,
        listeners,
        collaborators,
        internal,
    } = options;

    let inherited = internal
        .as_ref()
        .map(|i| &i.parent)
        .or(parent.as_ref())
        .map(|p| p.collaborators().clone());
    let collaborators = collaborators.or(inherited).unwrap_or_default();

    let options = match internal {
        Some(internal) => init_internal_component(ty, internal)?,
        None => {
            let resolved = resolve_constructor_options(ty)?;
            InstanceOptions {
                config: Rc::new(merge_options(&resolved, &instance_config)),
                internal: false,
                parent: parent.map(|p| p.downgrade()),
                parent_vnode: None,
                props_data,
                parent_listeners: listeners,
                render_children: Vec::new(),
                component_tag: None,
                render: None,
            }
        }
    };

    let vm = Instance::alloc(uid, ty, options, collaborators);
    vm.advance(LifecyclePhase::ConfigurationAttached);

    init_proxy(&vm, &runtime);
    vm.advance(LifecyclePhase::ProxyGuardInstalled);

    init_lifecycle(&vm);
    vm.advance(LifecyclePhase::LifecycleLinked);

    wire(&vm, LifecyclePhase::EventsWired, |c, vm| c.events.init_events(vm));
    wire(&vm, LifecyclePhase::RenderWired, |c, vm| c.render.init_render(vm));

    call_hook(&vm, HookKind::BeforeCreate);
    vm.advance(LifecyclePhase::BeforeCreateFired);

    wire(&vm, LifecyclePhase::InjectionsResolved, |c, vm| {
        c.injector.resolve_injections(vm)
    });
    wire(&vm, LifecyclePhase::StateInitialized, |c, vm| c.state.init_state(vm));
    wire(&vm, LifecyclePhase::ProvisionsResolved, |c, vm| {
        c.injector.resolve_provisions(vm)
    });

    if halted(&vm) {
        return Ok(vm);
    }
    call_hook(&vm, HookKind::Created);
    vm.advance(LifecyclePhase::CreatedFired);

    if let Some(started) = started {
        debug!(
            uid,
            component = %vm.name(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "init"
        );
    }

    if halted(&vm) {
        return Ok(vm);
    }
    let target = vm.options().el().map(str::to_string);
    if let Some(target) = target {
        if let Err(err) = vm.mount(Some(&target)) {
            report(Diagnostic::WiringFailed {
                uid,
                component: vm.name(),
                phase: LifecyclePhase::Mounted,
                error: err.to_string(),
            });
        }
    }

    Ok(vm)
}

fn init_internal_component(
    ty: ComponentType,
    internal: InternalComponentOptions,
) -> Result<InstanceOptions, InitError> {
    let config = resolve_constructor_options(ty)?;
    let InternalComponentOptions {
        parent,
        parent_vnode,
        render,
    } = internal;

    let mut options = InstanceOptions {
        config,
        internal: true,
        parent: Some(parent.downgrade()),
        parent_vnode: None,
        props_data: HashMap::new(),
        parent_listeners: HashMap::new(),
        render_children: Vec::new(),
        component_tag: None,
        render,
    };
    if let Some(component) = &parent_vnode.component {
        options.props_data = component.props_data.clone();
        options.parent_listeners = component.listeners.clone();
        options.render_children = component.children.clone();
        options.component_tag = Some(component.tag.clone());
    }
    options.parent_vnode = Some(parent_vnode);
    Ok(options)
}

/// A hook or initializer destroyed the instance; the rest of creation is
/// skipped.
fn halted(vm: &Instance) -> bool {
    let halted = vm.is_being_destroyed();
    if halted {
        debug!(uid = vm.uid(), component = %vm.name(), "destroyed during creation");
    }
    halted
}

/// Run one collaborator phase. A failure is reported; the phase is entered
/// either way. Nothing runs once the instance is being destroyed.
fn wire(
    vm: &Instance,
    phase: LifecyclePhase,
    f: impl FnOnce(&Collaborators, &Instance) -> Result<(), WiringError>,
) {
    if vm.is_being_destroyed() {
        return;
    }
    let collaborators = vm.collaborators().clone();
    if let Err(err) = f(&collaborators, vm) {
        report(Diagnostic::WiringFailed {
            uid: vm.uid(),
            component: vm.name(),
            phase,
            error: err.to_string(),
        });
    }
    vm.advance(phase);
}
