//! Component instances - creation, lifecycle and the public instance API.
//!
//! An [`Instance`] is a cheap `Rc` handle. Parents own their children
//! strongly; children, closures and watchers hold [`WeakInstance`]s back, so
//! dropping the root drops the tree.
//!
//! # Initialization
//!
//! [`create_instance`] drives a fresh instance through a fixed sequence of
//! phases. Each phase is observable through [`Instance::phase`]:
//!
//! ```text
//! Constructed            uid assigned
//! ConfigurationAttached  effective configuration (full merge or fast path)
//! ProxyGuardInstalled    undeclared reads warn (development only)
//! LifecycleLinked        parent / root / children
//! EventsWired            parent listeners adopted
//! RenderWired            element factory bound, slots captured
//! BeforeCreateFired      before_create hooks
//! InjectionsResolved     inject from ancestors
//! StateInitialized       props, methods, data, computed, watch
//! ProvisionsResolved     provide for descendants
//! CreatedFired           created hooks
//! Mounted                only if `el` was configured (or on explicit mount)
//! ```
//!
//! Everything between `LifecycleLinked` and `Mounted` is done by pluggable
//! [`Collaborators`]; the built-in ones are used unless the caller supplies
//! others.

mod collaborators;
mod events;
mod init;
mod inject;
mod lifecycle;
mod mount;
mod proxy;
mod render;
mod state;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::engine::ComponentType;
use crate::error::MountError;
use crate::options::{Configuration, Hook, HookKind, Listener, RenderFn};
use crate::value::Value;

pub use collaborators::{
    Collaborators, EventWiring, Injector, Mounter, RenderWiring, StateInitializer,
};
pub use events::{EventRegistry, ListenerWiring};
pub use init::{CreateOptions, InternalComponentOptions, create_instance};
pub use inject::ParentChainInjector;
pub use lifecycle::call_hook;
pub use mount::RenderMount;
pub use render::{CreateElement, Descriptor, ElementWiring, Tag, VNode, VNodeComponentOptions};
pub use state::{FieldKind, SignalState};

use render::RenderContext;
use state::StateContainer;

// =============================================================================
// Lifecycle phase and flags
// =============================================================================

/// Position of an instance in its lifecycle. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecyclePhase {
    Constructed,
    ConfigurationAttached,
    ProxyGuardInstalled,
    LifecycleLinked,
    EventsWired,
    RenderWired,
    BeforeCreateFired,
    InjectionsResolved,
    StateInitialized,
    ProvisionsResolved,
    CreatedFired,
    Mounted,
    BeingDestroyed,
    Destroyed,
}

bitflags::bitflags! {
    /// Lifecycle state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LifecycleFlags: u8 {
        const MOUNTED         = 1 << 0;
        const BEING_DESTROYED = 1 << 1;
        const DESTROYED       = 1 << 2;
        /// Deactivated by a caching parent; hooks still run.
        const INACTIVE        = 1 << 3;
        /// At least one `hook:<name>` listener was registered.
        const HAS_HOOK_EVENT  = 1 << 4;
    }
}

// =============================================================================
// InstanceOptions
// =============================================================================

/// Effective options of one instance.
///
/// `config` is the merged configuration. On the internal fast path it is the
/// type's cached resolution itself, shared rather than copied; the
/// per-instance fields come from the placeholder vnode instead of a merge.
#[derive(Debug)]
pub struct InstanceOptions {
    config: Rc<Configuration>,
    internal: bool,
    parent: Option<WeakInstance>,
    parent_vnode: Option<VNode>,
    props_data: HashMap<String, Value>,
    parent_listeners: HashMap<String, Vec<Listener>>,
    render_children: Vec<VNode>,
    component_tag: Option<String>,
    render: Option<RenderFn>,
}

impl InstanceOptions {
    pub fn config(&self) -> &Rc<Configuration> {
        &self.config
    }

    /// Whether the instance was created through the internal fast path.
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    pub fn hooks(&self, kind: HookKind) -> Vec<Hook> {
        self.config.hooks(kind)
    }

    /// Render function: the per-instantiation override, else the configured
    /// one.
    pub fn render(&self) -> Option<RenderFn> {
        self.render.clone().or_else(|| self.config.get_render())
    }

    pub fn name(&self) -> Option<&str> {
        self.config.get_name()
    }

    pub fn el(&self) -> Option<&str> {
        self.config.get_el()
    }

    pub fn component(&self, name: &str) -> Option<ComponentType> {
        self.config.get_component(name)
    }

    /// The parent passed at creation (before abstract parents are skipped).
    pub fn parent(&self) -> Option<Instance> {
        self.parent.as_ref().and_then(WeakInstance::upgrade)
    }

    pub fn parent_vnode(&self) -> Option<&VNode> {
        self.parent_vnode.as_ref()
    }

    pub fn props_data(&self) -> &HashMap<String, Value> {
        &self.props_data
    }

    pub fn parent_listeners(&self) -> &HashMap<String, Vec<Listener>> {
        &self.parent_listeners
    }

    /// Children passed by the parent, available as slots.
    pub fn render_children(&self) -> &[VNode] {
        &self.render_children
    }

    /// Tag the parent used to refer to this component.
    pub fn component_tag(&self) -> Option<&str> {
        self.component_tag.as_deref()
    }
}

// =============================================================================
// Instance
// =============================================================================

pub(crate) struct InstanceInner {
    uid: u64,
    ty: ComponentType,
    options: Rc<InstanceOptions>,
    collaborators: Collaborators,
    phase: Cell<LifecyclePhase>,
    flags: Cell<LifecycleFlags>,
    guarded: Cell<bool>,
    parent: RefCell<Option<WeakInstance>>,
    root: RefCell<Option<WeakInstance>>,
    children: RefCell<Vec<Instance>>,
    events: RefCell<EventRegistry>,
    render: RefCell<Option<RenderContext>>,
    state: RefCell<StateContainer>,
    injected: RefCell<HashMap<String, Option<Value>>>,
    provided: RefCell<HashMap<String, Value>>,
    vnode: RefCell<Option<VNode>>,
    mount_target: RefCell<Option<String>>,
}

/// Handle to a live component instance.
#[derive(Clone)]
pub struct Instance(Rc<InstanceInner>);

/// Non-owning handle to an instance.
#[derive(Clone, Default)]
pub struct WeakInstance(Weak<InstanceInner>);

impl WeakInstance {
    pub fn upgrade(&self) -> Option<Instance> {
        self.0.upgrade().map(Instance)
    }
}

impl fmt::Debug for WeakInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(vm) => write!(f, "WeakInstance({})", vm.uid()),
            None => f.write_str("WeakInstance(<dropped>)"),
        }
    }
}

impl Instance {
    pub(crate) fn alloc(
        uid: u64,
        ty: ComponentType,
        options: InstanceOptions,
        collaborators: Collaborators,
    ) -> Self {
        Self(Rc::new(InstanceInner {
            uid,
            ty,
            options: Rc::new(options),
            collaborators,
            phase: Cell::new(LifecyclePhase::Constructed),
            flags: Cell::new(LifecycleFlags::empty()),
            guarded: Cell::new(false),
            parent: RefCell::new(None),
            root: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            events: RefCell::new(EventRegistry::new()),
            render: RefCell::new(None),
            state: RefCell::new(StateContainer::default()),
            injected: RefCell::new(HashMap::new()),
            provided: RefCell::new(HashMap::new()),
            vnode: RefCell::new(None),
            mount_target: RefCell::new(None),
        }))
    }

    /// Process-unique creation number.
    pub fn uid(&self) -> u64 {
        self.0.uid
    }

    pub fn component_type(&self) -> ComponentType {
        self.0.ty
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.0.phase.get()
    }

    /// Enter `next`. Phases never move backwards: a hook that mounts or
    /// destroys the instance mid-creation leaves the later creation phases
    /// behind, and they are skipped.
    pub(crate) fn advance(&self, next: LifecyclePhase) {
        let current = self.0.phase.get();
        if next <= current {
            trace!(uid = self.0.uid, phase = ?next, current = ?current, "lifecycle phase skipped");
            return;
        }
        self.0.phase.set(next);
        trace!(uid = self.0.uid, phase = ?next, "lifecycle phase");
    }

    pub fn options(&self) -> Rc<InstanceOptions> {
        self.0.options.clone()
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.0.collaborators
    }

    pub fn flags(&self) -> LifecycleFlags {
        self.0.flags.get()
    }

    pub(crate) fn insert_flags(&self, flags: LifecycleFlags) {
        self.0.flags.set(self.0.flags.get() | flags);
    }

    pub fn is_mounted(&self) -> bool {
        self.flags().contains(LifecycleFlags::MOUNTED)
    }

    pub fn is_being_destroyed(&self) -> bool {
        self.flags().contains(LifecycleFlags::BEING_DESTROYED)
    }

    pub fn is_destroyed(&self) -> bool {
        self.flags().contains(LifecycleFlags::DESTROYED)
    }

    pub fn is_inactive(&self) -> bool {
        self.flags().contains(LifecycleFlags::INACTIVE)
    }

    /// Take the instance and its subtree out of view without destroying it.
    /// Fires `deactivated`, children first.
    pub fn deactivate(&self) {
        if self.is_inactive() {
            return;
        }
        self.insert_flags(LifecycleFlags::INACTIVE);
        for child in self.children() {
            child.deactivate();
        }
        call_hook(self, HookKind::Deactivated);
    }

    /// Undo [`Instance::deactivate`]. Fires `activated`, children first.
    pub fn activate(&self) {
        if !self.is_inactive() {
            return;
        }
        self.0.flags.set(self.flags() - LifecycleFlags::INACTIVE);
        for child in self.children() {
            child.activate();
        }
        call_hook(self, HookKind::Activated);
    }

    /// The nearest non-abstract ancestor.
    pub fn parent(&self) -> Option<Instance> {
        self.0.parent.borrow().as_ref().and_then(WeakInstance::upgrade)
    }

    /// The top of the tree; an instance without parent is its own root.
    pub fn root(&self) -> Instance {
        self.0
            .root
            .borrow()
            .as_ref()
            .and_then(WeakInstance::upgrade)
            .unwrap_or_else(|| self.clone())
    }

    pub fn children(&self) -> Vec<Instance> {
        self.0.children.borrow().clone()
    }

    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Display name used in diagnostics: `<Root>`, `<Name>` or
    /// `<Anonymous>`.
    pub fn name(&self) -> String {
        let options = &self.0.options;
        if options.parent.is_none() && !options.internal {
            return "<Root>".to_string();
        }
        match options.name().or(options.component_tag()) {
            Some(name) => format!("<{}>", capitalize(name)),
            None => "<Anonymous>".to_string(),
        }
    }

    /// Value injected under `key`, if it was declared and resolved.
    pub fn injected(&self, key: &str) -> Option<Value> {
        self.0.injected.borrow().get(key).cloned().flatten()
    }

    /// Value this instance provides to its descendants under `key`.
    pub fn provided(&self, key: &str) -> Option<Value> {
        self.0.provided.borrow().get(key).cloned()
    }

    /// The rendered tree, once mounted.
    pub fn vnode(&self) -> Option<VNode> {
        self.0.vnode.borrow().clone()
    }

    /// The target passed to the last successful mount.
    pub fn mount_target(&self) -> Option<String> {
        self.0.mount_target.borrow().clone()
    }

    /// Mount the instance.
    ///
    /// Fires `before_mount`, delegates rendering and attachment to the mount
    /// collaborator, then fires `mounted`. Mounting an already mounted
    /// instance does nothing.
    pub fn mount(&self, target: Option<&str>) -> Result<(), MountError> {
        if self.is_destroyed() || self.is_being_destroyed() {
            return Err(MountError::Destroyed {
                component: self.name(),
            });
        }
        if self.is_mounted() {
            return Ok(());
        }

        call_hook(self, HookKind::BeforeMount);
        let mounter = self.0.collaborators.mounter.clone();
        mounter.mount(self, target)?;

        *self.0.mount_target.borrow_mut() = target.map(str::to_string);
        self.insert_flags(LifecycleFlags::MOUNTED);
        self.advance(LifecyclePhase::Mounted);
        call_hook(self, HookKind::Mounted);
        Ok(())
    }

    pub(crate) fn set_vnode(&self, vnode: VNode) {
        *self.0.vnode.borrow_mut() = Some(vnode);
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("uid", &self.0.uid)
            .field("cid", &self.0.ty.cid())
            .field("name", &self.name())
            .field("phase", &self.0.phase.get())
            .finish()
    }
}

fn capitalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if c == '-' || c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
