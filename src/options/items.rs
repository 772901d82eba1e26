//! Configuration entries.
//!
//! Every value stored under a configuration key is built from [`Item`]s.
//! Function-like items are `Rc` handles compared by identity: two hooks are
//! "the same hook" only if they share an allocation. The deduplicator relies
//! on this to tell a resurfacing ancestor hook from a newly declared one.

use std::fmt;
use std::rc::Rc;

use crate::engine::ComponentType;
use crate::error::HookError;
use crate::instance::{Instance, VNode};
use crate::value::Value;

use super::Configuration;

// =============================================================================
// Shared function handles
// =============================================================================

macro_rules! shared_fn {
    ($(#[$meta:meta])* $name:ident => $($sig:tt)+) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name(Rc<dyn $($sig)+>);

        impl $name {
            /// Check if both handles share the same function.
            pub fn ptr_eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.ptr_eq(other)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:p})"), Rc::as_ptr(&self.0) as *const ())
            }
        }
    };
}

shared_fn! {
    /// Computes a value from the instance: data initializers, computed
    /// values and provisions.
    Getter => Fn(&Instance) -> Value
}

shared_fn! {
    /// A named method callable through [`Instance::call`].
    Method => Fn(&Instance, &[Value]) -> Value
}

shared_fn! {
    /// Called with `(new, old)` when a watched value changes.
    Watcher => Fn(&Instance, &Value, &Value)
}

shared_fn! {
    /// Produces the instance's virtual tree.
    RenderFn => Fn(&Instance) -> VNode
}

shared_fn! {
    /// Custom element behavior, applied by the renderer to bound nodes.
    Directive => Fn(&VNode, &Value)
}

shared_fn! {
    /// Event listener, called with the emitted arguments.
    Listener => Fn(&Instance, &[Value])
}

impl Getter {
    pub fn new(f: impl Fn(&Instance) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, vm: &Instance) -> Value {
        (self.0)(vm)
    }
}

impl Method {
    pub fn new(f: impl Fn(&Instance, &[Value]) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, vm: &Instance, args: &[Value]) -> Value {
        (self.0)(vm, args)
    }
}

impl Watcher {
    pub fn new(f: impl Fn(&Instance, &Value, &Value) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, vm: &Instance, new: &Value, old: &Value) {
        (self.0)(vm, new, old)
    }
}

impl RenderFn {
    pub fn new(f: impl Fn(&Instance) -> VNode + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, vm: &Instance) -> VNode {
        (self.0)(vm)
    }
}

impl Directive {
    pub fn new(f: impl Fn(&VNode, &Value) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn apply(&self, node: &VNode, binding: &Value) {
        (self.0)(node, binding)
    }
}

impl Listener {
    pub fn new(f: impl Fn(&Instance, &[Value]) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, vm: &Instance, args: &[Value]) {
        (self.0)(vm, args)
    }
}

// =============================================================================
// Hook
// =============================================================================

type HookFn = dyn Fn(&Instance) -> Result<(), HookError>;

struct HookInner {
    label: String,
    f: Box<HookFn>,
}

/// A lifecycle hook. The label only identifies the hook in diagnostics.
#[derive(Clone)]
pub struct Hook(Rc<HookInner>);

impl Hook {
    pub fn new(
        label: impl Into<String>,
        f: impl Fn(&Instance) -> Result<(), HookError> + 'static,
    ) -> Self {
        Self(Rc::new(HookInner {
            label: label.into(),
            f: Box::new(f),
        }))
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    pub fn call(&self, vm: &Instance) -> Result<(), HookError> {
        (self.0.f)(vm)
    }

    /// Check if both handles share the same hook.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({})", self.0.label)
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// Declaration of a prop accepted from the parent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropSpec {
    pub default: Option<Value>,
    pub required: bool,
}

impl PropSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Request for a value provided by an ancestor.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectSpec {
    /// The provision name looked up in ancestors.
    pub from: String,
    pub default: Option<Value>,
}

impl InjectSpec {
    pub fn key(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

// =============================================================================
// Item
// =============================================================================

/// One configuration entry.
#[derive(Debug, Clone)]
pub enum Item {
    Hook(Hook),
    Component(ComponentType),
    Directive(Directive),
    Prop(PropSpec),
    Method(Method),
    Getter(Getter),
    Inject(InjectSpec),
    Watchers(Vec<Watcher>),
    Render(RenderFn),
    Mixin(Rc<Configuration>),
    Value(Value),
}

impl Item {
    /// Identity comparison.
    ///
    /// Function handles and mixins compare by allocation, component types by
    /// cid, plain declarations and values structurally.
    pub fn same(&self, other: &Item) -> bool {
        match (self, other) {
            (Self::Hook(a), Self::Hook(b)) => a.ptr_eq(b),
            (Self::Component(a), Self::Component(b)) => a == b,
            (Self::Directive(a), Self::Directive(b)) => a.ptr_eq(b),
            (Self::Prop(a), Self::Prop(b)) => a == b,
            (Self::Method(a), Self::Method(b)) => a.ptr_eq(b),
            (Self::Getter(a), Self::Getter(b)) => a.ptr_eq(b),
            (Self::Inject(a), Self::Inject(b)) => a == b,
            (Self::Watchers(a), Self::Watchers(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ptr_eq(y))
            }
            (Self::Render(a), Self::Render(b)) => a.ptr_eq(b),
            (Self::Mixin(a), Self::Mixin(b)) => Rc::ptr_eq(a, b),
            (Self::Value(a), Self::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Hook> for Item {
    fn from(hook: Hook) -> Self {
        Self::Hook(hook)
    }
}

impl From<ComponentType> for Item {
    fn from(ty: ComponentType) -> Self {
        Self::Component(ty)
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}
