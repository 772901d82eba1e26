//! Component configuration.
//!
//! A [`Configuration`] maps [`OptionKey`]s to [`OptionValue`]s. Each key
//! belongs to a category (list, map, map of lists, scalar) that fixes how it
//! merges; see [`merge`] for the strategy table.
//!
//! # Declaring a configuration
//!
//! ```ignore
//! use spark_components::options::{Configuration, Getter, Hook, HookKind, PropSpec};
//!
//! let config = Configuration::new()
//!     .name("counter")
//!     .prop("start", PropSpec::new().with_default(0))
//!     .data("count", Getter::new(|vm| vm.get("start").unwrap_or_default()))
//!     .hook(HookKind::Created, Hook::new("log", |vm| {
//!         tracing::info!(uid = vm.uid(), "counter created");
//!         Ok(())
//!     }));
//! ```
//!
//! Values are `Rc`-shared: cloning a configuration is a shallow copy, and a
//! key whose value was replaced is detectable by identity
//! ([`OptionValue::same`]).

mod items;
pub mod merge;

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use std::rc::Rc;

pub use items::*;
pub use merge::{MergeStrategy, merge_options};

use crate::engine::ComponentType;
use crate::value::Value;

// =============================================================================
// Hook kinds
// =============================================================================

/// Lifecycle phases that carry hook lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeCreate,
    Created,
    BeforeMount,
    Mounted,
    BeforeUpdate,
    Updated,
    Activated,
    Deactivated,
    BeforeDestroy,
    Destroyed,
    ErrorCaptured,
}

impl HookKind {
    pub const ALL: [HookKind; 11] = [
        Self::BeforeCreate,
        Self::Created,
        Self::BeforeMount,
        Self::Mounted,
        Self::BeforeUpdate,
        Self::Updated,
        Self::Activated,
        Self::Deactivated,
        Self::BeforeDestroy,
        Self::Destroyed,
        Self::ErrorCaptured,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeCreate => "before_create",
            Self::Created => "created",
            Self::BeforeMount => "before_mount",
            Self::Mounted => "mounted",
            Self::BeforeUpdate => "before_update",
            Self::Updated => "updated",
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
            Self::BeforeDestroy => "before_destroy",
            Self::Destroyed => "destroyed",
            Self::ErrorCaptured => "error_captured",
        }
    }

    /// Name of the event emitted after this hook runs, e.g. `hook:created`.
    pub fn event_name(self) -> String {
        format!("hook:{}", self.as_str())
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Option keys
// =============================================================================

/// A configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Hook(HookKind),
    Components,
    Directives,
    Props,
    Methods,
    Computed,
    Inject,
    Data,
    Provide,
    Watch,
    Name,
    Render,
    El,
    Abstract,
    Mixins,
    Extends,
    /// Free-form key; merges with the override strategy.
    Custom(&'static str),
}

// =============================================================================
// Option values
// =============================================================================

/// Named entries in declaration order. Merging keeps the base's order and
/// appends names the extension adds; a replaced entry keeps its position.
pub type OptionMap = IndexMap<String, Item>;

/// The value stored under one key.
#[derive(Debug, Clone)]
pub enum OptionValue {
    /// Ordered entries (hooks, mixins).
    List(Rc<Vec<Item>>),
    /// Named entries (components, props, data, watch, ...).
    Map(Rc<OptionMap>),
    /// A single entry (name, render, el, ...).
    Scalar(Item),
}

impl OptionValue {
    pub fn list(items: Vec<Item>) -> Self {
        Self::List(Rc::new(items))
    }

    pub fn map(entries: OptionMap) -> Self {
        Self::Map(Rc::new(entries))
    }

    /// Identity comparison: lists and maps compare by allocation, scalars by
    /// [`Item::same`].
    pub fn same(&self, other: &OptionValue) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Rc::ptr_eq(a, b),
            (Self::Scalar(a), Self::Scalar(b)) => a.same(b),
            _ => false,
        }
    }

    pub fn as_list(&self) -> Option<&[Item]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OptionMap> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Item> {
        match self {
            Self::Scalar(item) => Some(item),
            _ => None,
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// A declarative component configuration.
#[derive(Clone, Default)]
pub struct Configuration {
    entries: HashMap<OptionKey, OptionValue>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: OptionKey) -> Option<&OptionValue> {
        self.entries.get(&key)
    }

    pub fn insert(&mut self, key: OptionKey, value: OptionValue) -> Option<OptionValue> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: OptionKey) -> Option<OptionValue> {
        self.entries.remove(&key)
    }

    pub fn contains(&self, key: OptionKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = OptionKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite entries with those of `other` (shallow).
    pub fn extend(&mut self, other: Configuration) {
        self.entries.extend(other.entries);
    }

    /// Append an item to a list-valued key.
    pub fn push(&mut self, key: OptionKey, item: Item) {
        match self.entries.get_mut(&key) {
            Some(OptionValue::List(items)) => Rc::make_mut(items).push(item),
            _ => {
                self.entries.insert(key, OptionValue::list(vec![item]));
            }
        }
    }

    /// Set a named entry in a map-valued key.
    ///
    /// A shared map is copied before writing, so configurations that share
    /// the map (ancestors, sealed snapshots) are left untouched.
    pub fn insert_entry(&mut self, key: OptionKey, name: impl Into<String>, item: Item) {
        match self.entries.get_mut(&key) {
            Some(OptionValue::Map(entries)) => {
                Rc::make_mut(entries).insert(name.into(), item);
            }
            _ => {
                let mut entries = OptionMap::new();
                entries.insert(name.into(), item);
                self.entries.insert(key, OptionValue::map(entries));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.set_scalar(OptionKey::Name, Item::Value(Value::Text(name.into())));
        self
    }

    /// Name a mount target; instances created with it mount on creation.
    pub fn el(mut self, target: impl Into<String>) -> Self {
        self.set_scalar(OptionKey::El, Item::Value(Value::Text(target.into())));
        self
    }

    pub fn render(mut self, render: RenderFn) -> Self {
        self.set_scalar(OptionKey::Render, Item::Render(render));
        self
    }

    /// Mark the component abstract: it is skipped when children look up
    /// their parent.
    pub fn set_abstract(mut self, is_abstract: bool) -> Self {
        self.set_scalar(OptionKey::Abstract, Item::Value(Value::Bool(is_abstract)));
        self
    }

    pub fn hook(mut self, kind: HookKind, hook: Hook) -> Self {
        self.push(OptionKey::Hook(kind), Item::Hook(hook));
        self
    }

    pub fn component(mut self, name: impl Into<String>, ty: ComponentType) -> Self {
        self.insert_entry(OptionKey::Components, name, Item::Component(ty));
        self
    }

    pub fn directive(mut self, name: impl Into<String>, directive: Directive) -> Self {
        self.insert_entry(OptionKey::Directives, name, Item::Directive(directive));
        self
    }

    pub fn prop(mut self, name: impl Into<String>, spec: PropSpec) -> Self {
        self.insert_entry(OptionKey::Props, name, Item::Prop(spec));
        self
    }

    pub fn data(mut self, name: impl Into<String>, init: Getter) -> Self {
        self.insert_entry(OptionKey::Data, name, Item::Getter(init));
        self
    }

    pub fn computed(mut self, name: impl Into<String>, getter: Getter) -> Self {
        self.insert_entry(OptionKey::Computed, name, Item::Getter(getter));
        self
    }

    pub fn method(mut self, name: impl Into<String>, method: Method) -> Self {
        self.insert_entry(OptionKey::Methods, name, Item::Method(method));
        self
    }

    pub fn watch(mut self, key: impl Into<String>, watcher: Watcher) -> Self {
        let key = key.into();
        let mut watchers = match self.map(OptionKey::Watch).and_then(|m| m.get(&key)) {
            Some(Item::Watchers(existing)) => existing.clone(),
            _ => Vec::new(),
        };
        watchers.push(watcher);
        self.insert_entry(OptionKey::Watch, key, Item::Watchers(watchers));
        self
    }

    pub fn inject(mut self, local: impl Into<String>, spec: InjectSpec) -> Self {
        self.insert_entry(OptionKey::Inject, local, Item::Inject(spec));
        self
    }

    pub fn provide(mut self, name: impl Into<String>, getter: Getter) -> Self {
        self.insert_entry(OptionKey::Provide, name, Item::Getter(getter));
        self
    }

    pub fn mixin(mut self, mixin: Configuration) -> Self {
        self.push(OptionKey::Mixins, Item::Mixin(Rc::new(mixin)));
        self
    }

    pub fn extends(mut self, base: Configuration) -> Self {
        self.set_scalar(OptionKey::Extends, Item::Mixin(Rc::new(base)));
        self
    }

    pub fn option(mut self, key: OptionKey, value: OptionValue) -> Self {
        self.entries.insert(key, value);
        self
    }

    fn set_scalar(&mut self, key: OptionKey, item: Item) {
        self.entries.insert(key, OptionValue::Scalar(item));
    }

    // -------------------------------------------------------------------------
    // Typed accessors
    // -------------------------------------------------------------------------

    /// Hooks registered for `kind`, in firing order.
    pub fn hooks(&self, kind: HookKind) -> Vec<Hook> {
        self.list(OptionKey::Hook(kind))
            .iter()
            .filter_map(|item| match item {
                Item::Hook(hook) => Some(hook.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn list(&self, key: OptionKey) -> &[Item] {
        self.get(key).and_then(OptionValue::as_list).unwrap_or(&[])
    }

    pub fn map(&self, key: OptionKey) -> Option<&OptionMap> {
        self.get(key).and_then(OptionValue::as_map)
    }

    pub fn get_name(&self) -> Option<&str> {
        self.text(OptionKey::Name)
    }

    pub fn get_el(&self) -> Option<&str> {
        self.text(OptionKey::El)
    }

    pub fn get_render(&self) -> Option<RenderFn> {
        match self.get(OptionKey::Render)?.as_scalar()? {
            Item::Render(render) => Some(render.clone()),
            _ => None,
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(
            self.get(OptionKey::Abstract).and_then(OptionValue::as_scalar),
            Some(Item::Value(Value::Bool(true)))
        )
    }

    /// Look up a registered component by name.
    pub fn get_component(&self, name: &str) -> Option<ComponentType> {
        match self.map(OptionKey::Components)?.get(name)? {
            Item::Component(ty) => Some(*ty),
            _ => None,
        }
    }

    /// Look up a registered directive by name.
    pub fn get_directive(&self, name: &str) -> Option<Directive> {
        match self.map(OptionKey::Directives)?.get(name)? {
            Item::Directive(directive) => Some(directive.clone()),
            _ => None,
        }
    }

    fn text(&self, key: OptionKey) -> Option<&str> {
        match self.get(key)?.as_scalar()? {
            Item::Value(value) => value.as_str(),
            _ => None,
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.entries.keys().map(|k| format!("{k:?}")).collect();
        keys.sort();
        f.debug_struct("Configuration").field("keys", &keys).finish()
    }
}
