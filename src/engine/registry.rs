//! Component Type Registry - arena of component types.
//!
//! Manages the per-type configuration caches:
//! - `extend_options`: the configuration as declared
//! - `options`: the cached resolution
//! - `super_options`: the ancestor resolution observed when `options` was built
//! - `sealed_options`: shallow copy of `options` taken right after it was built
//!
//! Records are never freed: types are definitions and live as long as the
//! thread's arena. No borrow of the arena is held while user code runs.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::error::ResolveError;
use crate::options::{
    Configuration, Directive, Item, OptionKey, OptionValue, merge_options,
};

use super::resolve::resolve_constructor_options;

// =============================================================================
// Registry State
// =============================================================================

pub(crate) struct TypeRecord {
    pub(crate) super_type: Option<ComponentType>,
    pub(crate) extend_options: Configuration,
    pub(crate) options: Rc<Configuration>,
    pub(crate) super_options: Option<Rc<Configuration>>,
    pub(crate) sealed_options: Configuration,
}

thread_local! {
    /// Component types indexed by cid.
    static TYPES: RefCell<Vec<TypeRecord>> = const { RefCell::new(Vec::new()) };
}

pub(crate) fn with_record<R>(
    ty: ComponentType,
    f: impl FnOnce(&TypeRecord) -> R,
) -> Result<R, ResolveError> {
    TYPES.with(|types| {
        let types = types.borrow();
        types
            .get(ty.0 as usize)
            .map(f)
            .ok_or(ResolveError::UnknownType(ty.0))
    })
}

pub(crate) fn with_record_mut<R>(
    ty: ComponentType,
    f: impl FnOnce(&mut TypeRecord) -> R,
) -> Result<R, ResolveError> {
    TYPES.with(|types| {
        let mut types = types.borrow_mut();
        types
            .get_mut(ty.0 as usize)
            .map(f)
            .ok_or(ResolveError::UnknownType(ty.0))
    })
}

fn allocate(build: impl FnOnce(ComponentType) -> TypeRecord) -> ComponentType {
    TYPES.with(|types| {
        let mut types = types.borrow_mut();
        let ty = ComponentType(types.len() as u32);
        types.push(build(ty));
        ty
    })
}

/// Register `ty` in its own components map under its declared name, so its
/// render function can refer to itself.
pub(crate) fn register_self(ty: ComponentType, options: &mut Configuration) {
    if let Some(name) = options.get_name().map(str::to_string) {
        options.insert_entry(OptionKey::Components, name, Item::Component(ty));
    }
}

// =============================================================================
// ComponentType
// =============================================================================

/// Handle to a component type in this thread's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentType(u32);

impl ComponentType {
    /// Define a base type (no ancestor). Its declared configuration is its
    /// resolution.
    pub fn new(config: Configuration) -> Self {
        let ty = allocate(|ty| {
            let mut options = config.clone();
            register_self(ty, &mut options);
            TypeRecord {
                super_type: None,
                extend_options: config,
                sealed_options: options.clone(),
                options: Rc::new(options),
                super_options: None,
            }
        });
        debug!(cid = ty.0, "defined base component type");
        ty
    }

    /// Define a subtype. The new type is resolved and sealed immediately.
    pub fn extend(self, config: Configuration) -> Result<Self, ResolveError> {
        let super_options = resolve_constructor_options(self)?;
        let mut options = merge_options(&super_options, &config);
        let ty = allocate(|ty| {
            register_self(ty, &mut options);
            TypeRecord {
                super_type: Some(self),
                extend_options: config,
                sealed_options: options.clone(),
                options: Rc::new(options),
                super_options: Some(super_options),
            }
        });
        debug!(cid = ty.0, super_cid = self.0, "extended component type");
        Ok(ty)
    }

    /// Arena index, unique per thread.
    pub fn cid(self) -> u32 {
        self.0
    }

    pub fn super_type(self) -> Result<Option<ComponentType>, ResolveError> {
        with_record(self, |r| r.super_type)
    }

    /// The cached resolution, without checking ancestors for changes.
    pub fn options(self) -> Result<Rc<Configuration>, ResolveError> {
        with_record(self, |r| r.options.clone())
    }

    /// The configuration as declared, plus any late modifications folded in
    /// by re-resolution.
    pub fn extend_options(self) -> Result<Configuration, ResolveError> {
        with_record(self, |r| r.extend_options.clone())
    }

    /// The snapshot taken right after the last resolution.
    pub fn sealed_options(self) -> Result<Configuration, ResolveError> {
        with_record(self, |r| r.sealed_options.clone())
    }

    /// The ancestor resolution observed by the last resolution.
    pub fn super_options(self) -> Result<Option<Rc<Configuration>>, ResolveError> {
        with_record(self, |r| r.super_options.clone())
    }

    /// Resolve the effective configuration, re-merging only if an ancestor
    /// changed.
    pub fn resolve(self) -> Result<Rc<Configuration>, ResolveError> {
        resolve_constructor_options(self)
    }

    /// Merge `mixin` into this type's options.
    ///
    /// The options are replaced by a fresh merge, so every descendant sees a
    /// changed ancestor on its next resolution.
    pub fn mixin(self, mixin: Configuration) -> Result<(), ResolveError> {
        with_record_mut(self, |r| {
            r.options = Rc::new(merge_options(&r.options, &mixin));
        })?;
        debug!(cid = self.0, "applied mixin");
        Ok(())
    }

    /// Replace one key of the resolved options out of band.
    ///
    /// The change is visible immediately. It survives later re-resolutions
    /// because the deduplicator finds the key differs from the sealed
    /// snapshot and folds it into the declared configuration.
    pub fn patch_option(self, key: OptionKey, value: OptionValue) -> Result<(), ResolveError> {
        self.update_options(|options| {
            options.insert(key, value);
        })
    }

    /// Register a component under `name` for this type and its descendants.
    pub fn component(self, name: impl Into<String>, ty: ComponentType) -> Result<(), ResolveError> {
        let name = name.into();
        self.update_options(|options| {
            options.insert_entry(OptionKey::Components, name, Item::Component(ty));
        })
    }

    /// Register a directive under `name` for this type and its descendants.
    pub fn directive(self, name: impl Into<String>, directive: Directive) -> Result<(), ResolveError> {
        let name = name.into();
        self.update_options(|options| {
            options.insert_entry(OptionKey::Directives, name, Item::Directive(directive));
        })
    }

    /// Change the ancestor. The cache is invalidated; the next resolution
    /// re-merges against the new chain.
    pub fn rebase(self, super_type: Option<ComponentType>) -> Result<(), ResolveError> {
        with_record_mut(self, |r| {
            r.super_type = super_type;
            r.super_options = None;
        })
    }

    fn update_options(self, f: impl FnOnce(&mut Configuration)) -> Result<(), ResolveError> {
        with_record_mut(self, |r| {
            let mut options = Configuration::clone(&r.options);
            f(&mut options);
            r.options = Rc::new(options);
        })
    }
}

// =============================================================================
// Lookups
// =============================================================================

/// Number of types defined on this thread.
pub fn type_count() -> usize {
    TYPES.with(|types| types.borrow().len())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Drop every type record. Existing handles become unknown.
pub fn reset_types() {
    TYPES.with(|types| types.borrow_mut().clear());
}
