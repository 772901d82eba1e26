//! Configuration Merger - combines a base configuration with an extension.
//!
//! Merging is pure: inputs are never mutated and values present on only one
//! side are shared into the result as-is (same `Rc`), so the result's
//! untouched keys stay identity-equal to their source.
//!
//! # Strategy table
//!
//! | Strategy       | Keys                                          | Rule                                  |
//! |----------------|-----------------------------------------------|---------------------------------------|
//! | `Concat`       | lifecycle hooks                               | base entries, then extension entries  |
//! | `Extend`       | components, directives, props, methods, computed, inject, data, provide | extension entries replace same-named base entries |
//! | `ExtendConcat` | watch                                         | per name, base watchers then extension watchers |
//! | `Override`     | name, render, el, abstract, custom keys       | extension if present, else base       |
//! | `Absorb`       | mixins, extends                               | applied to the base, dropped from the result |
//!
//! Mixins are applied ahead of the extension's own keys: `extends` first,
//! then each mixin in declaration order.

use std::borrow::Cow;
use super::{Configuration, Item, OptionKey, OptionMap, OptionValue};

// =============================================================================
// Strategy table
// =============================================================================

/// How the two sides of one key combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    Concat,
    Extend,
    ExtendConcat,
    Override,
    Absorb,
}

impl OptionKey {
    /// The merge strategy for this key.
    pub fn strategy(self) -> MergeStrategy {
        match self {
            Self::Hook(_) => MergeStrategy::Concat,
            Self::Components
            | Self::Directives
            | Self::Props
            | Self::Methods
            | Self::Computed
            | Self::Inject
            | Self::Data
            | Self::Provide => MergeStrategy::Extend,
            Self::Watch => MergeStrategy::ExtendConcat,
            Self::Name | Self::Render | Self::El | Self::Abstract | Self::Custom(_) => {
                MergeStrategy::Override
            }
            Self::Mixins | Self::Extends => MergeStrategy::Absorb,
        }
    }
}

impl MergeStrategy {
    /// Combine the base and extension values of one key.
    pub fn apply(
        self,
        base: Option<&OptionValue>,
        extension: Option<&OptionValue>,
    ) -> Option<OptionValue> {
        match self {
            Self::Absorb => None,
            Self::Override => extension.or(base).cloned(),
            Self::Concat => match (base, extension) {
                (Some(OptionValue::List(b)), Some(OptionValue::List(e))) => {
                    let mut items = Vec::with_capacity(b.len() + e.len());
                    items.extend(b.iter().cloned());
                    items.extend(e.iter().cloned());
                    Some(OptionValue::list(items))
                }
                (b, e) => e.or(b).cloned(),
            },
            Self::Extend => match (base, extension) {
                (Some(OptionValue::Map(b)), Some(OptionValue::Map(e))) => {
                    let mut entries = OptionMap::clone(b);
                    entries.extend(e.iter().map(|(k, v)| (k.clone(), v.clone())));
                    Some(OptionValue::map(entries))
                }
                (b, e) => e.or(b).cloned(),
            },
            Self::ExtendConcat => match (base, extension) {
                (Some(OptionValue::Map(b)), Some(OptionValue::Map(e))) => {
                    let mut entries = OptionMap::clone(b);
                    for (name, item) in e.iter() {
                        let merged = match (entries.get(name), item) {
                            (Some(Item::Watchers(prev)), Item::Watchers(next)) => {
                                let mut watchers = prev.clone();
                                watchers.extend(next.iter().cloned());
                                Item::Watchers(watchers)
                            }
                            _ => item.clone(),
                        };
                        entries.insert(name.clone(), merged);
                    }
                    Some(OptionValue::map(entries))
                }
                (b, e) => e.or(b).cloned(),
            },
        }
    }
}

// =============================================================================
// Merge
// =============================================================================

/// Merge `extension` on top of `base`.
pub fn merge_options(base: &Configuration, extension: &Configuration) -> Configuration {
    let mut parent = Cow::Borrowed(base);

    if let Some(Item::Mixin(extended)) = extension
        .get(OptionKey::Extends)
        .and_then(OptionValue::as_scalar)
    {
        parent = Cow::Owned(merge_options(&parent, extended));
    }
    for item in extension.list(OptionKey::Mixins) {
        if let Item::Mixin(mixin) = item {
            parent = Cow::Owned(merge_options(&parent, mixin));
        }
    }

    let mut merged = Configuration::new();
    for key in parent.keys().chain(extension.keys()) {
        if merged.contains(key) {
            continue;
        }
        if let Some(value) = key.strategy().apply(parent.get(key), extension.get(key)) {
            merged.insert(key, value);
        }
    }
    merged
}
