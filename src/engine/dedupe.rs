//! Hook Deduplicator.
//!
//! Before a type is re-merged against a changed ancestor, any key of its
//! cached options that no longer matches the sealed snapshot was modified
//! out of band and must be folded into the declared configuration. List
//! values need correcting first: the cached list already contains the
//! ancestor's entries, and re-merging would add them a second time.
//!
//! An item of the cached list is kept if the type declared it itself, or if
//! the sealed snapshot never had it (it arrived after sealing). Everything
//! else is an ancestor entry the merge will supply again.

use crate::options::{Configuration, Item, MergeStrategy, OptionMap, OptionValue, Watcher};

/// Compute the keys of `latest` that changed since `sealed`, with list values
/// corrected against `extended`. Returns `None` if nothing changed.
pub fn resolve_modified_options(
    latest: &Configuration,
    extended: &Configuration,
    sealed: &Configuration,
) -> Option<Configuration> {
    let mut modified: Option<Configuration> = None;
    for (key, value) in latest.iter() {
        let sealed_value = sealed.get(key);
        if sealed_value.is_some_and(|s| s.same(value)) {
            continue;
        }
        let deduped = if key.strategy() == MergeStrategy::ExtendConcat {
            dedupe_entries(value, extended.get(key), sealed_value)
        } else {
            dedupe(value, extended.get(key), sealed_value)
        };
        modified
            .get_or_insert_with(Configuration::new)
            .insert(key, deduped);
    }
    modified
}

fn dedupe(
    latest: &OptionValue,
    extended: Option<&OptionValue>,
    sealed: Option<&OptionValue>,
) -> OptionValue {
    match latest {
        OptionValue::List(items) => {
            let extended = extended.map(as_items).unwrap_or_default();
            let sealed = sealed.map(as_items).unwrap_or_default();
            OptionValue::list(keep_items(items, &extended, &sealed))
        }
        _ => latest.clone(),
    }
}

/// Per-entry variant for maps whose entries are themselves lists (watch).
fn dedupe_entries(
    latest: &OptionValue,
    extended: Option<&OptionValue>,
    sealed: Option<&OptionValue>,
) -> OptionValue {
    let OptionValue::Map(entries) = latest else {
        return latest.clone();
    };
    let extended = extended.and_then(OptionValue::as_map);
    let sealed = sealed.and_then(OptionValue::as_map);

    let mut out = OptionMap::with_capacity(entries.len());
    for (name, item) in entries.iter() {
        let corrected = match item {
            Item::Watchers(watchers) => {
                let own = watchers_of(extended.and_then(|m| m.get(name)));
                let seen = watchers_of(sealed.and_then(|m| m.get(name)));
                let kept = watchers
                    .iter()
                    .filter(|w| own.iter().any(|o| o.ptr_eq(w)) || !seen.iter().any(|s| s.ptr_eq(w)))
                    .cloned()
                    .collect();
                Item::Watchers(kept)
            }
            other => other.clone(),
        };
        out.insert(name.clone(), corrected);
    }
    OptionValue::map(out)
}

fn keep_items(latest: &[Item], extended: &[Item], sealed: &[Item]) -> Vec<Item> {
    latest
        .iter()
        .filter(|item| {
            extended.iter().any(|e| e.same(item)) || !sealed.iter().any(|s| s.same(item))
        })
        .cloned()
        .collect()
}

/// Items of a list value; a scalar counts as a one-item list.
fn as_items(value: &OptionValue) -> Vec<Item> {
    match value {
        OptionValue::List(items) => items.as_ref().clone(),
        OptionValue::Scalar(item) => vec![item.clone()],
        OptionValue::Map(_) => Vec::new(),
    }
}

fn watchers_of(item: Option<&Item>) -> &[Watcher] {
    match item {
        Some(Item::Watchers(watchers)) => watchers,
        _ => &[],
    }
}
