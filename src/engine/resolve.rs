//! Constructor Options Resolver.
//!
//! `resolve_constructor_options(ty)` returns the effective configuration of a
//! type, recursing to the root first. A type whose recorded `super_options`
//! is the same `Rc` as its ancestor's fresh resolution returns its cache with
//! no merge work. Otherwise it re-merges, after folding late modifications
//! of its own options back into its declared configuration.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::ResolveError;
use crate::options::{Configuration, merge_options};

use super::dedupe::resolve_modified_options;
use super::registry::{ComponentType, register_self, with_record, with_record_mut};

/// Resolve the effective configuration of `ty`.
///
/// Fails with [`ResolveError::Cycle`] if the ancestor chain loops and with
/// [`ResolveError::UnknownType`] if a handle is not in the arena.
pub fn resolve_constructor_options(ty: ComponentType) -> Result<Rc<Configuration>, ResolveError> {
    let mut chain = Vec::new();
    resolve_in_chain(ty, &mut chain)
}

fn resolve_in_chain(
    ty: ComponentType,
    chain: &mut Vec<ComponentType>,
) -> Result<Rc<Configuration>, ResolveError> {
    if chain.contains(&ty) {
        return Err(ResolveError::Cycle {
            cid: ty.cid(),
            chain: chain.iter().map(|t| t.cid()).collect(),
        });
    }

    let (super_type, options) = with_record(ty, |r| (r.super_type, r.options.clone()))?;
    let Some(super_type) = super_type else {
        return Ok(options);
    };

    chain.push(ty);
    let super_options = resolve_in_chain(super_type, chain)?;
    chain.pop();

    let cached = with_record(ty, |r| {
        r.super_options
            .as_ref()
            .is_some_and(|seen| Rc::ptr_eq(seen, &super_options))
    })?;
    if cached {
        trace!(cid = ty.cid(), "resolved options from cache");
        return Ok(options);
    }

    with_record_mut(ty, |r| {
        r.super_options = Some(super_options.clone());

        // Check for late-modified options before re-merging.
        if let Some(modified) =
            resolve_modified_options(&r.options, &r.extend_options, &r.sealed_options)
        {
            debug!(cid = ty.cid(), keys = modified.len(), "folding late-modified options");
            r.extend_options.extend(modified);
        }

        let mut merged = merge_options(&super_options, &r.extend_options);
        register_self(ty, &mut merged);
        r.sealed_options = merged.clone();
        r.options = Rc::new(merged);
        debug!(cid = ty.cid(), "re-resolved options after ancestor change");
        r.options.clone()
    })
}
