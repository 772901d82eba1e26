//! Component engine - type arena, option resolution, deduplication.
//!
//! The engine owns everything that happens at the *type* level:
//! - Registry: the thread-local arena of component types and their caches
//! - Resolve: pull-based recomputation of a type's effective configuration
//! - Dedupe: correction of list values before a re-merge
//!
//! # Architecture
//!
//! Types are NOT objects. A [`ComponentType`] is an index into the arena:
//!
//! ```text
//! cid 0: Base   (super=-,  options=#A)
//! cid 1: Card   (super=0,  options=#B, super_options=#A, sealed=B')
//! cid 2: Badge  (super=1,  options=#C, super_options=#B, sealed=C')
//! ```
//!
//! A cached `options` is valid while `super_options` is the very same `Rc`
//! as the ancestor's current resolution. Replacing an ancestor's options
//! (mixin, patch, re-resolution) makes every descendant stale on its next
//! resolution, with no notification step.

mod dedupe;
mod registry;
mod resolve;

pub use dedupe::resolve_modified_options;
pub use registry::*;
pub use resolve::resolve_constructor_options;
