//! # spark-components
//!
//! Component instantiation core.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! instance state.
//!
//! ## Architecture
//!
//! Component types are handles into a thread-local arena. Each type keeps a
//! cached resolution of its configuration, merged from its ancestors, and
//! recomputes it on demand when an ancestor's configuration object was
//! replaced:
//! ```text
//! Configuration → ComponentType::extend → resolve_constructor_options → create_instance
//! ```
//!
//! Instances are brought up in a fixed phase order (see [`instance`]), with
//! state, events, render wiring, injection and mounting delegated to
//! replaceable collaborators.
//!
//! ## Modules
//!
//! - [`value`] - Dynamic values held in props, data and bindings
//! - [`options`] - Configuration model and merge strategies
//! - [`engine`] - Type arena, resolution cache, late-modification dedupe
//! - [`instance`] - Instance creation, lifecycle, built-in collaborators
//! - [`config`] - Runtime switches and the diagnostic channel
//! - [`error`] - Error and diagnostic types

pub mod config;
pub mod engine;
pub mod error;
pub mod instance;
pub mod options;
pub mod value;

// Re-export commonly used items
pub use value::Value;

pub use config::{RuntimeConfig, config, is_production, report, reset_config, set_config, update_config};

pub use engine::{ComponentType, reset_types, resolve_constructor_options, resolve_modified_options};

pub use error::{Diagnostic, HookError, InitError, MountError, ResolveError, Severity, WiringError};

pub use options::{
    Configuration, Directive, Getter, Hook, HookKind, InjectSpec, Item, Listener, MergeStrategy,
    Method, OptionKey, OptionMap, OptionValue, PropSpec, RenderFn, Watcher, merge_options,
};

pub use instance::{
    Collaborators, CreateOptions, Descriptor, Instance, InstanceOptions, InternalComponentOptions,
    LifecycleFlags, LifecyclePhase, Tag, VNode, WeakInstance, call_hook, create_instance,
};
