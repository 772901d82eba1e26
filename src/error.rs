//! Error and diagnostic types.
//!
//! Only resolution failures are fatal to instantiation ([`ResolveError`],
//! surfaced as [`InitError`]). Everything a hook or collaborator can do wrong
//! is turned into a [`Diagnostic`] and reported through
//! [`crate::config::report`], after which initialization continues.

use thiserror::Error;

use crate::instance::LifecyclePhase;
use crate::options::HookKind;

// =============================================================================
// Fatal errors
// =============================================================================

/// Errors raised while resolving a component type's configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The ancestor chain loops back onto a type already being resolved.
    #[error("component type {cid} is its own ancestor (chain: {chain:?})")]
    Cycle {
        /// The type that was reached twice.
        cid: u32,
        /// Types walked before the loop closed, descendant first.
        chain: Vec<u32>,
    },
    /// The handle does not refer to a type in this thread's arena.
    #[error("unknown component type {0}")]
    UnknownType(u32),
}

/// Errors that abort instantiation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

// =============================================================================
// Recoverable errors
// =============================================================================

/// Error returned by a user hook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Error returned by a collaborator during one of the wiring phases.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WiringError {
    #[error("{0}")]
    Failed(String),
    /// The instance was not in a state the collaborator can work with.
    #[error("instance is not ready: {0}")]
    NotReady(&'static str),
}

/// Error returned by the mount collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    /// Nothing to render: neither the type nor the instantiation supplied a
    /// render function.
    #[error("failed to mount component {component}: render function not defined")]
    MissingRender { component: String },
    /// The instance was already torn down.
    #[error("cannot mount destroyed component {component}")]
    Destroyed { component: String },
    /// A child component could not be instantiated.
    #[error(transparent)]
    Child(#[from] InitError),
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Severity of a [`Diagnostic`], selecting which handler receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A recovered failure or warning, reported without unwinding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("error in {hook} hook \"{label}\" of {component} (uid {uid}): {error}")]
    HookFailed {
        uid: u64,
        component: String,
        hook: HookKind,
        label: String,
        error: HookError,
    },
    #[error("{phase:?} failed for {component} (uid {uid}): {error}")]
    WiringFailed {
        uid: u64,
        component: String,
        phase: LifecyclePhase,
        error: String,
    },
    #[error("render error in {component} (uid {uid}): {error}")]
    RenderFailed {
        uid: u64,
        component: String,
        error: String,
    },
    #[error("injection \"{key}\" not found for {component} (uid {uid})")]
    MissingInjection {
        uid: u64,
        component: String,
        key: String,
    },
    #[error("missing required prop \"{key}\" on {component} (uid {uid})")]
    MissingProp {
        uid: u64,
        component: String,
        key: String,
    },
    #[error("property \"{key}\" is not defined on {component} (uid {uid})")]
    UndeclaredProperty {
        uid: u64,
        component: String,
        key: String,
    },
    #[error("property \"{key}\" on {component} (uid {uid}) is reserved or conflicts with another declaration")]
    ReservedProperty {
        uid: u64,
        component: String,
        key: String,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::HookFailed { .. } | Self::WiringFailed { .. } | Self::RenderFailed { .. } => {
                Severity::Error
            }
            Self::MissingInjection { .. }
            | Self::MissingProp { .. }
            | Self::UndeclaredProperty { .. }
            | Self::ReservedProperty { .. } => Severity::Warning,
        }
    }

    /// The uid of the instance the diagnostic concerns.
    pub fn uid(&self) -> u64 {
        match self {
            Self::HookFailed { uid, .. }
            | Self::WiringFailed { uid, .. }
            | Self::RenderFailed { uid, .. }
            | Self::MissingInjection { uid, .. }
            | Self::MissingProp { uid, .. }
            | Self::UndeclaredProperty { uid, .. }
            | Self::ReservedProperty { uid, .. } => *uid,
        }
    }
}
