//! Runtime configuration and the diagnostic channel.
//!
//! Configuration is thread-local, like the rest of the runtime state. It
//! selects development or production behavior, enables init timing, and
//! routes [`Diagnostic`]s to caller-installed handlers.
//!
//! # Example
//!
//! ```ignore
//! use spark_components::config::update_config;
//!
//! update_config(|c| {
//!     c.production = false;
//!     c.warn_handler = Some(Rc::new(|d| eprintln!("warning: {d}")));
//! });
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{error, warn};

use crate::error::{Diagnostic, Severity};

/// Callback receiving reported diagnostics.
pub type DiagnosticHandler = Rc<dyn Fn(&Diagnostic)>;

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Process-level (per thread) runtime switches.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Production mode skips the property access guard and the reserved
    /// name checks.
    pub production: bool,
    /// Measure instance initialization time and log it at debug level.
    pub performance: bool,
    /// Suppress warning log output. Handlers still run.
    pub silent: bool,
    /// Receives error-severity diagnostics (failed hooks, failed wiring).
    pub error_handler: Option<DiagnosticHandler>,
    /// Receives warning-severity diagnostics.
    pub warn_handler: Option<DiagnosticHandler>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            production: !cfg!(debug_assertions),
            performance: false,
            silent: false,
            error_handler: None,
            warn_handler: None,
        }
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("production", &self.production)
            .field("performance", &self.performance)
            .field("silent", &self.silent)
            .field("error_handler", &self.error_handler.is_some())
            .field("warn_handler", &self.warn_handler.is_some())
            .finish()
    }
}

thread_local! {
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::default());
}

/// Get a copy of the current configuration.
pub fn config() -> RuntimeConfig {
    CONFIG.with(|c| c.borrow().clone())
}

/// Replace the configuration.
pub fn set_config(config: RuntimeConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// Modify the configuration in place.
pub fn update_config(f: impl FnOnce(&mut RuntimeConfig)) {
    CONFIG.with(|c| f(&mut c.borrow_mut()));
}

/// Restore defaults (for testing).
pub fn reset_config() {
    set_config(RuntimeConfig::default());
}

/// Check if production mode is active.
pub fn is_production() -> bool {
    CONFIG.with(|c| c.borrow().production)
}

// =============================================================================
// Diagnostic channel
// =============================================================================

/// Report a diagnostic.
///
/// Logs through `tracing` and forwards to the matching handler. The config
/// borrow is released before the handler runs, so handlers may themselves
/// read or update configuration.
pub fn report(diagnostic: Diagnostic) {
    let (handler, silent) = CONFIG.with(|c| {
        let c = c.borrow();
        let handler = match diagnostic.severity() {
            Severity::Error => c.error_handler.clone(),
            Severity::Warning => c.warn_handler.clone(),
        };
        (handler, c.silent)
    });

    match diagnostic.severity() {
        Severity::Error => error!(uid = diagnostic.uid(), "{diagnostic}"),
        Severity::Warning if !silent => warn!(uid = diagnostic.uid(), "{diagnostic}"),
        Severity::Warning => {}
    }

    if let Some(handler) = handler {
        handler(&diagnostic);
    }
}
