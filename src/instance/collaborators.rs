//! Collaborator seams.
//!
//! Initialization calls out to five collaborators at fixed points. A failing
//! collaborator is reported as [`Diagnostic::WiringFailed`] and the sequence
//! continues with the next phase.
//!
//! [`Diagnostic::WiringFailed`]: crate::error::Diagnostic::WiringFailed

use std::fmt;
use std::rc::Rc;

use crate::error::{MountError, WiringError};

use super::Instance;
use super::events::ListenerWiring;
use super::inject::ParentChainInjector;
use super::mount::RenderMount;
use super::render::ElementWiring;
use super::state::SignalState;

/// Installs props, methods, data, computed values and watchers.
pub trait StateInitializer {
    fn init_state(&self, vm: &Instance) -> Result<(), WiringError>;
}

/// Resolves `inject` before state and `provide` after it.
pub trait Injector {
    fn resolve_injections(&self, vm: &Instance) -> Result<(), WiringError>;
    fn resolve_provisions(&self, vm: &Instance) -> Result<(), WiringError>;
}

/// Adopts the listeners the parent attached to this instance.
pub trait EventWiring {
    fn init_events(&self, vm: &Instance) -> Result<(), WiringError>;
}

/// Binds the element factory and captures slots.
pub trait RenderWiring {
    fn init_render(&self, vm: &Instance) -> Result<(), WiringError>;
}

/// Renders and attaches an instance. Hooks, flags and phase are handled by
/// [`Instance::mount`] around this call.
pub trait Mounter {
    fn mount(&self, vm: &Instance, target: Option<&str>) -> Result<(), MountError>;
}

/// The set of collaborators an instance was created with. Children created
/// during mount inherit their parent's set.
#[derive(Clone)]
pub struct Collaborators {
    pub state: Rc<dyn StateInitializer>,
    pub injector: Rc<dyn Injector>,
    pub events: Rc<dyn EventWiring>,
    pub render: Rc<dyn RenderWiring>,
    pub mounter: Rc<dyn Mounter>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            state: Rc::new(SignalState),
            injector: Rc::new(ParentChainInjector),
            events: Rc::new(ListenerWiring),
            render: Rc::new(ElementWiring),
            mounter: Rc::new(RenderMount),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
