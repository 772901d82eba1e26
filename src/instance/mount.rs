//! Built-in mounting: render, instantiate child components, apply
//! directives.
//!
//! Children are created through the internal fast path and mounted while
//! the parent is mounting, so their `mounted` hooks fire before the
//! parent's. A child that fails to mount is reported and skipped.

use crate::config::report;
use crate::error::{Diagnostic, MountError};

use super::collaborators::Mounter;
use super::init::{CreateOptions, InternalComponentOptions, create_instance};
use super::render::VNode;
use super::{Instance, LifecyclePhase};

/// Built-in [`Mounter`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderMount;

impl Mounter for RenderMount {
    fn mount(&self, vm: &Instance, _target: Option<&str>) -> Result<(), MountError> {
        let Some(render) = vm.options().render() else {
            return Err(MountError::MissingRender {
                component: vm.name(),
            });
        };
        let vnode = render.call(vm);
        patch(vm, &vnode)?;
        vm.set_vnode(vnode);
        Ok(())
    }
}

fn patch(vm: &Instance, node: &VNode) -> Result<(), MountError> {
    let options = vm.options();
    for (name, binding) in &node.directives {
        if let Some(directive) = options.config().get_directive(name) {
            directive.apply(node, binding);
        }
    }

    if let Some(component) = &node.component {
        let child = create_instance(
            component.ty,
            CreateOptions::internal(InternalComponentOptions {
                parent: vm.clone(),
                parent_vnode: node.clone(),
                render: None,
            }),
        )?;
        // Slot content belongs to the child and is rendered by it.
        if let Err(err) = child.mount(None) {
            report(Diagnostic::WiringFailed {
                uid: child.uid(),
                component: child.name(),
                phase: LifecyclePhase::Mounted,
                error: err.to_string(),
            });
        }
        return Ok(());
    }

    for child in &node.children {
        patch(vm, child)?;
    }
    Ok(())
}
