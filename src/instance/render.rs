//! Virtual nodes and the element factory.
//!
//! Render functions build [`VNode`] trees through [`Instance::create_element`].
//! A tag naming a registered component becomes a component placeholder: a
//! vnode carrying the child's type, props, listeners and slot content. The
//! mount collaborator later turns each placeholder into a child instance
//! through the internal fast path.

use std::collections::HashMap;
use std::rc::Rc;

use crate::config::report;
use crate::engine::ComponentType;
use crate::error::{Diagnostic, WiringError};
use crate::options::Listener;
use crate::value::Value;

use super::Instance;
use super::collaborators::RenderWiring;

// =============================================================================
// VNode
// =============================================================================

/// A node of a rendered tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VNode {
    pub tag: Option<String>,
    pub text: Option<String>,
    pub attrs: HashMap<String, Value>,
    /// Directive bindings: name and bound value.
    pub directives: Vec<(String, Value)>,
    pub children: Vec<VNode>,
    /// Set on component placeholders.
    pub component: Option<VNodeComponentOptions>,
}

/// What a component placeholder carries to the child instance.
#[derive(Debug, Clone, PartialEq)]
pub struct VNodeComponentOptions {
    pub ty: ComponentType,
    pub props_data: HashMap<String, Value>,
    pub listeners: HashMap<String, Vec<Listener>>,
    pub children: Vec<VNode>,
    /// The tag the parent used.
    pub tag: String,
}

impl VNode {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn element(tag: impl Into<String>, children: Vec<VNode>) -> Self {
        Self {
            tag: Some(tag.into()),
            children,
            ..Default::default()
        }
    }

    /// Placeholder rendered where nothing could be created.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_component(&self) -> bool {
        self.component.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.text.is_none()
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// What to create: a plain element or a component.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// Resolved against the registered components first, then treated as a
    /// plain element.
    Name(String),
    Component(ComponentType),
}

/// Input to the element factory.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub tag: Tag,
    pub attrs: HashMap<String, Value>,
    pub listeners: HashMap<String, Vec<Listener>>,
    pub directives: Vec<(String, Value)>,
    pub children: Vec<VNode>,
}

impl Descriptor {
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_tag(Tag::Name(tag.into()))
    }

    pub fn component(ty: ComponentType) -> Self {
        Self::with_tag(Tag::Component(ty))
    }

    fn with_tag(tag: Tag) -> Self {
        Self {
            tag,
            attrs: HashMap::new(),
            listeners: HashMap::new(),
            directives: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn on(mut self, event: impl Into<String>, listener: Listener) -> Self {
        self.listeners.entry(event.into()).or_default().push(listener);
        self
    }

    pub fn directive(mut self, name: impl Into<String>, binding: impl Into<Value>) -> Self {
        self.directives.push((name.into(), binding.into()));
        self
    }

    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }
}

// =============================================================================
// Element factory
// =============================================================================

/// Element factory bound to one instance.
pub type CreateElement = Rc<dyn Fn(Descriptor) -> VNode>;

pub(crate) struct RenderContext {
    create_element: CreateElement,
    slots: Vec<VNode>,
}

impl Instance {
    /// Create a vnode in this instance's context. Before render wiring this
    /// returns an empty node.
    pub fn create_element(&self, descriptor: Descriptor) -> VNode {
        let factory = self
            .0
            .render
            .borrow()
            .as_ref()
            .map(|ctx| ctx.create_element.clone());
        match factory {
            Some(factory) => factory(descriptor),
            None => VNode::empty(),
        }
    }

    /// Slot content passed by the parent.
    pub fn slots(&self) -> Vec<VNode> {
        self.0
            .render
            .borrow()
            .as_ref()
            .map(|ctx| ctx.slots.clone())
            .unwrap_or_default()
    }
}

fn build_vnode(vm: &Instance, descriptor: Descriptor) -> VNode {
    let Descriptor {
        tag,
        attrs,
        listeners,
        directives,
        children,
    } = descriptor;

    let (ty, tag) = match tag {
        Tag::Component(ty) => (Some(ty), format!("anonymous-{}", ty.cid())),
        Tag::Name(name) => (vm.options().component(&name), name),
    };

    let Some(ty) = ty else {
        return VNode {
            tag: Some(tag),
            attrs,
            directives,
            children,
            ..Default::default()
        };
    };

    // A type that no longer resolves renders as nothing.
    if let Err(err) = ty.resolve() {
        report(Diagnostic::RenderFailed {
            uid: vm.uid(),
            component: vm.name(),
            error: err.to_string(),
        });
        return VNode::empty();
    }

    VNode {
        tag: Some(format!("component-{}-{}", ty.cid(), tag)),
        directives,
        component: Some(VNodeComponentOptions {
            ty,
            props_data: attrs,
            listeners,
            children,
            tag,
        }),
        ..Default::default()
    }
}

// =============================================================================
// ElementWiring
// =============================================================================

/// Built-in [`RenderWiring`]: binds a factory resolving tags against the
/// instance's registered components, and captures slot content.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElementWiring;

impl RenderWiring for ElementWiring {
    fn init_render(&self, vm: &Instance) -> Result<(), WiringError> {
        let weak = vm.downgrade();
        let create_element: CreateElement = Rc::new(move |descriptor: Descriptor| match weak.upgrade() {
            Some(vm) => build_vnode(&vm, descriptor),
            None => VNode::empty(),
        });
        let slots = vm.options().render_children().to_vec();
        *vm.0.render.borrow_mut() = Some(RenderContext {
            create_element,
            slots,
        });
        Ok(())
    }
}
