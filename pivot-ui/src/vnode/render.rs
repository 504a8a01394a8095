use super::props::PropKey;
use super::types::{Child, Children, VNode};
use crate::app::Pivot;
use crate::component::Instance;
use crate::error::{PivotError, Result};
use crate::runtime::Runtime;
use crate::surface::ElementId;
use tracing::trace;

impl VNode {
    /// Materialize this node and its descendants onto the live surface.
    ///
    /// With a `parent`, the new element is appended as its last child. Slot
    /// registrations go to the parent's owning instance when the parent is a
    /// component root.
    pub fn render(&self, pivot: &Pivot, parent: Option<&VNode>) -> Result<&Self> {
        let parent_el = match parent {
            Some(p) => Some(
                p.handle()
                    .ok_or_else(|| PivotError::NotMounted(p.tag().into()))?,
            ),
            None => None,
        };
        let scope = parent.and_then(VNode::owner);
        self.materialize(pivot.runtime(), parent_el, scope.as_ref())?;
        Ok(self)
    }

    /// Create the element for this node, always producing a fresh handle.
    /// `scope` is the instance that receives `ref` registrations.
    pub(crate) fn materialize(
        &self,
        rt: &Runtime,
        parent: Option<ElementId>,
        scope: Option<&Instance>,
    ) -> Result<ElementId> {
        let surface = rt.surface();
        let el = surface.create_element(self.tag())?;
        self.set_handle(el);

        let owner = self.owner();
        if let (Some(owner), Some(marker)) = (&owner, &rt.config().component_attribute) {
            surface.set_attribute(el, marker, owner.name().unwrap_or(""))?;
        }
        let scope = owner.as_ref().or(scope);

        for (key, value) in self.props().iter() {
            match key {
                PropKey::Ref => {
                    if let (Some(instance), Some(slot)) = (scope, self.props().slot_name()) {
                        instance.register_ref(slot, el);
                    }
                }
                PropKey::Listener(event) => {
                    surface.add_listener(el, event, value.as_handler(key)?)?;
                }
                PropKey::Attr(name) => {
                    surface.set_attribute(el, name, &value.to_attr_value(key)?)?;
                }
            }
        }

        attach_children(rt, el, self.children(), scope)?;

        if let Some(parent) = parent {
            surface.append_child(parent, el)?;
        }
        trace!(tag = %self.tag(), ?el, "materialized");
        Ok(el)
    }
}

fn attach_children(
    rt: &Runtime,
    el: ElementId,
    children: &Children,
    scope: Option<&Instance>,
) -> Result<()> {
    match children {
        Children::Text(text) => rt.surface().set_text(el, text)?,
        Children::Nodes(nodes) => {
            for child in nodes.iter() {
                attach_child(rt, el, child, scope)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn attach_child(
    rt: &Runtime,
    parent: ElementId,
    child: &Child,
    scope: Option<&Instance>,
) -> Result<()> {
    let surface = rt.surface();
    match child {
        Child::Node(node) => match node.handle() {
            // Mounted component roots keep the element their instance owns
            Some(existing) if node.owner().is_some() => surface.append_child(parent, existing)?,
            _ => {
                node.materialize(rt, Some(parent), scope)?;
            }
        },
        Child::Element(native) => {
            if let Some(instance) = scope {
                if let Some(slot) = surface.attribute(*native, &rt.config().native_ref_attribute)? {
                    instance.register_ref(&slot, *native);
                }
            }
            surface.append_child(parent, *native)?;
        }
    }
    Ok(())
}
