use super::props::Props;
use crate::component::Instance;
use crate::surface::ElementId;
use smartstring::alias::String as SmartString;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// One entry of a node's child sequence
#[derive(Debug, Clone)]
pub enum Child {
    Node(VNode),
    /// Pre-existing native element mixed into the declarative tree
    Element(ElementId),
}

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        Child::Node(node)
    }
}

impl From<ElementId> for Child {
    fn from(el: ElementId) -> Self {
        Child::Element(el)
    }
}

/// Children are either a sequence or a single text value
#[derive(Debug, Clone)]
pub enum Children {
    Nodes(Rc<[Child]>),
    Text(SmartString),
}

impl Children {
    pub fn empty() -> Self {
        Children::Nodes(Rc::from(Vec::new()))
    }

    pub fn text(text: impl Into<SmartString>) -> Self {
        Children::Text(text.into())
    }

    pub fn nodes(nodes: impl IntoIterator<Item = impl Into<Child>>) -> Self {
        Children::Nodes(nodes.into_iter().map(Into::into).collect())
    }

    /// Identity comparison used to skip child reconciliation.
    /// Sequences match only when they are the same allocation.
    pub fn same(&self, other: &Children) -> bool {
        match (self, other) {
            (Children::Nodes(a), Children::Nodes(b)) => Rc::ptr_eq(a, b),
            (Children::Text(a), Children::Text(b)) => a == b,
            _ => false,
        }
    }

    /// True when the sequence holds native elements the reconciler does not control
    pub fn has_foreign(&self) -> bool {
        match self {
            Children::Nodes(nodes) => nodes.iter().any(|c| matches!(c, Child::Element(_))),
            Children::Text(_) => false,
        }
    }

    pub fn as_nodes(&self) -> Option<&[Child]> {
        match self {
            Children::Nodes(nodes) => Some(nodes),
            Children::Text(_) => None,
        }
    }
}

impl Default for Children {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Children::Text(text.into())
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Children::Text(text.into())
    }
}

impl From<Vec<VNode>> for Children {
    fn from(nodes: Vec<VNode>) -> Self {
        Children::nodes(nodes)
    }
}

impl From<Vec<Child>> for Children {
    fn from(children: Vec<Child>) -> Self {
        Children::Nodes(Rc::from(children))
    }
}

struct VNodeData {
    tag: SmartString,
    props: Props,
    children: Children,
    handle: Cell<Option<ElementId>>,
    owner: RefCell<Option<Instance>>,
}

/// Description of one live element plus its children.
///
/// Cloning shares the node. The description itself is immutable; only the
/// live handle and the owning instance are filled in during rendering.
#[derive(Clone)]
pub struct VNode(Rc<VNodeData>);

impl VNode {
    pub fn new(tag: &str, props: Props, children: impl Into<Children>) -> Self {
        Self(Rc::new(VNodeData {
            tag: tag.into(),
            props,
            children: children.into(),
            handle: Cell::new(None),
            owner: RefCell::new(None),
        }))
    }

    /// Node without props or children
    pub fn element(tag: &str) -> Self {
        Self::new(tag, Props::new(), Children::empty())
    }

    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn props(&self) -> &Props {
        &self.0.props
    }

    pub fn children(&self) -> &Children {
        &self.0.children
    }

    /// Live element produced by the last render, if any
    pub fn handle(&self) -> Option<ElementId> {
        self.0.handle.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.handle().is_some()
    }

    pub(crate) fn set_handle(&self, handle: ElementId) {
        self.0.handle.set(Some(handle));
    }

    /// Instance whose render produced this node (roots only)
    pub fn owner(&self) -> Option<Instance> {
        self.0.owner.borrow().clone()
    }

    pub(crate) fn set_owner(&self, owner: Instance) {
        *self.0.owner.borrow_mut() = Some(owner);
    }

    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VNode")
            .field("tag", &self.0.tag)
            .field("props", &self.0.props)
            .field("children", &self.0.children)
            .field("handle", &self.0.handle.get())
            .finish()
    }
}

/// Shorthand for [`VNode::new`]
pub fn h(tag: &str, props: Props, children: impl Into<Children>) -> VNode {
    VNode::new(tag, props, children)
}
