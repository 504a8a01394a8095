use super::definition::{Component, Definition, Setup};
use crate::app::Pivot;
use crate::error::Result;
use crate::reconcile;
use crate::surface::ElementId;
use crate::vnode::{Props, VNode};
use smartstring::alias::String as SmartString;
use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, error, trace};

pub(crate) struct InstanceInner {
    name: Option<SmartString>,
    props: Props,
    refs: RefCell<HashMap<SmartString, ElementId>>,
    tree: RefCell<Option<VNode>>,
    component: Box<dyn Component>,
    fields: Vec<SmartString>,
    /// Set while a deferred render is queued
    pending: Cell<bool>,
    disposed: Cell<bool>,
    renders: Cell<u64>,
    pivot: Pivot,
}

impl InstanceInner {
    /// Queue one deferred render unless one is already pending
    pub(crate) fn schedule_render(this: &Rc<InstanceInner>) {
        if this.disposed.get() || this.pending.replace(true) {
            return;
        }
        trace!(component = ?this.name, "render scheduled");

        let weak = Rc::downgrade(this);
        this.pivot.runtime().defer().defer(Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(false);
            let instance = Instance(inner);
            if let Err(err) = instance.render() {
                error!(component = ?instance.name(), "deferred render failed: {}", err);
            }
        }));
    }
}

/// One running component: its fields, slots and current tree.
///
/// Cloning shares the instance.
#[derive(Clone)]
pub struct Instance(Rc<InstanceInner>);

impl Instance {
    /// Run the definition's generator against a fresh instance. Nothing is rendered yet.
    pub(crate) fn new(pivot: &Pivot, definition: &Definition, props: Props) -> Self {
        let inner = Rc::new_cyclic(|weak| {
            let mut setup = Setup::new(weak.clone(), &props, pivot);
            let component = definition.generate(&mut setup);
            let fields = setup.into_fields();

            InstanceInner {
                name: definition.name().map(Into::into),
                props,
                refs: RefCell::new(HashMap::new()),
                tree: RefCell::new(None),
                component,
                fields,
                pending: Cell::new(false),
                disposed: Cell::new(false),
                renders: Cell::new(0),
                pivot: pivot.clone(),
            }
        });
        Instance(inner)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn props(&self) -> &Props {
        &self.0.props
    }

    pub fn pivot(&self) -> &Pivot {
        &self.0.pivot
    }

    /// Names of the reactive fields declared during setup
    pub fn field_names(&self) -> &[SmartString] {
        &self.0.fields
    }

    pub fn refs(&self) -> Ref<'_, HashMap<SmartString, ElementId>> {
        self.0.refs.borrow()
    }

    /// Element registered under `slot` during the last render
    pub fn slot(&self, slot: &str) -> Option<ElementId> {
        self.0.refs.borrow().get(slot).copied()
    }

    pub(crate) fn register_ref(&self, slot: &str, el: ElementId) {
        self.0.refs.borrow_mut().insert(slot.into(), el);
    }

    /// Root of the most recently rendered tree
    pub fn tree(&self) -> Option<VNode> {
        self.0.tree.borrow().clone()
    }

    /// Live element of the current root
    pub fn element(&self) -> Option<ElementId> {
        self.0.tree.borrow().as_ref().and_then(VNode::handle)
    }

    pub fn render_count(&self) -> u64 {
        self.0.renders.get()
    }

    pub fn is_render_pending(&self) -> bool {
        self.0.pending.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.get()
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Produce a new tree and bring the live surface in line with it.
    ///
    /// The first call materializes the tree (detached) and then fires
    /// `loaded`; later calls diff against the previous tree.
    pub fn render(&self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }

        let next = self.0.component.render(self)?;
        next.set_owner(self.clone());

        let previous = self.tree();
        let rt = self.0.pivot.runtime();
        match previous {
            Some(previous) => {
                reconcile::diff(rt, &previous, &next, Some(self))?;
                *self.0.tree.borrow_mut() = Some(next);
                self.0.renders.set(self.0.renders.get() + 1);
            }
            None => {
                let el = next.materialize(rt, None, Some(self))?;
                *self.0.tree.borrow_mut() = Some(next);
                self.0.renders.set(self.0.renders.get() + 1);
                debug!(component = ?self.name(), ?el, "mounted");
                self.0.component.loaded(self)?;
            }
        }
        Ok(())
    }

    /// Drop the current tree and ignore further renders.
    ///
    /// The reconciler calls this for instances whose roots it discards.
    pub fn dispose(&self) {
        if self.0.disposed.replace(true) {
            return;
        }
        debug!(component = ?self.name(), "disposed");
        self.0.refs.borrow_mut().clear();
        let tree = self.0.tree.borrow_mut().take();
        drop(tree);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.0.name)
            .field("fields", &self.0.fields)
            .field("renders", &self.0.renders.get())
            .field("pending", &self.0.pending.get())
            .finish()
    }
}
