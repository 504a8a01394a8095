mod memory;

pub use memory::MemorySurface;

use crate::error::SurfaceResult;
use smartstring::alias::String as SmartString;
use std::fmt;
use std::rc::Rc;

/// Opaque handle to an element owned by a [`Surface`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

/// Event delivered to a listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: SmartString,
    pub target: ElementId,
}

/// Event listener callback.
///
/// Two handlers are equal only when they share the same allocation, which is
/// what listener diffing and removal rely on.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Handler) -> bool {
        self.addr() == other.addr()
    }

    /// Thin address of the callback, usable as a map key by backends
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:#x})", self.addr())
    }
}

/// Native element API the reconciler renders onto.
///
/// Implementations handle the concrete display (in-memory, browser DOM, ...).
/// Every call is synchronous; removals are idempotent.
pub trait Surface {
    fn create_element(&self, tag: &str) -> SurfaceResult<ElementId>;

    fn attribute(&self, el: ElementId, name: &str) -> SurfaceResult<Option<String>>;

    fn set_attribute(&self, el: ElementId, name: &str, value: &str) -> SurfaceResult<()>;

    fn remove_attribute(&self, el: ElementId, name: &str) -> SurfaceResult<()>;

    fn add_listener(&self, el: ElementId, event: &str, handler: &Handler) -> SurfaceResult<()>;

    fn remove_listener(&self, el: ElementId, event: &str, handler: &Handler)
        -> SurfaceResult<()>;

    /// Append `child` as the last child of `parent`, moving it if already attached
    fn append_child(&self, parent: ElementId, child: ElementId) -> SurfaceResult<()>;

    /// Insert `el` immediately after `sibling` under the sibling's parent
    fn insert_after(&self, sibling: ElementId, el: ElementId) -> SurfaceResult<()>;

    /// Detach `el` from its parent. The element is discarded along with its
    /// descendants; backends may release it.
    fn remove(&self, el: ElementId) -> SurfaceResult<()>;

    /// Replace all content of `el` with a single text value, discarding its
    /// element children
    fn set_text(&self, el: ElementId, text: &str) -> SurfaceResult<()>;
}
