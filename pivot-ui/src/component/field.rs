use super::instance::InstanceInner;
use smartstring::alias::String as SmartString;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

struct FieldInner<T> {
    name: SmartString,
    value: RefCell<T>,
    instance: Weak<InstanceInner>,
}

/// Reactive value owned by a component instance.
///
/// Writing a value that differs from the current one (by `PartialEq`) stores it
/// and schedules one deferred re-render of the instance. Clones share the value,
/// so handlers can capture a field and write to it later.
pub struct Field<T> {
    inner: Rc<FieldInner<T>>,
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: PartialEq + 'static> Field<T> {
    pub(crate) fn new(name: &str, initial: T, instance: Weak<InstanceInner>) -> Self {
        Self {
            inner: Rc::new(FieldInner {
                name: name.into(),
                value: RefCell::new(initial),
                instance,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Borrow the current value. Do not hold the borrow across a `set`.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.inner.value.borrow()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store `value` if it differs from the current one. Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        let changed = {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        };

        if changed {
            trace!(field = %self.inner.name, "field changed");
            if let Some(instance) = self.inner.instance.upgrade() {
                InstanceInner::schedule_render(&instance);
            }
        }
        changed
    }
}

impl<T: PartialEq + Clone + 'static> Field<T> {
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Mutate a copy of the value and store it through [`Field::set`]
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }
}

impl<T: fmt::Debug> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.inner.name)
            .field("value", &self.inner.value.borrow())
            .finish()
    }
}
