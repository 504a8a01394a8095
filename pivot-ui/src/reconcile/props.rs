use crate::error::Result;
use crate::surface::{ElementId, Surface};
use crate::vnode::{PropKey, PropValue, Props};
use smallvec::SmallVec;
use tracing::trace;

/// Partition of the prop keys of two nodes. `ref` is never part of a delta.
#[derive(Debug, Default)]
pub struct PropDelta<'a> {
    /// Keys only in the new props, with the new value
    pub added: SmallVec<[(&'a PropKey, &'a PropValue); 4]>,
    /// Keys in both whose values differ: key, old value, new value
    pub changed: SmallVec<[(&'a PropKey, &'a PropValue, &'a PropValue); 4]>,
    /// Keys only in the old props, with the old value
    pub removed: SmallVec<[(&'a PropKey, &'a PropValue); 4]>,
}

impl<'a> PropDelta<'a> {
    pub fn between(old: &'a Props, neo: &'a Props) -> Self {
        let mut delta = PropDelta::default();

        for (key, old_value) in old.iter() {
            if *key == PropKey::Ref {
                continue;
            }
            match neo.get(key) {
                Some(new_value) if new_value != old_value => {
                    delta.changed.push((key, old_value, new_value));
                }
                Some(_) => {}
                None => delta.removed.push((key, old_value)),
            }
        }

        for (key, new_value) in neo.iter() {
            if *key != PropKey::Ref && !old.contains(key) {
                delta.added.push((key, new_value));
            }
        }

        delta
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }

    /// Apply to `el`: additions, then changes, then removals.
    /// A changed listener drops the old handler before adding the new one.
    pub fn apply(&self, surface: &dyn Surface, el: ElementId) -> Result<()> {
        for &(key, value) in &self.added {
            trace!(%key, ?el, "prop added");
            match key {
                PropKey::Attr(name) => surface.set_attribute(el, name, &value.to_attr_value(key)?)?,
                PropKey::Listener(event) => surface.add_listener(el, event, value.as_handler(key)?)?,
                PropKey::Ref => {}
            }
        }

        for &(key, old_value, new_value) in &self.changed {
            trace!(%key, ?el, "prop changed");
            match key {
                PropKey::Attr(name) => {
                    surface.set_attribute(el, name, &new_value.to_attr_value(key)?)?
                }
                PropKey::Listener(event) => {
                    surface.remove_listener(el, event, old_value.as_handler(key)?)?;
                    surface.add_listener(el, event, new_value.as_handler(key)?)?;
                }
                PropKey::Ref => {}
            }
        }

        for &(key, old_value) in &self.removed {
            trace!(%key, ?el, "prop removed");
            match key {
                PropKey::Attr(name) => surface.remove_attribute(el, name)?,
                PropKey::Listener(event) => {
                    surface.remove_listener(el, event, old_value.as_handler(key)?)?
                }
                PropKey::Ref => {}
            }
        }

        Ok(())
    }
}
