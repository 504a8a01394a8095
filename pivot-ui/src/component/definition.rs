use super::field::Field;
use super::instance::{Instance, InstanceInner};
use crate::app::Pivot;
use crate::error::Result;
use crate::vnode::{Props, VNode};
use smartstring::alias::String as SmartString;
use std::fmt;
use std::rc::{Rc, Weak};

/// Behavior produced by a definition's generator for one instance.
///
/// Reactive state lives in [`Field`]s created through [`Setup::field`] and
/// stored on the implementing type.
pub trait Component {
    /// Describe the current tree. Called on mount and on every scheduled re-render.
    fn render(&self, cx: &Instance) -> Result<VNode>;

    /// Runs once, after the first tree has been materialized
    fn loaded(&self, _cx: &Instance) -> Result<()> {
        Ok(())
    }
}

pub type Generator = Rc<dyn Fn(&mut Setup<'_>) -> Box<dyn Component>>;

/// A registered (or anonymous) component template
pub struct Definition {
    name: Option<SmartString>,
    generator: Generator,
}

impl Definition {
    pub fn new<F>(name: Option<&str>, generator: F) -> Self
    where
        F: Fn(&mut Setup<'_>) -> Box<dyn Component> + 'static,
    {
        Self {
            name: name.map(Into::into),
            generator: Rc::new(generator),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn generate(&self, setup: &mut Setup<'_>) -> Box<dyn Component> {
        (self.generator)(setup)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition").field("name", &self.name).finish()
    }
}

/// Construction context handed to a generator
pub struct Setup<'a> {
    instance: Weak<InstanceInner>,
    props: &'a Props,
    pivot: &'a Pivot,
    fields: Vec<SmartString>,
}

impl<'a> Setup<'a> {
    pub(crate) fn new(instance: Weak<InstanceInner>, props: &'a Props, pivot: &'a Pivot) -> Self {
        Self {
            instance,
            props,
            pivot,
            fields: Vec::new(),
        }
    }

    /// Constructor-supplied props of the instance being built
    pub fn props(&self) -> &Props {
        self.props
    }

    pub fn pivot(&self) -> &Pivot {
        self.pivot
    }

    /// Declare a reactive field bound to the instance being built
    pub fn field<T: PartialEq + 'static>(&mut self, name: &str, initial: T) -> Field<T> {
        self.fields.push(name.into());
        Field::new(name, initial, self.instance.clone())
    }

    pub(crate) fn into_fields(self) -> Vec<SmartString> {
        self.fields
    }
}
