use crate::component::{Component, Definition, Setup};
use crate::error::{PivotError, Result};
use smartstring::alias::String as SmartString;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Name to definition table
#[derive(Default)]
pub struct Registry {
    definitions: RefCell<HashMap<SmartString, Rc<Definition>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a definition and store it under `name`.
    ///
    /// Anonymous definitions (`None`) are returned without being stored.
    pub fn register<F>(&self, name: Option<&str>, generator: F) -> Result<Rc<Definition>>
    where
        F: Fn(&mut Setup<'_>) -> Box<dyn Component> + 'static,
    {
        let Some(name) = name else {
            return Ok(Rc::new(Definition::new(None, generator)));
        };

        let mut definitions = self.definitions.borrow_mut();
        if definitions.contains_key(name) {
            return Err(PivotError::AlreadyRegistered(name.into()));
        }

        let definition = Rc::new(Definition::new(Some(name), generator));
        definitions.insert(name.into(), definition.clone());
        debug!(component = name, "registered");
        Ok(definition)
    }

    pub fn get(&self, name: &str) -> Option<Rc<Definition>> {
        self.definitions.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.borrow().is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<SmartString> {
        let mut names: Vec<_> = self.definitions.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}
