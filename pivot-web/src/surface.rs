use pivot_ui::{ElementId, Event, Handler, Surface, SurfaceError, SurfaceResult};
use smartstring::alias::String as SmartString;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::trace;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Node};

type ListenerKey = (ElementId, SmartString, usize);

/// [`Surface`] backed by the browser DOM.
///
/// Elements are kept in a table indexed by [`ElementId`]. Removing an element
/// releases its slot and listener closures along with those of its
/// descendants; ids are never reused, so a released id reports
/// `UnknownElement`.
pub struct DomSurface {
    document: Document,
    elements: RefCell<Vec<Option<Element>>>,
    /// Closures registered with the DOM, kept so they can be removed again
    listeners: RefCell<HashMap<ListenerKey, Closure<dyn Fn(web_sys::Event)>>>,
}

fn native(err: JsValue) -> SurfaceError {
    SurfaceError::Native(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

impl DomSurface {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            elements: RefCell::new(Vec::new()),
            listeners: RefCell::new(HashMap::new()),
        }
    }

    /// Surface over the current window's document
    pub fn from_window() -> Result<Self, JsValue> {
        let document = web_sys::window()
            .ok_or("no window")?
            .document()
            .ok_or("no document")?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Get an id for an element created outside the surface (e.g. a container)
    pub fn adopt(&self, element: Element) -> ElementId {
        let node: &Node = &element;
        let mut elements = self.elements.borrow_mut();
        let existing = elements
            .iter()
            .position(|e| e.as_ref().is_some_and(|e| e.is_same_node(Some(node))));
        if let Some(index) = existing {
            return ElementId(index as u32);
        }
        elements.push(Some(element));
        ElementId(elements.len() as u32 - 1)
    }

    /// Native element behind `el`
    pub fn element(&self, el: ElementId) -> SurfaceResult<Element> {
        self.slot(el)?.ok_or(SurfaceError::UnknownElement(el))
    }

    /// Number of elements currently tracked
    pub fn tracked(&self) -> usize {
        self.elements.borrow().iter().flatten().count()
    }

    /// Number of listener closures currently held
    pub fn listener_len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// `None` once `el` has been released
    fn slot(&self, el: ElementId) -> SurfaceResult<Option<Element>> {
        self.elements
            .borrow()
            .get(el.0 as usize)
            .cloned()
            .ok_or(SurfaceError::UnknownElement(el))
    }

    /// Forget every tracked element inside `root` and drop their listeners
    fn release_within(&self, root: &Node, include_root: bool) {
        let mut freed: Vec<(ElementId, Element)> = Vec::new();
        for (index, slot) in self.elements.borrow_mut().iter_mut().enumerate() {
            let inside = slot.as_ref().is_some_and(|e| {
                let node: &Node = e;
                root.contains(Some(node)) && (include_root || !root.is_same_node(Some(node)))
            });
            if !inside {
                continue;
            }
            if let Some(element) = slot.take() {
                freed.push((ElementId(index as u32), element));
            }
        }
        if freed.is_empty() {
            return;
        }

        let mut listeners = self.listeners.borrow_mut();
        let keys: Vec<ListenerKey> = listeners
            .keys()
            .filter(|(id, _, _)| freed.iter().any(|(f, _)| f == id))
            .cloned()
            .collect();
        for key in keys {
            let Some(closure) = listeners.remove(&key) else {
                continue;
            };
            if let Some((_, element)) = freed.iter().find(|(id, _)| *id == key.0) {
                let _ = element
                    .remove_event_listener_with_callback(&key.1, closure.as_ref().unchecked_ref());
            }
        }
        trace!(count = freed.len(), "released elements");
    }
}

impl Surface for DomSurface {
    fn create_element(&self, tag: &str) -> SurfaceResult<ElementId> {
        let element = self
            .document
            .create_element(tag)
            .map_err(|_| SurfaceError::InvalidTag(tag.to_string()))?;
        let mut elements = self.elements.borrow_mut();
        elements.push(Some(element));
        Ok(ElementId(elements.len() as u32 - 1))
    }

    fn attribute(&self, el: ElementId, name: &str) -> SurfaceResult<Option<String>> {
        Ok(self.element(el)?.get_attribute(name))
    }

    fn set_attribute(&self, el: ElementId, name: &str, value: &str) -> SurfaceResult<()> {
        self.element(el)?
            .set_attribute(name, value)
            .map_err(|_| SurfaceError::InvalidAttribute(name.to_string()))
    }

    fn remove_attribute(&self, el: ElementId, name: &str) -> SurfaceResult<()> {
        self.element(el)?.remove_attribute(name).map_err(native)
    }

    fn add_listener(&self, el: ElementId, event: &str, handler: &Handler) -> SurfaceResult<()> {
        let element = self.element(el)?;
        let key = (el, SmartString::from(event), handler.addr());
        let mut listeners = self.listeners.borrow_mut();
        if listeners.contains_key(&key) {
            return Ok(());
        }

        let handler = handler.clone();
        let kind = SmartString::from(event);
        let closure = Closure::<dyn Fn(web_sys::Event)>::new(move |_: web_sys::Event| {
            handler.call(&Event {
                kind: kind.clone(),
                target: el,
            });
        });
        element
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(native)?;
        trace!(?el, event, "listener added");
        listeners.insert(key, closure);
        Ok(())
    }

    fn remove_listener(
        &self,
        el: ElementId,
        event: &str,
        handler: &Handler,
    ) -> SurfaceResult<()> {
        let element = self.element(el)?;
        let key = (el, SmartString::from(event), handler.addr());
        let Some(closure) = self.listeners.borrow_mut().remove(&key) else {
            return Ok(());
        };
        element
            .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(native)
    }

    fn append_child(&self, parent: ElementId, child: ElementId) -> SurfaceResult<()> {
        let parent_el = self.element(parent)?;
        let child_el = self.element(child)?;
        parent_el
            .append_child(&child_el)
            .map_err(|_| SurfaceError::HierarchyRequest { parent, child })?;
        Ok(())
    }

    fn insert_after(&self, sibling: ElementId, el: ElementId) -> SurfaceResult<()> {
        let sibling_el = self.element(sibling)?;
        let element = self.element(el)?;
        if sibling_el.parent_node().is_none() {
            return Err(SurfaceError::Detached(sibling));
        }
        sibling_el
            .insert_adjacent_element("afterend", &element)
            .map_err(native)?;
        Ok(())
    }

    fn remove(&self, el: ElementId) -> SurfaceResult<()> {
        let Some(element) = self.slot(el)? else {
            return Ok(());
        };
        element.remove();
        self.release_within(&element, true);
        Ok(())
    }

    fn set_text(&self, el: ElementId, text: &str) -> SurfaceResult<()> {
        let element = self.element(el)?;
        self.release_within(&element, false);
        element.set_text_content(Some(text));
        Ok(())
    }
}
