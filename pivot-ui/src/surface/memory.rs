use super::{ElementId, Event, Handler, Surface};
use crate::error::{SurfaceError, SurfaceResult};
use indexmap::IndexMap;
use smartstring::alias::String as SmartString;
use std::cell::RefCell;
use std::fmt::Write as _;

#[derive(Debug, Clone)]
enum Content {
    Text(String),
    Element(ElementId),
}

#[derive(Debug)]
struct ElementData {
    tag: SmartString,
    attributes: IndexMap<SmartString, String>,
    listeners: Vec<(SmartString, Handler)>,
    content: Vec<Content>,
    parent: Option<ElementId>,
}

/// In-memory element tree for tests and headless use.
///
/// Element ids are never recycled, so a removed element stays inspectable
/// (detached) for as long as the surface lives.
#[derive(Debug, Default)]
pub struct MemorySurface {
    elements: RefCell<Vec<ElementData>>,
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit() || c == '-')
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '>' | '/' | '=' | '<' | '@'))
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element to mount trees into
    pub fn create_root(&self) -> ElementId {
        let mut elements = self.elements.borrow_mut();
        let id = ElementId(elements.len() as u32);
        elements.push(ElementData {
            tag: "root".into(),
            attributes: IndexMap::new(),
            listeners: Vec::new(),
            content: Vec::new(),
            parent: None,
        });
        id
    }

    /// Total number of elements ever created
    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tag(&self, el: ElementId) -> Option<String> {
        self.elements
            .borrow()
            .get(el.0 as usize)
            .map(|e| e.tag.to_string())
    }

    pub fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.elements.borrow().get(el.0 as usize)?.parent
    }

    pub fn is_attached(&self, el: ElementId) -> bool {
        self.parent(el).is_some()
    }

    /// Element children in document order (text content is skipped)
    pub fn children(&self, el: ElementId) -> Vec<ElementId> {
        match self.elements.borrow().get(el.0 as usize) {
            Some(data) => data
                .content
                .iter()
                .filter_map(|c| match c {
                    Content::Element(id) => Some(*id),
                    Content::Text(_) => None,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Concatenated text of the element and all its descendants
    pub fn text_content(&self, el: ElementId) -> String {
        let elements = self.elements.borrow();
        let mut out = String::new();
        collect_text(&elements, el, &mut out);
        out
    }

    pub fn attributes(&self, el: ElementId) -> Vec<(String, String)> {
        match self.elements.borrow().get(el.0 as usize) {
            Some(data) => data
                .attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn listener_count(&self, el: ElementId, event: &str) -> usize {
        match self.elements.borrow().get(el.0 as usize) {
            Some(data) => data.listeners.iter().filter(|(e, _)| e == event).count(),
            None => 0,
        }
    }

    /// Invoke every listener registered for `event` on `el`.
    /// Returns the number of handlers that ran.
    pub fn dispatch(&self, el: ElementId, event: &str) -> SurfaceResult<usize> {
        let handlers: Vec<Handler> = {
            let elements = self.elements.borrow();
            let data = elements
                .get(el.0 as usize)
                .ok_or(SurfaceError::UnknownElement(el))?;
            data.listeners
                .iter()
                .filter(|(e, _)| e == event)
                .map(|(_, h)| h.clone())
                .collect()
        };

        let payload = Event {
            kind: event.into(),
            target: el,
        };
        for handler in &handlers {
            handler.call(&payload);
        }
        Ok(handlers.len())
    }

    /// Serialize the subtree rooted at `el` as markup, for debugging and assertions
    pub fn markup(&self, el: ElementId) -> String {
        let elements = self.elements.borrow();
        let mut out = String::new();
        write_markup(&elements, el, &mut out);
        out
    }

    fn with_element<T>(
        &self,
        el: ElementId,
        f: impl FnOnce(&mut ElementData) -> T,
    ) -> SurfaceResult<T> {
        let mut elements = self.elements.borrow_mut();
        let data = elements
            .get_mut(el.0 as usize)
            .ok_or(SurfaceError::UnknownElement(el))?;
        Ok(f(data))
    }

    fn check(&self, el: ElementId) -> SurfaceResult<()> {
        if (el.0 as usize) < self.elements.borrow().len() {
            Ok(())
        } else {
            Err(SurfaceError::UnknownElement(el))
        }
    }

    fn detach(elements: &mut [ElementData], el: ElementId) {
        let Some(parent) = elements[el.0 as usize].parent.take() else {
            return;
        };
        elements[parent.0 as usize]
            .content
            .retain(|c| !matches!(c, Content::Element(id) if *id == el));
    }

    fn is_ancestor(elements: &[ElementData], candidate: ElementId, of: ElementId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = elements[id.0 as usize].parent;
        }
        false
    }
}

fn collect_text(elements: &[ElementData], el: ElementId, out: &mut String) {
    let Some(data) = elements.get(el.0 as usize) else {
        return;
    };
    for content in &data.content {
        match content {
            Content::Text(text) => out.push_str(text),
            Content::Element(child) => collect_text(elements, *child, out),
        }
    }
}

fn write_markup(elements: &[ElementData], el: ElementId, out: &mut String) {
    let Some(data) = elements.get(el.0 as usize) else {
        return;
    };
    let _ = write!(out, "<{}", data.tag);
    for (name, value) in &data.attributes {
        let _ = write!(out, " {}=\"{}\"", name, value);
    }
    out.push('>');
    for content in &data.content {
        match content {
            Content::Text(text) => out.push_str(text),
            Content::Element(child) => write_markup(elements, *child, out),
        }
    }
    let _ = write!(out, "</{}>", data.tag);
}

impl Surface for MemorySurface {
    fn create_element(&self, tag: &str) -> SurfaceResult<ElementId> {
        if !valid_name(tag) {
            return Err(SurfaceError::InvalidTag(tag.to_string()));
        }
        let mut elements = self.elements.borrow_mut();
        let id = ElementId(elements.len() as u32);
        elements.push(ElementData {
            tag: tag.into(),
            attributes: IndexMap::new(),
            listeners: Vec::new(),
            content: Vec::new(),
            parent: None,
        });
        Ok(id)
    }

    fn attribute(&self, el: ElementId, name: &str) -> SurfaceResult<Option<String>> {
        self.with_element(el, |data| data.attributes.get(name).cloned())
    }

    fn set_attribute(&self, el: ElementId, name: &str, value: &str) -> SurfaceResult<()> {
        if !valid_name(name) {
            return Err(SurfaceError::InvalidAttribute(name.to_string()));
        }
        self.with_element(el, |data| {
            data.attributes.insert(name.into(), value.to_string());
        })
    }

    fn remove_attribute(&self, el: ElementId, name: &str) -> SurfaceResult<()> {
        self.with_element(el, |data| {
            data.attributes.shift_remove(name);
        })
    }

    fn add_listener(&self, el: ElementId, event: &str, handler: &Handler) -> SurfaceResult<()> {
        self.with_element(el, |data| {
            // Same (event, callback) pair registers once, like the DOM
            let exists = data
                .listeners
                .iter()
                .any(|(e, h)| e == event && h.ptr_eq(handler));
            if !exists {
                data.listeners.push((event.into(), handler.clone()));
            }
        })
    }

    fn remove_listener(
        &self,
        el: ElementId,
        event: &str,
        handler: &Handler,
    ) -> SurfaceResult<()> {
        self.with_element(el, |data| {
            data.listeners
                .retain(|(e, h)| !(e == event && h.ptr_eq(handler)));
        })
    }

    fn append_child(&self, parent: ElementId, child: ElementId) -> SurfaceResult<()> {
        self.check(parent)?;
        self.check(child)?;
        let mut elements = self.elements.borrow_mut();
        if Self::is_ancestor(&elements, child, parent) {
            return Err(SurfaceError::HierarchyRequest { parent, child });
        }
        Self::detach(&mut elements, child);
        elements[parent.0 as usize]
            .content
            .push(Content::Element(child));
        elements[child.0 as usize].parent = Some(parent);
        Ok(())
    }

    fn insert_after(&self, sibling: ElementId, el: ElementId) -> SurfaceResult<()> {
        self.check(sibling)?;
        self.check(el)?;
        let mut elements = self.elements.borrow_mut();
        let parent = elements[sibling.0 as usize]
            .parent
            .ok_or(SurfaceError::Detached(sibling))?;
        if sibling == el {
            return Ok(());
        }
        if Self::is_ancestor(&elements, el, parent) {
            return Err(SurfaceError::HierarchyRequest { parent, child: el });
        }
        Self::detach(&mut elements, el);

        let content = &mut elements[parent.0 as usize].content;
        let index = content
            .iter()
            .position(|c| matches!(c, Content::Element(id) if *id == sibling))
            .map(|i| i + 1)
            .unwrap_or(content.len());
        content.insert(index, Content::Element(el));
        elements[el.0 as usize].parent = Some(parent);
        Ok(())
    }

    fn remove(&self, el: ElementId) -> SurfaceResult<()> {
        self.check(el)?;
        Self::detach(&mut self.elements.borrow_mut(), el);
        Ok(())
    }

    fn set_text(&self, el: ElementId, text: &str) -> SurfaceResult<()> {
        self.check(el)?;
        let mut elements = self.elements.borrow_mut();
        let old = std::mem::take(&mut elements[el.0 as usize].content);
        for content in old {
            if let Content::Element(child) = content {
                elements[child.0 as usize].parent = None;
            }
        }
        if !text.is_empty() {
            elements[el.0 as usize]
                .content
                .push(Content::Text(text.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_create_and_append() {
        let surface = MemorySurface::new();
        let root = surface.create_root();
        let div = surface.create_element("div").unwrap();
        let span = surface.create_element("span").unwrap();

        surface.append_child(root, div).unwrap();
        surface.append_child(div, span).unwrap();

        assert_eq!(surface.children(root), vec![div]);
        assert_eq!(surface.children(div), vec![span]);
        assert_eq!(surface.parent(span), Some(div));
        assert_eq!(surface.markup(root), "<root><div><span></span></div></root>");
    }

    #[test]
    fn test_invalid_names_rejected() {
        let surface = MemorySurface::new();
        assert!(matches!(
            surface.create_element("not a tag"),
            Err(SurfaceError::InvalidTag(_))
        ));

        let div = surface.create_element("div").unwrap();
        assert!(matches!(
            surface.set_attribute(div, "@click", "x"),
            Err(SurfaceError::InvalidAttribute(_))
        ));
    }

    #[test]
    fn test_insert_after_and_remove() {
        let surface = MemorySurface::new();
        let root = surface.create_root();
        let a = surface.create_element("a").unwrap();
        let b = surface.create_element("b").unwrap();
        let c = surface.create_element("i").unwrap();
        surface.append_child(root, a).unwrap();
        surface.append_child(root, b).unwrap();

        surface.insert_after(a, c).unwrap();
        assert_eq!(surface.children(root), vec![a, c, b]);

        surface.remove(a).unwrap();
        assert_eq!(surface.children(root), vec![c, b]);
        assert!(!surface.is_attached(a));

        // Removing twice is a no-op
        surface.remove(a).unwrap();
    }

    #[test]
    fn test_insert_after_detached_sibling_fails() {
        let surface = MemorySurface::new();
        let a = surface.create_element("a").unwrap();
        let b = surface.create_element("b").unwrap();
        assert_eq!(surface.insert_after(a, b), Err(SurfaceError::Detached(a)));
    }

    #[test]
    fn test_append_into_own_descendant_fails() {
        let surface = MemorySurface::new();
        let outer = surface.create_element("div").unwrap();
        let inner = surface.create_element("div").unwrap();
        surface.append_child(outer, inner).unwrap();

        assert!(matches!(
            surface.append_child(inner, outer),
            Err(SurfaceError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn test_set_text_detaches_children() {
        let surface = MemorySurface::new();
        let div = surface.create_element("div").unwrap();
        let p = surface.create_element("p").unwrap();
        surface.append_child(div, p).unwrap();
        surface.set_text(p, "inner").unwrap();
        assert_eq!(surface.text_content(div), "inner");

        surface.set_text(div, "Hello").unwrap();
        assert!(surface.children(div).is_empty());
        assert!(!surface.is_attached(p));
        assert_eq!(surface.text_content(div), "Hello");

        surface.set_text(div, "").unwrap();
        assert_eq!(surface.markup(div), "<div></div>");
    }

    #[test]
    fn test_listeners_dedupe_and_dispatch() {
        let surface = MemorySurface::new();
        let button = surface.create_element("button").unwrap();
        let hits = Rc::new(Cell::new(0));
        let handler = {
            let hits = hits.clone();
            Handler::new(move |_| hits.set(hits.get() + 1))
        };

        surface.add_listener(button, "click", &handler).unwrap();
        surface.add_listener(button, "click", &handler).unwrap();
        assert_eq!(surface.listener_count(button, "click"), 1);

        assert_eq!(surface.dispatch(button, "click").unwrap(), 1);
        assert_eq!(hits.get(), 1);

        surface.remove_listener(button, "click", &handler).unwrap();
        assert_eq!(surface.dispatch(button, "click").unwrap(), 0);
    }

    #[test]
    fn test_unknown_element() {
        let surface = MemorySurface::new();
        assert_eq!(
            surface.set_text(ElementId(7), "x"),
            Err(SurfaceError::UnknownElement(ElementId(7)))
        );
    }
}
