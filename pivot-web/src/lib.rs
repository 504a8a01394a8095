//! Browser backend for `pivot_ui`: a DOM [`Surface`](pivot_ui::Surface) and a
//! `setTimeout` based [`Defer`](pivot_ui::Defer).

use pivot_ui::{Config, ElementId, Pivot, VNode};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

pub mod defer;
pub mod surface;

pub use defer::TimeoutDefer;
pub use surface::DomSurface;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Create a [`Pivot`] rendering into the current document
pub fn browser_pivot(config: Config) -> Result<(Pivot, Rc<DomSurface>), JsValue> {
    let surface = Rc::new(DomSurface::from_window()?);
    let defer = Rc::new(TimeoutDefer::from_window()?);
    let pivot = Pivot::new(surface.clone(), defer, config);
    Ok((pivot, surface))
}

/// Mount `node` into the DOM element with id `container_id`
///
/// # Arguments
/// * `container_id` - DOM element ID to mount the node into
pub fn mount_by_id(
    pivot: &Pivot,
    surface: &DomSurface,
    container_id: &str,
    node: &VNode,
) -> Result<ElementId, JsValue> {
    let container = surface
        .document()
        .get_element_by_id(container_id)
        .ok_or("container not found")?;
    let container = surface.adopt(container);
    pivot
        .mount(container, node)
        .map_err(|err| JsValue::from_str(&err.to_string()))
}
