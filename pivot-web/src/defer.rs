use pivot_ui::{Defer, Task};
use tracing::error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

/// Runs deferred tasks as `setTimeout(task, 0)` macrotasks
pub struct TimeoutDefer {
    window: Window,
}

impl TimeoutDefer {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    pub fn from_window() -> Result<Self, JsValue> {
        Ok(Self::new(web_sys::window().ok_or("no window")?))
    }
}

impl Defer for TimeoutDefer {
    fn defer(&self, task: Task) {
        let callback = Closure::once_into_js(move || task());
        let callback: &js_sys::Function = callback.unchecked_ref();
        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback, 0)
        {
            error!("failed to schedule task: {:?}", err);
        }
    }
}
