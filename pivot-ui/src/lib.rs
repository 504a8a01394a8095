//! Minimal declarative UI core.
//!
//! Components describe their output as [`VNode`] trees. The reconciler keeps a
//! live [`Surface`] in line with the latest tree, and writes to a component's
//! [`Field`]s are batched into one deferred re-render.

pub mod app;
pub mod component;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod surface;
pub mod vnode;

// Re-export key types
pub use app::{Arg, Pivot};
pub use component::{Component, Definition, Field, Generator, Instance, Setup};
pub use config::Config;
pub use error::{PivotError, Result, SurfaceError, SurfaceResult};
pub use reconcile::{diff, PropDelta};
pub use registry::Registry;
pub use runtime::{Runtime, SharedRuntime};
pub use scheduler::{Defer, Task, TaskQueue};
pub use surface::{ElementId, Event, Handler, MemorySurface, Surface};
pub use vnode::{h, Child, Children, PropKey, PropValue, Props, VNode, LISTENER_PREFIX, REF_KEY};
