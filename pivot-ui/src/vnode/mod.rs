mod props;
mod render;
mod types;

pub use props::{PropKey, PropValue, Props, LISTENER_PREFIX, REF_KEY};
pub use types::{h, Child, Children, VNode};

pub(crate) use render::attach_child;
