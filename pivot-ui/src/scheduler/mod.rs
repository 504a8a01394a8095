mod queue;

pub use queue::TaskQueue;

/// Deferred unit of work
pub type Task = Box<dyn FnOnce()>;

/// "Run this after the current synchronous work" primitive.
///
/// Tasks run once, in submission order. Renders are only ever started from
/// here, never from inside the field write that requested them.
pub trait Defer {
    fn defer(&self, task: Task);
}
