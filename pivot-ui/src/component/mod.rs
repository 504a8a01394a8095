mod definition;
mod field;
mod instance;

pub use definition::{Component, Definition, Generator, Setup};
pub use field::Field;
pub use instance::Instance;
