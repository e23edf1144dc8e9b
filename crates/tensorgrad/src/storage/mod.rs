//! Storage backing tensor data.

pub mod buffer;

pub use buffer::{ELEMENT_SIZE, Element, SharedBuffer};
