//! Foundation types shared by every stage.

pub mod span;
pub mod types;

pub use span::{SourceFile, Span};
pub use types::{Scalar, Type};
