//! Core traits and faer wrappers.

pub mod traits;
pub mod wrappers;

pub use traits::{Indexing, InnerProduct, LinearOperator, MatVec};
pub use wrappers::{axpy, dot, orthonormalize, pointwise, to_dense};
