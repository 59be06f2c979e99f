//! Matrix storage: dense helpers, assembled CSR operators and subdomain-wise matrices.

pub mod dense;
pub mod sparse;
pub mod unassembled;

pub use dense::DenseOps;
pub use sparse::{CsrMatrix, SparseMatrix};
pub use unassembled::{LocalBlock, UnassembledMatrix};
