//! geneo_dd: two-level domain-decomposition preconditioners with GenEO coarse spaces, over Faer
//!
//! The input is a subdomain-wise ("unassembled") symmetric matrix: one local Neumann matrix per
//! subdomain with its local-to-global map. From it the crate builds
//!
//! - the Balancing Neumann-Neumann preconditioner, or non-overlapping Additive Schwarz,
//! - the algebraic sign-splitting preconditioner for indefinite local blocks,
//!
//! each with a minimal coarse space optionally enriched by the GenEO generalized eigenproblems,
//! applied in projected, hybrid, additive or one-level form. Subdomains are handled one per MPI
//! rank (feature `mpi`) or all in one address space (feature `rayon`, or serially).

pub mod parallel;

pub mod assembly;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod matrix;
pub mod operator;
pub mod preconditioner;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use self::core::*;
pub use error::*;
pub use matrix::*;
pub use operator::*;
pub use preconditioner::*;
pub use solver::*;

// Re-export SolveStats at the crate root for convenience
pub use utils::convergence::SolveStats;
