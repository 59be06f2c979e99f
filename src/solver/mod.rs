//! Solver services: local direct factorizations, local eigensolvers and the outer Krylov method.

use crate::error::KError;
use crate::preconditioner::Preconditioner;
use crate::utils::convergence::SolveStats;

/// Common interface for the outer iterative solver.
pub trait LinearSolver<M, V> {
    type Error;
    type Scalar: Copy + PartialOrd + From<f64>;
    /// Solve A·x = b starting from the content of `x`, writing the result into `x`.
    /// Returns iteration stats (including convergence info).
    fn solve(
        &mut self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, V>>,
        b: &V,
        x: &mut V,
    ) -> Result<SolveStats<<Self as LinearSolver<M, V>>::Scalar>, Self::Error>;
}

/// Application of a local inverse `x = S b` on one subdomain.
///
/// Implemented by factorizations and by the matrix-free inverse composites.
pub trait LocalSolver: Send + Sync {
    fn dim(&self) -> usize;
    fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, KError>;
}

pub mod direct;
pub use direct::{CoarseFactor, Definiteness, SymmetricDirectSolver};

pub mod eigen;
pub use eigen::{DenseEigensolver, EigenPairs, EigenProblem, Eigensolver, Which};

pub mod pcg;
pub use pcg::{CgNormType, PcgSolver};
