//! Matrix-free composite operators.
//!
//! Every type here is a [`LinearOperator`](crate::core::LinearOperator) or a
//! [`LocalSolver`](crate::solver::LocalSolver) built from shared handles to vectors, operators
//! and solvers that already exist; none of them factorizes anything. The sign-splitting
//! preconditioner composes them into
//!
//! - `Anegs`: [`SpectralCorrection`], and its global sum [`DistributedSpectralCorrection`],
//! - `Aposs = Bs + Anegs` and `Apos = A + Aneg`: [`SumOperator`],
//! - the projectors onto the negative eigenvectors and their complement,
//! - `invAposs`: [`ProjectedInverse`],
//! - the scaled local operator and its scaled inverse: [`ScaledOperator`].

pub mod composite;
pub mod projector;
pub mod spectral;

pub use composite::{ProjectedInverse, ScaledOperator, SumOperator};
pub use projector::{ComplementProjector, SpanProjector};
pub use spectral::{DistributedSpectralCorrection, SpectralCorrection};
