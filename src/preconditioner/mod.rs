//! Two-level domain-decomposition preconditioners.
//!
//! This module defines the `Preconditioner` trait consumed by the Krylov solvers, the
//! `DomainDecomposition` trait shared by the two variants, and their building blocks:
//! scaling and partition of unity, the minimal and GenEO coarse spaces, and the coarse
//! operators. The variants are Balancing Neumann-Neumann / Additive Schwarz ([`PcBnn`]) and the
//! algebraic sign splitting of indefinite local blocks ([`PcSplitting`]).

use crate::config::CoarseCorrection;
use crate::core::traits::LinearOperator;
use crate::error::KError;
use std::sync::Arc;

/// A preconditioner M ≈ A⁻¹.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r
    fn apply(&self, r: &V, z: &mut V) -> Result<(), KError>;
    /// Optionally: setup/factorize from A
    fn setup(&mut self, _a: &M) -> Result<(), KError> { Ok(()) }
}

/// Global composition of the coarse space.
#[derive(Debug, Clone, Default)]
pub struct CoarseSpaceReport {
    /// One entry per owned subdomain.
    pub subdomains: Vec<SubdomainReport>,
    pub coarse_dim: usize,
    pub mult_max: f64,
    /// Negative eigenvalues found in each owned indefinite block (sign splitting only).
    pub negative_eigenvalues: Vec<usize>,
    /// No eigmax enrichment exists for the selected operator pair.
    pub eigmax_unavailable: bool,
}

/// A two-level preconditioner built from a subdomain-wise matrix.
pub trait DomainDecomposition: Send + Sync {
    /// `y = M⁻¹ x`.
    fn apply(&self, x: &[f64]) -> Result<Vec<f64>, KError>;
    /// One preconditioned vector per subdomain, for multi-preconditioned Krylov methods.
    fn apply_multi(&self, x: &[f64]) -> Result<Vec<Vec<f64>>, KError>;
    /// `Z E⁻¹ Zᵀ b`.
    fn coarse_init(&self, b: &[f64]) -> Result<Vec<f64>, KError>;
    fn correction(&self) -> CoarseCorrection;
    /// The global operator this preconditions.
    fn operator(&self) -> Arc<dyn LinearOperator>;
    fn report(&self) -> &CoarseSpaceReport;

    /// The projected preconditioner only works from an initial guess `coarse_init(b)`.
    fn requires_projected_initial_guess(&self) -> bool {
        self.correction() == CoarseCorrection::PROJECTION
    }
}

/// Adapts a [`DomainDecomposition`] to the [`Preconditioner`] interface of the Krylov solvers.
pub struct AsPreconditioner<'a, P: ?Sized>(pub &'a P);

impl<'a, M, P> Preconditioner<M, Vec<f64>> for AsPreconditioner<'a, P>
where
    P: DomainDecomposition + ?Sized,
{
    fn apply(&self, r: &Vec<f64>, z: &mut Vec<f64>) -> Result<(), KError> {
        *z = self.0.apply(r)?;
        Ok(())
    }
}

pub mod scaling;
pub mod minimal;
pub mod geneo;
pub mod coarse;
pub(crate) mod two_level;
pub mod bnn;
pub mod splitting;

pub use bnn::PcBnn;
pub use coarse::CoarseOperators;
pub use geneo::SubdomainReport;
pub use splitting::PcSplitting;
