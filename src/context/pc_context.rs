//! Preconditioner selection.
//!
//! [`DdVariant`] names one of the two-level preconditioners together with its options and
//! builds it from a subdomain-wise matrix.
//!
//! # Example
//!
//! ```rust
//! use geneo_dd::assembly::DiffusionProblem;
//! use geneo_dd::config::DdOptions;
//! use geneo_dd::context::pc_context::DdVariant;
//! use geneo_dd::parallel::UniverseComm;
//! use geneo_dd::solver::DenseEigensolver;
//! use std::sync::Arc;
//!
//! let (matrix, _) = DiffusionProblem::new(8, 8, 2, 2)?.assemble_system()?;
//! let variant = DdVariant::Bnn(DdOptions::default().with_nev(4));
//! let pc = variant.build(&matrix, Arc::new(UniverseComm::Serial), &DenseEigensolver::new())?;
//! assert!(pc.report().coarse_dim >= 4);
//! # Ok::<(), geneo_dd::error::KError>(())
//! ```

use crate::config::{DdOptions, SplittingOptions};
use crate::error::KError;
use crate::matrix::UnassembledMatrix;
use crate::parallel::Comm;
use crate::preconditioner::{DomainDecomposition, PcBnn, PcSplitting};
use crate::solver::Eigensolver;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum DdVariant {
    /// Balancing Neumann-Neumann, or Additive Schwarz with `switch_to_asm`.
    Bnn(DdOptions),
    /// Sign splitting of the indefinite local blocks.
    Splitting(SplittingOptions),
}

impl Default for DdVariant {
    fn default() -> Self {
        DdVariant::Bnn(DdOptions::default())
    }
}

impl DdVariant {
    /// Builds the preconditioner. Collective over `comm`.
    pub fn build(
        &self,
        matrix: &UnassembledMatrix,
        comm: Arc<dyn Comm>,
        eigensolver: &dyn Eigensolver,
    ) -> Result<Arc<dyn DomainDecomposition>, KError> {
        Ok(match self {
            DdVariant::Bnn(opts) => Arc::new(PcBnn::new(matrix, comm, opts, eigensolver)?),
            DdVariant::Splitting(opts) => Arc::new(PcSplitting::new(matrix, comm, opts, eigensolver)?),
        })
    }
}
