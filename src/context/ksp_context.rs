//! Krylov driver for the domain-decomposition preconditioners.
//!
//! `KspContext` solves `A x = b` with preconditioned CG, `A` being the operator the
//! preconditioner was built for ([`DomainDecomposition::operator`]). The projected preconditioner
//! is only symmetric positive definite on the A-orthogonal complement of the coarse space, so for
//! it the initial guess is replaced by `coarse_init(b)`, which puts the first residual there.
//!
//! # References
//! - Saad, Y. (2003). Iterative Methods for Sparse Linear Systems. SIAM.
//! - Spillane, N. et al. (2014). Abstract robust coarse spaces for systems of PDEs via generalized
//!   eigenproblems in the overlaps. Numer. Math.

use crate::core::traits::{Indexing, LinearOperator, MatVec};
use crate::error::KError;
use crate::preconditioner::{AsPreconditioner, DomainDecomposition};
use crate::solver::{CgNormType, LinearSolver, PcgSolver};
use crate::utils::convergence::SolveStats;
use std::sync::Arc;

// Borrowed operator handed to the Krylov solver.
struct OpRef<'a>(&'a dyn LinearOperator);

impl MatVec<Vec<f64>> for OpRef<'_> {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        self.0.matvec(x, y);
    }
}

impl Indexing for OpRef<'_> {
    fn nrows(&self) -> usize {
        self.0.nrows()
    }
}

/// PCG solve context for a two-level preconditioner.
pub struct KspContext {
    pub pc: Arc<dyn DomainDecomposition>,
    /// Relative residual tolerance.
    pub tol: f64,
    pub max_it: usize,
    pub norm_type: CgNormType,
    /// Residual norms of the last solve.
    pub residual_history: Vec<f64>,
}

impl KspContext {
    pub fn new(pc: Arc<dyn DomainDecomposition>) -> Self {
        Self { pc, tol: 1e-8, max_it: 1000, norm_type: CgNormType::Unpreconditioned, residual_history: Vec::new() }
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_max_it(mut self, max_it: usize) -> Self {
        self.max_it = max_it;
        self
    }

    pub fn with_norm(mut self, norm_type: CgNormType) -> Self {
        self.norm_type = norm_type;
        self
    }

    /// Solves `A x = b`, starting from `x` unless the preconditioner requires the coarse initial
    /// guess.
    pub fn solve(&mut self, b: &[f64], x: &mut Vec<f64>) -> Result<SolveStats<f64>, KError> {
        let op = self.pc.operator();
        KError::check_len(op.nrows(), b.len())?;
        if self.pc.requires_projected_initial_guess() {
            *x = self.pc.coarse_init(b)?;
        } else {
            KError::check_len(op.nrows(), x.len())?;
        }
        let a = OpRef(op.as_ref());
        let pc = AsPreconditioner(self.pc.as_ref());
        let mut solver = PcgSolver::new(self.tol, self.max_it).with_norm(self.norm_type);
        let stats = solver.solve(&a, Some(&pc), &b.to_vec(), x)?;
        self.residual_history = solver.residual_history;
        log::debug!(
            "PCG stopped after {} iteration(s), residual {:e} (converged: {})",
            stats.iterations,
            stats.final_residual,
            stats.converged
        );
        Ok(stats)
    }
}
