//! Shared application algorithm of the two-level preconditioners.
//!
//! `apply(x)`:
//! 1. with projection, `r = project(x)` (the residual loses its coarse component),
//! 2. global → local, local solve on every owned subdomain, local → global (additive),
//! 3. with projection, `project_transpose` the result,
//! 4. with the additive coarse solve, add `coarse_init(x)`.
//!
//! With projection this is `Π M₁⁻¹ Πᵀ`, symmetric whenever the local solves are.

use crate::config::CoarseCorrection;
use crate::core::traits::LinearOperator;
use crate::core::wrappers::axpy;
use crate::error::KError;
use crate::parallel::{Exchange, InsertMode};
use crate::preconditioner::coarse::CoarseOperators;
use crate::solver::LocalSolver;
use std::sync::Arc;

/// Runs `f(position, subdomain)` for every owned subdomain, on the rayon pool when available.
pub(crate) fn map_owned<T, F>(owned: &[usize], f: F) -> Result<Vec<T>, KError>
where
    T: Send,
    F: Fn(usize, usize) -> Result<T, KError> + Send + Sync,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        owned.par_iter().enumerate().map(|(pos, &s)| f(pos, s)).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        owned.iter().enumerate().map(|(pos, &s)| f(pos, s)).collect()
    }
}

/// One subdomain's local solver together with the operator it inverts.
pub(crate) struct LocalPair {
    pub op: Arc<dyn LinearOperator>,
    pub solver: Arc<dyn LocalSolver>,
}

pub(crate) struct TwoLevel {
    exchange: Arc<Exchange>,
    locals: Vec<LocalPair>,
    coarse: CoarseOperators,
    correction: CoarseCorrection,
}

impl TwoLevel {
    pub fn new(
        exchange: Arc<Exchange>,
        locals: Vec<LocalPair>,
        coarse: CoarseOperators,
        correction: CoarseCorrection,
    ) -> Result<Self, KError> {
        KError::check_len(exchange.owned().len(), locals.len())?;
        for (pos, pair) in locals.iter().enumerate() {
            KError::check_len(exchange.dofs(pos).len(), pair.solver.dim())?;
        }
        Ok(Self { exchange, locals, coarse, correction })
    }

    pub fn exchange(&self) -> &Arc<Exchange> {
        &self.exchange
    }

    pub fn coarse(&self) -> &CoarseOperators {
        &self.coarse
    }

    pub fn correction(&self) -> CoarseCorrection {
        self.correction
    }

    pub fn local(&self, pos: usize) -> &LocalPair {
        &self.locals[pos]
    }

    fn local_solves(&self, rhs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, KError> {
        map_owned(self.exchange.owned(), |pos, _| self.locals[pos].solver.solve(&rhs[pos]))
    }

    pub fn apply(&self, x: &[f64]) -> Result<Vec<f64>, KError> {
        KError::check_len(self.exchange.n_global(), x.len())?;
        let projected = self.correction.contains(CoarseCorrection::PROJECTION);
        let mut r = x.to_vec();
        if projected {
            self.coarse.project(&mut r)?;
        }
        let rhs = self.exchange.reverse(&r)?;
        let sol = self.local_solves(&rhs)?;
        let mut y = vec![0.0; x.len()];
        self.exchange.forward(&sol, &mut y, InsertMode::Add)?;
        if projected {
            self.coarse.project_transpose(&mut y)?;
        }
        if self.correction.contains(CoarseCorrection::ADDITIVE) {
            let c = self.coarse.coarse_init(x)?;
            axpy(1.0, &c, &mut y);
        }
        Ok(y)
    }

    /// One output per subdomain: the spread of that subdomain's local solve, projected whatever the
    /// coarse correction.
    pub fn apply_multi(&self, x: &[f64]) -> Result<Vec<Vec<f64>>, KError> {
        KError::check_len(self.exchange.n_global(), x.len())?;
        let rhs = self.exchange.reverse(x)?;
        let sol = self.local_solves(&rhs)?;
        let mut out = Vec::with_capacity(self.exchange.n_subdomains());
        for s in 0..self.exchange.n_subdomains() {
            let mut y = vec![0.0; x.len()];
            self.exchange.forward_single(s, &sol, &mut y)?;
            self.coarse.project_transpose(&mut y)?;
            out.push(y);
        }
        Ok(out)
    }
}
