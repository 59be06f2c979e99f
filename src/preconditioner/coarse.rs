//! Coarse operators and projections.
//!
//! The local coarse vectors of every subdomain are extended by zero into the global space, giving
//! the columns `z_k` of `Z`. With `E = Zᵀ A Z` (Cholesky-factorized once):
//!
//! - `project(y) = y − A Z E⁻¹ Zᵀ y`,
//! - `project_transpose(x) = x − Z E⁻¹ Zᵀ A x`,
//! - `coarse_init(b) = Z E⁻¹ Zᵀ b`.
//!
//! `Z` and `A Z` are replicated on every process; building them is collective.

use crate::core::traits::LinearOperator;
use crate::core::wrappers::{axpy, dot};
use crate::error::KError;
use crate::matrix::dense::DenseOps;
use crate::parallel::Exchange;
use crate::solver::CoarseFactor;
use faer::Mat;
use std::sync::Arc;

pub struct CoarseOperators {
    n: usize,
    z: Vec<Vec<f64>>,
    az: Vec<Vec<f64>>,
    factor: CoarseFactor,
    per_subdomain: Vec<usize>,
}

impl CoarseOperators {
    /// `v0s[k]` holds the local coarse vectors of the `k`-th owned subdomain of `exchange`.
    pub fn new(v0s: &[Vec<Vec<f64>>], op: Arc<dyn LinearOperator>, exchange: &Exchange) -> Result<Self, KError> {
        let n = exchange.n_global();
        KError::check_len(n, op.nrows())?;
        KError::check_len(exchange.owned().len(), v0s.len())?;
        let comm = exchange.comm();

        let mut counts = vec![0.0; exchange.n_subdomains()];
        for (pos, &s) in exchange.owned().iter().enumerate() {
            counts[s] = v0s[pos].len() as f64;
        }
        comm.all_reduce_slice(&mut counts);
        let per_subdomain: Vec<usize> = counts.iter().map(|&c| c as usize).collect();
        let mut offsets = Vec::with_capacity(per_subdomain.len());
        let mut nc = 0;
        for &c in &per_subdomain {
            offsets.push(nc);
            nc += c;
        }

        // one reduction for the whole basis
        let mut flat = vec![0.0; nc * n];
        for (pos, &s) in exchange.owned().iter().enumerate() {
            let dofs = exchange.dofs(pos);
            for (k, v) in v0s[pos].iter().enumerate() {
                KError::check_len(dofs.len(), v.len())?;
                let col = &mut flat[(offsets[s] + k) * n..(offsets[s] + k + 1) * n];
                for (&g, &vi) in dofs.iter().zip(v) {
                    col[g] = vi;
                }
            }
        }
        comm.all_reduce_slice(&mut flat);
        let z: Vec<Vec<f64>> = flat.chunks(n.max(1)).take(nc).map(|c| c.to_vec()).collect();

        let mut az = Vec::with_capacity(nc);
        for zk in &z {
            let mut y = vec![0.0; n];
            op.matvec(zk, &mut y);
            az.push(y);
        }
        let e = Mat::from_fn(nc, nc, |i, j| dot(&z[i], &az[j])).symmetrized();
        let factor = CoarseFactor::factorize(&e)?;
        log::debug!("coarse operator of dimension {nc} factorized");
        Ok(Self { n, z, az, factor, per_subdomain })
    }

    /// Global coarse dimension.
    pub fn dim(&self) -> usize {
        self.z.len()
    }

    /// Number of coarse vectors contributed by each subdomain.
    pub fn per_subdomain(&self) -> &[usize] {
        &self.per_subdomain
    }

    /// Columns of `Z`.
    pub fn basis(&self) -> &[Vec<f64>] {
        &self.z
    }

    // E⁻¹ Wᵀ x
    fn coarse_solve(&self, w: &[Vec<f64>], x: &[f64]) -> Result<Vec<f64>, KError> {
        KError::check_len(self.n, x.len())?;
        let rhs: Vec<f64> = w.iter().map(|wk| dot(wk, x)).collect();
        self.factor.solve(&rhs)
    }

    pub fn project(&self, y: &mut [f64]) -> Result<(), KError> {
        let alpha = self.coarse_solve(&self.z, y)?;
        for (azk, a) in self.az.iter().zip(alpha) {
            axpy(-a, azk, y);
        }
        Ok(())
    }

    pub fn project_transpose(&self, x: &mut [f64]) -> Result<(), KError> {
        // Zᵀ A x = (A Z)ᵀ x, A symmetric
        let alpha = self.coarse_solve(&self.az, x)?;
        for (zk, a) in self.z.iter().zip(alpha) {
            axpy(-a, zk, x);
        }
        Ok(())
    }

    pub fn coarse_init(&self, b: &[f64]) -> Result<Vec<f64>, KError> {
        let alpha = self.coarse_solve(&self.z, b)?;
        let mut x = vec![0.0; self.n];
        for (zk, a) in self.z.iter().zip(alpha) {
            axpy(a, zk, &mut x);
        }
        Ok(x)
    }
}
