//! Low-rank spectral corrections built from negative eigenpairs.

use crate::core::traits::{Indexing, MatVec};
use crate::core::wrappers::{axpy, dot};
use crate::parallel::Exchange;
use std::sync::Arc;

/// `x ↦ Σ_i λ_i (v_i · x) v_i` on one subdomain, with `λ_i ≥ 0`.
///
/// Holds the magnitudes of the negative eigenvalues of an indefinite local block, so that adding
/// it to the block cancels the negative part of its spectrum.
#[derive(Clone)]
pub struct SpectralCorrection {
    n: usize,
    values: Vec<f64>,
    vectors: Vec<Vec<f64>>,
}

impl SpectralCorrection {
    pub fn new(n: usize, values: Vec<f64>, vectors: Vec<Vec<f64>>) -> Self {
        assert_eq!(values.len(), vectors.len(), "one vector per eigenvalue");
        assert!(vectors.iter().all(|v| v.len() == n), "eigenvectors have incorrect length");
        Self { n, values, vectors }
    }

    pub fn rank(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn vectors(&self) -> &[Vec<f64>] {
        &self.vectors
    }

    fn apply_slice(&self, x: &[f64], y: &mut [f64]) {
        y.iter_mut().for_each(|yi| *yi = 0.0);
        let gamma: Vec<f64> = self.vectors.iter().zip(&self.values).map(|(v, &l)| l * dot(v, x)).collect();
        for (v, g) in self.vectors.iter().zip(gamma) {
            axpy(g, v, y);
        }
    }
}

impl MatVec<Vec<f64>> for SpectralCorrection {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        assert_eq!(x.len(), self.n, "Input vector x has incorrect length");
        assert_eq!(y.len(), self.n, "Output vector y has incorrect length");
        self.apply_slice(x, y);
    }
}

impl Indexing for SpectralCorrection {
    fn nrows(&self) -> usize {
        self.n
    }
}

/// Global counterpart `Σ_s R_sᵀ (Σ_i λ_i v_i v_iᵀ) R_s` of the local corrections.
///
/// Collective: every process must apply it in the same order.
pub struct DistributedSpectralCorrection {
    exchange: Arc<Exchange>,
    locals: Vec<SpectralCorrection>,
}

impl DistributedSpectralCorrection {
    /// `locals[k]` belongs to the `k`-th owned subdomain of `exchange`.
    pub fn new(exchange: Arc<Exchange>, locals: Vec<SpectralCorrection>) -> Self {
        assert_eq!(exchange.owned().len(), locals.len(), "one correction per owned subdomain");
        Self { exchange, locals }
    }
}

impl MatVec<Vec<f64>> for DistributedSpectralCorrection {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        assert_eq!(x.len(), self.exchange.n_global(), "Input vector x has incorrect length");
        assert_eq!(y.len(), self.exchange.n_global(), "Output vector y has incorrect length");
        let xs = self.exchange.restrict(x);
        let ys: Vec<Vec<f64>> = self
            .locals
            .iter()
            .zip(&xs)
            .map(|(c, xl)| {
                let mut yl = vec![0.0; xl.len()];
                c.apply_slice(xl, &mut yl);
                yl
            })
            .collect();
        *y = self.exchange.accumulate(&ys);
    }
}

impl Indexing for DistributedSpectralCorrection {
    fn nrows(&self) -> usize {
        self.exchange.n_global()
    }
}
