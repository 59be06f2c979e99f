//! Direct solvers for local and coarse problems.
//!
//! - [`SymmetricDirectSolver`]: spectral factorization `A = U Λ Uᵀ` of a dense symmetric local
//!   matrix. Pivots small relative to the largest one are treated as null pivots: they span the
//!   detected kernel and are skipped by `solve`, which therefore applies the pseudo-inverse. This
//!   is what a sparse direct solver with null-pivot detection does on a floating subdomain.
//! - [`CoarseFactor`]: Cholesky factorization of the (always SPD) coarse operator.

use crate::error::KError;
use crate::solver::LocalSolver;
use faer::prelude::Solve;
use faer::{Mat, Side};

/// Relative threshold below which a pivot counts as null.
pub const NULL_PIVOT_TOL: f64 = 1e-9;

/// Which pivots a factorization accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definiteness {
    /// Negative pivots are a fatal error.
    PositiveSemidefinite,
    /// Any sign is accepted.
    Indefinite,
}

pub struct SymmetricDirectSolver {
    n: usize,
    // eigenvectors of the retained pivots, one column each
    vectors: Mat<f64>,
    inv_pivots: Vec<f64>,
    kernel: Vec<Vec<f64>>,
    negative: usize,
}

impl SymmetricDirectSolver {
    /// Factorizes `mat` (symmetric, only the lower triangle is read).
    ///
    /// `subdomain` is only used to label a [`KError::NotPositiveDefinite`] failure.
    pub fn factorize(mat: &Mat<f64>, policy: Definiteness, subdomain: usize) -> Result<Self, KError> {
        let n = mat.nrows();
        KError::check_len(n, mat.ncols())?;
        if n == 0 {
            return Ok(Self { n, vectors: Mat::zeros(0, 0), inv_pivots: Vec::new(), kernel: Vec::new(), negative: 0 });
        }
        let evd = mat
            .as_ref()
            .self_adjoint_eigen(Side::Lower)
            .map_err(|e| KError::FactorError(format!("subdomain {subdomain}: {e:?}")))?;
        let u = evd.U();
        let s = evd.S();
        let scale = (0..n).map(|i| s[i].abs()).fold(0.0, f64::max);
        let tol = NULL_PIVOT_TOL * scale.max(f64::MIN_POSITIVE);

        let mut kept = Vec::with_capacity(n);
        let mut kernel = Vec::new();
        let mut negative = 0;
        for i in 0..n {
            let pivot = s[i];
            if pivot.abs() <= tol {
                kernel.push((0..n).map(|r| u[(r, i)]).collect());
            } else if pivot < 0.0 {
                if policy == Definiteness::PositiveSemidefinite {
                    return Err(KError::NotPositiveDefinite { subdomain, eigenvalue: pivot });
                }
                negative += 1;
                kept.push(i);
            } else {
                kept.push(i);
            }
        }
        let vectors = Mat::from_fn(n, kept.len(), |r, c| u[(r, kept[c])]);
        let inv_pivots = kept.iter().map(|&i| 1.0 / s[i]).collect();
        log::debug!(
            "subdomain {subdomain}: factorized n = {n}, {} null pivot(s), {negative} negative",
            kernel.len()
        );
        Ok(Self { n, vectors, inv_pivots, kernel, negative })
    }

    /// Orthonormal basis of the detected kernel.
    pub fn null_space(&self) -> &[Vec<f64>] {
        &self.kernel
    }

    /// Number of negative pivots (zero under [`Definiteness::PositiveSemidefinite`]).
    pub fn negative_pivots(&self) -> usize {
        self.negative
    }
}

impl LocalSolver for SymmetricDirectSolver {
    fn dim(&self) -> usize {
        self.n
    }

    fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, KError> {
        KError::check_len(self.n, rhs.len())?;
        let mut x = vec![0.0; self.n];
        for (c, &inv) in self.inv_pivots.iter().enumerate() {
            let coef = (0..self.n).map(|r| self.vectors[(r, c)] * rhs[r]).sum::<f64>() * inv;
            for (r, xr) in x.iter_mut().enumerate() {
                *xr += coef * self.vectors[(r, c)];
            }
        }
        Ok(x)
    }
}

/// Cholesky factor of the coarse operator `E = Zᵀ A Z`.
pub struct CoarseFactor {
    n: usize,
    llt: Option<faer::linalg::solvers::Llt<f64>>,
}

impl CoarseFactor {
    pub fn factorize(e: &Mat<f64>) -> Result<Self, KError> {
        let n = e.nrows();
        KError::check_len(n, e.ncols())?;
        if n == 0 {
            return Ok(Self { n, llt: None });
        }
        let llt = e
            .llt(Side::Lower)
            .map_err(|err| KError::FactorError(format!("coarse operator is not SPD: {err:?}")))?;
        Ok(Self { n, llt: Some(llt) })
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// `E⁻¹ rhs`.
    pub fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, KError> {
        KError::check_len(self.n, rhs.len())?;
        let Some(llt) = &self.llt else { return Ok(Vec::new()) };
        let b = Mat::from_fn(self.n, 1, |i, _| rhs[i]);
        let x = llt.solve(&b);
        Ok((0..self.n).map(|i| x[(i, 0)]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn neumann_1d(n: usize) -> Mat<f64> {
        Mat::from_fn(n, n, |i, j| {
            if i == j {
                if i == 0 || i == n - 1 { 1.0 } else { 2.0 }
            } else if i.abs_diff(j) == 1 {
                -1.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn floating_block_detects_constant_kernel() {
        let a = neumann_1d(4);
        let solver = SymmetricDirectSolver::factorize(&a, Definiteness::PositiveSemidefinite, 0).unwrap();
        assert_eq!(solver.null_space().len(), 1);
        let k = &solver.null_space()[0];
        for v in k {
            assert_abs_diff_eq!(v.abs(), 0.5, epsilon = 1e-10);
        }
        // A (A⁺ b) = b for b orthogonal to the kernel
        let b = vec![1.0, -1.0, 2.0, -2.0];
        let x = solver.solve(&b).unwrap();
        let mut ax = vec![0.0; 4];
        crate::core::traits::MatVec::matvec(&a, &x, &mut ax);
        for (u, v) in ax.iter().zip(&b) {
            assert_abs_diff_eq!(u, v, epsilon = 1e-10);
        }
    }

    #[test]
    fn negative_pivot_is_fatal_unless_indefinite() {
        let a = Mat::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 2.0 });
        let err = SymmetricDirectSolver::factorize(&a, Definiteness::PositiveSemidefinite, 3);
        assert!(matches!(err, Err(KError::NotPositiveDefinite { subdomain: 3, .. })));
        let ok = SymmetricDirectSolver::factorize(&a, Definiteness::Indefinite, 3).unwrap();
        assert_eq!(ok.negative_pivots(), 1);
    }

    #[test]
    fn coarse_cholesky_solves() {
        let e = Mat::from_fn(2, 2, |i, j| if i == j { 4.0 } else { 1.0 });
        let f = CoarseFactor::factorize(&e).unwrap();
        let x = f.solve(&[1.0, 2.0]).unwrap();
        assert_abs_diff_eq!(x[0], 2.0 / 15.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 7.0 / 15.0, epsilon = 1e-12);
        assert!(CoarseFactor::factorize(&Mat::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 2.0 })).is_err());
    }
}
