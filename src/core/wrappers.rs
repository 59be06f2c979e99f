//! Wrappers for faer dense matrix types and vector operations.
//!
//! This module implements the core traits for `faer::Mat<f64>`, `faer::MatRef<f64>` and `Vec<f64>`
//! so that local dense blocks, global vectors and matrix-free operators can be mixed freely by the
//! preconditioners and the Krylov driver. It also hosts the handful of BLAS-1 style helpers
//! (axpy, pointwise products, densification of an operator) used throughout the crate.
//!
//! With the `rayon` feature the inner products run on the rayon pool.

use crate::core::traits::{Indexing, InnerProduct, LinearOperator, MatVec};
use faer::{Mat, MatRef};

/// Implements matrix-vector multiplication for `faer::Mat`.
impl MatVec<Vec<f64>> for Mat<f64> {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        self.as_ref().matvec(x, y)
    }
}

/// Implements matrix-vector multiplication for a matrix reference (`faer::MatRef`).
impl<'a> MatVec<Vec<f64>> for MatRef<'a, f64> {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        y.iter_mut().for_each(|yi| *yi = 0.0);
        // column-major storage: accumulate column by column
        for j in 0..self.ncols() {
            let xj = x[j];
            if xj == 0.0 {
                continue;
            }
            for i in 0..self.nrows() {
                y[i] += self[(i, j)] * xj;
            }
        }
    }
}

/// Euclidean inner product on replicated vectors.
///
/// Global vectors are replicated on every process, so no reduction is needed here.
impl InnerProduct<Vec<f64>> for () {
    type Scalar = f64;
    fn dot(&self, x: &Vec<f64>, y: &Vec<f64>) -> f64 {
        dot(x, y)
    }
    fn norm(&self, x: &Vec<f64>) -> f64 {
        dot(x, x).sqrt()
    }
}

/// Computes `x^T y`.
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "Vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter().zip(y.par_iter()).map(|(xi, yi)| xi * yi).sum()
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter().zip(y.iter()).map(|(xi, yi)| xi * yi).sum()
    }
}

/// `y ← y + alpha x`
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    assert_eq!(x.len(), y.len(), "Vectors must have the same length");
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// Entrywise product `a ⊙ b`.
pub fn pointwise(a: &[f64], b: &[f64]) -> Vec<f64> {
    assert_eq!(a.len(), b.len(), "Vectors must have the same length");
    a.iter().zip(b).map(|(ai, bi)| ai * bi).collect()
}

/// Modified Gram-Schmidt: orthonormalizes `candidates` against `basis` and each other.
///
/// Candidates whose remaining norm falls below `drop_tol` times their original norm are dropped.
/// Returns the accepted vectors; `basis` is assumed orthonormal and is not modified.
pub fn orthonormalize(basis: &[Vec<f64>], candidates: Vec<Vec<f64>>, drop_tol: f64) -> Vec<Vec<f64>> {
    let mut accepted: Vec<Vec<f64>> = Vec::with_capacity(candidates.len());
    for mut v in candidates {
        let norm0 = dot(&v, &v).sqrt();
        if norm0 == 0.0 {
            continue;
        }
        // twice is enough
        for _ in 0..2 {
            for q in basis.iter().chain(accepted.iter()) {
                let c = dot(q, &v);
                axpy(-c, q, &mut v);
            }
        }
        let norm = dot(&v, &v).sqrt();
        if norm > drop_tol * norm0 {
            v.iter_mut().for_each(|vi| *vi /= norm);
            accepted.push(v);
        }
    }
    accepted
}

/// Builds the dense matrix of an operator by applying it to the canonical basis.
///
/// Only meant for subdomain-sized operators.
pub fn to_dense(op: &dyn LinearOperator) -> Mat<f64> {
    let n = op.nrows();
    let mut dense = Mat::<f64>::zeros(n, n);
    let mut e = vec![0.0; n];
    let mut col = vec![0.0; n];
    for j in 0..n {
        e[j] = 1.0;
        op.matvec(&e, &mut col);
        for i in 0..n {
            dense[(i, j)] = col[i];
        }
        e[j] = 0.0;
    }
    dense
}

/// Implements the `Indexing` trait for `Vec<T>`, treating a vector as a column vector.
impl<T> Indexing for Vec<T> {
    /// Returns the number of rows (length) of the vector.
    fn nrows(&self) -> usize {
        self.len()
    }
}

/// Implements the `Indexing` trait for `faer::Mat`, returning the number of rows.
impl<T> Indexing for Mat<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
}
