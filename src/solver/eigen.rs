//! Local eigensolver service.
//!
//! Coarse-space builders describe a (generalized) symmetric eigenproblem `A x = λ B x` on a
//! subdomain through matrix-free operators and ask for a number of extreme eigenpairs. A solver
//! may return fewer pairs than requested; callers treat that as a weaker, not a wrong, result.
//!
//! [`DenseEigensolver`] densifies the operators (subdomain problems are small) and solves with
//! Faer's self-adjoint eigendecomposition:
//! 1. the search space is the orthogonal complement of the deflation vectors,
//! 2. with a right-hand operator, the search space is further restricted to the range of `B`
//!    and made `B`-orthonormal (`B` may be only semi-definite),
//! 3. the reduced standard problem `Wᵀ A W c = λ c` is solved and `x = W c` back-transformed.

use crate::core::traits::LinearOperator;
use crate::core::wrappers::{dot, orthonormalize, to_dense};
use crate::error::KError;
use crate::matrix::dense::DenseOps;
use faer::{Mat, Side};

/// End of the spectrum to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Which {
    Smallest,
    Largest,
}

/// `a x = λ b x`, with `x` restricted to the orthogonal complement of `deflation`.
pub struct EigenProblem<'a> {
    pub a: &'a dyn LinearOperator,
    pub b: Option<&'a dyn LinearOperator>,
    pub deflation: &'a [Vec<f64>],
}

impl<'a> EigenProblem<'a> {
    pub fn standard(a: &'a dyn LinearOperator) -> Self {
        Self { a, b: None, deflation: &[] }
    }

    pub fn generalized(a: &'a dyn LinearOperator, b: &'a dyn LinearOperator) -> Self {
        Self { a, b: Some(b), deflation: &[] }
    }

    pub fn deflated(mut self, deflation: &'a [Vec<f64>]) -> Self {
        self.deflation = deflation;
        self
    }
}

/// Eigenpairs ordered from the requested end of the spectrum.
#[derive(Debug, Clone, Default)]
pub struct EigenPairs {
    pub values: Vec<f64>,
    pub vectors: Vec<Vec<f64>>,
    pub requested: usize,
}

impl EigenPairs {
    pub fn empty(requested: usize) -> Self {
        Self { values: Vec::new(), vectors: Vec::new(), requested }
    }

    /// Number of pairs actually delivered.
    pub fn converged(&self) -> usize {
        self.values.len()
    }
}

pub trait Eigensolver: Send + Sync {
    fn solve(&self, problem: &EigenProblem<'_>, nev: usize, which: Which) -> Result<EigenPairs, KError>;
}

pub struct DenseEigensolver {
    /// Eigenvalues of `B` below `range_tol` times its largest one are treated as its kernel.
    pub range_tol: f64,
}

impl Default for DenseEigensolver {
    fn default() -> Self {
        Self { range_tol: 1e-10 }
    }
}

impl DenseEigensolver {
    pub fn new() -> Self {
        Self::default()
    }
}

// Ascending eigenvalues and matching eigenvectors of the symmetric part of `m`.
fn sym_eig(m: &Mat<f64>) -> Result<(Vec<f64>, Mat<f64>), KError> {
    let n = m.nrows();
    if n == 0 {
        return Ok((Vec::new(), Mat::zeros(0, 0)));
    }
    let sym = m.symmetrized();
    let evd = sym
        .as_ref()
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| KError::EigenError(format!("{e:?}")))?;
    let s = evd.S();
    let u = evd.U();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| s[i].total_cmp(&s[j]));
    let values = order.iter().map(|&i| s[i]).collect();
    let vectors = Mat::from_fn(n, n, |r, c| u[(r, order[c])]);
    Ok((values, vectors))
}

impl Eigensolver for DenseEigensolver {
    fn solve(&self, problem: &EigenProblem<'_>, nev: usize, which: Which) -> Result<EigenPairs, KError> {
        let n = problem.a.nrows();
        if let Some(b) = problem.b {
            KError::check_len(n, b.nrows())?;
        }
        for v in problem.deflation {
            KError::check_len(n, v.len())?;
        }
        if nev == 0 || n == 0 {
            return Ok(EigenPairs::empty(nev));
        }

        let deflation = orthonormalize(&[], problem.deflation.to_vec(), 1e-10);
        let w0 = if deflation.is_empty() {
            Mat::from_fn(n, n, |i, j| if i == j { 1.0 } else { 0.0 })
        } else {
            let p = Mat::from_fn(n, n, |i, j| {
                let id = if i == j { 1.0 } else { 0.0 };
                id - deflation.iter().map(|d| d[i] * d[j]).sum::<f64>()
            });
            let (vals, vecs) = sym_eig(&p)?;
            let keep: Vec<usize> = (0..n).filter(|&i| vals[i] > 0.5).collect();
            Mat::from_fn(n, keep.len(), |i, c| vecs[(i, keep[c])])
        };
        if w0.ncols() == 0 {
            return Ok(EigenPairs::empty(nev));
        }

        let w = match problem.b {
            None => w0,
            Some(b) => {
                let bd = to_dense(b);
                let bw = w0.transpose() * &(&bd * &w0);
                let (mu, q) = sym_eig(&bw)?;
                let top = mu.iter().cloned().fold(0.0, f64::max);
                let keep: Vec<usize> = (0..mu.len()).filter(|&i| mu[i] > self.range_tol * top).collect();
                if keep.is_empty() {
                    return Ok(EigenPairs::empty(nev));
                }
                let scaled = Mat::from_fn(q.nrows(), keep.len(), |i, c| q[(i, keep[c])] / mu[keep[c]].sqrt());
                &w0 * &scaled
            }
        };

        let ad = to_dense(problem.a);
        let c = w.transpose() * &(&ad * &w);
        let (theta, y) = sym_eig(&c)?;
        let m = theta.len();
        let picked: Vec<usize> = match which {
            Which::Smallest => (0..m).take(nev).collect(),
            Which::Largest => (0..m).rev().take(nev).collect(),
        };

        let mut pairs = EigenPairs::empty(nev);
        for k in picked {
            let mut x: Vec<f64> = (0..n)
                .map(|i| (0..w.ncols()).map(|j| w[(i, j)] * y[(j, k)]).sum())
                .collect();
            let norm = dot(&x, &x).sqrt();
            if norm == 0.0 {
                continue;
            }
            x.iter_mut().for_each(|xi| *xi /= norm);
            pairs.values.push(theta[k]);
            pairs.vectors.push(x);
        }
        log::debug!("dense eigensolver: {} of {nev} pair(s) on a space of dimension {m}", pairs.converged());
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn diag(d: &[f64]) -> Mat<f64> {
        Mat::from_fn(d.len(), d.len(), |i, j| if i == j { d[i] } else { 0.0 })
    }

    #[test]
    fn smallest_and_largest_of_a_standard_problem() {
        let a = diag(&[3.0, 1.0, 2.0]);
        let solver = DenseEigensolver::new();
        let low = solver.solve(&EigenProblem::standard(&a), 2, Which::Smallest).unwrap();
        assert_eq!(low.converged(), 2);
        assert_abs_diff_eq!(low.values[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(low.values[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(low.vectors[0][1].abs(), 1.0, epsilon = 1e-12);
        let high = solver.solve(&EigenProblem::standard(&a), 1, Which::Largest).unwrap();
        assert_abs_diff_eq!(high.values[0], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn generalized_problem_on_range_of_b() {
        // B is singular in the last direction: only two finite eigenvalues
        let a = diag(&[2.0, 6.0, 1.0]);
        let b = diag(&[1.0, 2.0, 0.0]);
        let pairs = DenseEigensolver::new()
            .solve(&EigenProblem::generalized(&a, &b), 3, Which::Smallest)
            .unwrap();
        assert_eq!(pairs.converged(), 2);
        assert_abs_diff_eq!(pairs.values[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pairs.values[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn deflated_directions_are_excluded() {
        let a = diag(&[1.0, 2.0, 3.0]);
        let deflation = vec![vec![1.0, 0.0, 0.0]];
        let pairs = DenseEigensolver::new()
            .solve(&EigenProblem::standard(&a).deflated(&deflation), 1, Which::Smallest)
            .unwrap();
        assert_abs_diff_eq!(pairs.values[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pairs.vectors[0][0], 0.0, epsilon = 1e-12);
    }
}
