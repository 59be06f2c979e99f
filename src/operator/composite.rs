//! Sums, diagonal scalings and projected inverses of shared operators.

use crate::core::traits::{Indexing, LinearOperator, MatVec};
use crate::error::KError;
use crate::operator::projector::ComplementProjector;
use crate::solver::LocalSolver;
use std::sync::Arc;

/// `x ↦ Σ_k T_k x`.
#[derive(Clone)]
pub struct SumOperator {
    n: usize,
    terms: Vec<Arc<dyn LinearOperator>>,
}

impl SumOperator {
    pub fn new(terms: Vec<Arc<dyn LinearOperator>>) -> Self {
        let n = terms.first().map(|t| t.nrows()).unwrap_or(0);
        assert!(terms.iter().all(|t| t.nrows() == n), "summands have different sizes");
        Self { n, terms }
    }
}

impl MatVec<Vec<f64>> for SumOperator {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        assert_eq!(y.len(), self.n, "Output vector y has incorrect length");
        y.iter_mut().for_each(|yi| *yi = 0.0);
        let mut tmp = vec![0.0; self.n];
        for term in &self.terms {
            term.matvec(x, &mut tmp);
            for (yi, ti) in y.iter_mut().zip(&tmp) {
                *yi += ti;
            }
        }
    }
}

impl Indexing for SumOperator {
    fn nrows(&self) -> usize {
        self.n
    }
}

/// `x ↦ left ⊙ T(right ⊙ x)`.
///
/// Wraps an operator (then it is an operator) or a local inverse (then it is a local inverse),
/// so that a scaled matrix and its matching scaled solve are built the same way.
pub struct ScaledOperator<T: ?Sized> {
    inner: Arc<T>,
    left: Vec<f64>,
    right: Vec<f64>,
}

impl<T: ?Sized> ScaledOperator<T> {
    pub fn new(inner: Arc<T>, left: Vec<f64>, right: Vec<f64>) -> Self {
        assert_eq!(left.len(), right.len(), "scalings have different lengths");
        Self { inner, left, right }
    }

    fn scale_in(&self, x: &[f64]) -> Vec<f64> {
        x.iter().zip(&self.right).map(|(xi, ri)| xi * ri).collect()
    }

    fn scale_out(&self, y: &mut [f64]) {
        for (yi, li) in y.iter_mut().zip(&self.left) {
            *yi *= li;
        }
    }
}

impl<T: LinearOperator + ?Sized> MatVec<Vec<f64>> for ScaledOperator<T> {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        assert_eq!(x.len(), self.right.len(), "Input vector x has incorrect length");
        self.inner.matvec(&self.scale_in(x), y);
        self.scale_out(y);
    }
}

impl<T: ?Sized> Indexing for ScaledOperator<T> {
    fn nrows(&self) -> usize {
        self.left.len()
    }
}

impl<T: LocalSolver + ?Sized> LocalSolver for ScaledOperator<T> {
    fn dim(&self) -> usize {
        self.left.len()
    }

    fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, KError> {
        KError::check_len(self.right.len(), rhs.len())?;
        let mut y = self.inner.solve(&self.scale_in(rhs))?;
        self.scale_out(&mut y);
        Ok(y)
    }
}

/// `b ↦ P S P b` with `P` the projector onto the complement of the negative eigenvectors and
/// `S` the solver of the indefinite block: the pseudo-inverse of its positive part.
pub struct ProjectedInverse {
    projector: ComplementProjector,
    solver: Arc<dyn LocalSolver>,
}

impl ProjectedInverse {
    pub fn new(projector: ComplementProjector, solver: Arc<dyn LocalSolver>) -> Self {
        Self { projector, solver }
    }
}

impl LocalSolver for ProjectedInverse {
    fn dim(&self) -> usize {
        self.solver.dim()
    }

    fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, KError> {
        let x = self.solver.solve(&self.projector.project(rhs))?;
        Ok(self.projector.project(&x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::projector::SpanProjector;
    use crate::solver::{Definiteness, SymmetricDirectSolver};
    use approx::assert_abs_diff_eq;
    use faer::Mat;

    #[test]
    fn scaled_operator_and_its_inverse() {
        let a = Arc::new(Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { 0.0 }));
        let t = ScaledOperator::new(a.clone() as Arc<dyn LinearOperator>, vec![2.0, 3.0], vec![2.0, 3.0]);
        let y = t.apply_to(&[1.0, 1.0]);
        assert_eq!(y, vec![8.0, 18.0]);
        let solver = Arc::new(SymmetricDirectSolver::factorize(&a, Definiteness::PositiveSemidefinite, 0).unwrap());
        let s = ScaledOperator::new(solver as Arc<dyn LocalSolver>, vec![0.5, 1.0 / 3.0], vec![0.5, 1.0 / 3.0]);
        let x = s.solve(&y).unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn sum_of_operators() {
        let a: Arc<dyn LinearOperator> = Arc::new(Mat::from_fn(2, 2, |i, j| (i + j) as f64));
        let b: Arc<dyn LinearOperator> = Arc::new(Mat::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 0.0 }));
        let s = SumOperator::new(vec![a, b]);
        assert_eq!(s.apply_to(&[1.0, 2.0]), vec![3.0, 7.0]);
    }

    #[test]
    fn projected_inverse_ignores_negative_direction() {
        // eigenvalues 3 (e0 + e1) and -1 (e0 - e1)
        let bs = Mat::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 2.0 });
        let s = 0.5f64.sqrt();
        let solver = Arc::new(SymmetricDirectSolver::factorize(&bs, Definiteness::Indefinite, 0).unwrap());
        let inv = ProjectedInverse::new(ComplementProjector::new(SpanProjector::new(2, vec![vec![s, -s]])), solver);
        let x = inv.solve(&[1.0, 0.0]).unwrap();
        assert_abs_diff_eq!(x[0], 1.0 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 1.0 / 6.0, epsilon = 1e-12);
    }
}
