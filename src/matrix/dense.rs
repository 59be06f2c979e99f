//! Dense‐matrix helpers on top of Faer.
//!
//! Subdomain matrices are small and stored as dense `faer::Mat<f64>`. The `DenseOps` trait adds
//! the few operations the preconditioners need on them: diagonal extraction, two-sided diagonal
//! scaling (PETSc's `MatDiagonalScale`) and symmetrization.

use faer::Mat;

pub trait DenseOps {
    /// Main diagonal.
    fn diagonal_vec(&self) -> Vec<f64>;
    /// `diag(left) · self · diag(right)`.
    fn diagonal_scale(&self, left: &[f64], right: &[f64]) -> Mat<f64>;
    /// `(self + selfᵀ) / 2`.
    fn symmetrized(&self) -> Mat<f64>;
    /// Largest entrywise asymmetry `|a_ij - a_ji|`.
    fn asymmetry(&self) -> f64;
}

impl DenseOps for Mat<f64> {
    fn diagonal_vec(&self) -> Vec<f64> {
        (0..self.nrows().min(self.ncols())).map(|i| self[(i, i)]).collect()
    }

    fn diagonal_scale(&self, left: &[f64], right: &[f64]) -> Mat<f64> {
        assert_eq!(left.len(), self.nrows(), "left scaling has incorrect length");
        assert_eq!(right.len(), self.ncols(), "right scaling has incorrect length");
        Mat::from_fn(self.nrows(), self.ncols(), |i, j| left[i] * self[(i, j)] * right[j])
    }

    fn symmetrized(&self) -> Mat<f64> {
        let n = self.nrows();
        Mat::from_fn(n, n, |i, j| 0.5 * (self[(i, j)] + self[(j, i)]))
    }

    fn asymmetry(&self) -> f64 {
        let n = self.nrows();
        let mut worst = 0.0f64;
        for j in 0..n {
            for i in 0..j {
                worst = worst.max((self[(i, j)] - self[(j, i)]).abs());
            }
        }
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sided_scaling() {
        let a = Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { -1.0 });
        let s = a.diagonal_scale(&[2.0, 1.0], &[2.0, 1.0]);
        assert_eq!(s.diagonal_vec(), vec![8.0, 2.0]);
        assert_eq!(s[(0, 1)], -2.0);
        assert_eq!(s.asymmetry(), 0.0);
    }
}
