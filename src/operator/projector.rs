// Orthogonal projectors onto a span of orthonormal local vectors and onto its complement

use crate::core::traits::{Indexing, MatVec};
use crate::core::wrappers::{axpy, dot};

/// `x ↦ Σ_i (v_i · x) v_i` for orthonormal `v_i`.
#[derive(Clone)]
pub struct SpanProjector {
    n: usize,
    vectors: Vec<Vec<f64>>,
}

impl SpanProjector {
    pub fn new(n: usize, vectors: Vec<Vec<f64>>) -> Self {
        assert!(vectors.iter().all(|v| v.len() == n), "basis vectors have incorrect length");
        Self { n, vectors }
    }

    pub fn project(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.n];
        for v in &self.vectors {
            axpy(dot(v, x), v, &mut y);
        }
        y
    }
}

impl MatVec<Vec<f64>> for SpanProjector {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        assert_eq!(x.len(), self.n, "Input vector x has incorrect length");
        *y = self.project(x);
    }
}

impl Indexing for SpanProjector {
    fn nrows(&self) -> usize {
        self.n
    }
}

/// `I − P_V`.
#[derive(Clone)]
pub struct ComplementProjector {
    span: SpanProjector,
}

impl ComplementProjector {
    pub fn new(span: SpanProjector) -> Self {
        Self { span }
    }

    pub fn project(&self, x: &[f64]) -> Vec<f64> {
        let mut y = x.to_vec();
        axpy(-1.0, &self.span.project(x), &mut y);
        y
    }
}

impl MatVec<Vec<f64>> for ComplementProjector {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        assert_eq!(x.len(), self.span.n, "Input vector x has incorrect length");
        *y = self.project(x);
    }
}

impl Indexing for ComplementProjector {
    fn nrows(&self) -> usize {
        self.span.n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn projectors_split_a_vector() {
        let s = 0.5f64.sqrt();
        let p = SpanProjector::new(3, vec![vec![s, s, 0.0]]);
        let q = ComplementProjector::new(p.clone());
        let x = [3.0, 1.0, -2.0];
        let px = p.project(&x);
        let qx = q.project(&x);
        assert_abs_diff_eq!(px[0], 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(qx[0], 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(qx[1], -1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(dot(&px, &qx), 0.0, epsilon = 1e-14);
        // idempotent
        let ppx = p.project(&px);
        for (a, b) in ppx.iter().zip(&px) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-14);
        }
    }
}
