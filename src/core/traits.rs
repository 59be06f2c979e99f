//! Core linear-algebra traits for geneo-dd.

/// Matrix–vector product: y ← A x.
pub trait MatVec<V> {
    /// Compute y = A · x.
    fn matvec(&self, x: &V, y: &mut V);
}

/// Inner products & norms.
pub trait InnerProduct<V> {
    /// Associated scalar type.
    type Scalar: Copy + PartialOrd + From<f64>;
    /// Compute dot(x, y).
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖₂.
    fn norm(&self, x: &V) -> Self::Scalar;
}

/// Uniform indexing into vectors (dense or sparse).
pub trait Indexing {
    /// Number of rows (or length for a vector).
    fn nrows(&self) -> usize;
}

/// A square real operator acting on plain vectors.
///
/// This is the single capability every matrix-free composite in
/// [`crate::operator`] provides, and what the eigensolver, the coarse
/// operators and the Krylov driver consume. Anything that is a
/// `MatVec<Vec<f64>> + Indexing` and can be shared across threads is one.
pub trait LinearOperator: MatVec<Vec<f64>> + Indexing + Send + Sync {
    /// Convenience wrapper allocating the output.
    fn apply_to(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.nrows()];
        self.matvec(&x.to_vec(), &mut y);
        y
    }
}

impl<T> LinearOperator for T where T: MatVec<Vec<f64>> + Indexing + Send + Sync {}
