use thiserror::Error;

// Unified error type for geneo-dd

#[derive(Error, Debug)]
pub enum KError {
    #[error("factorization error: {0}")]
    FactorError(String),
    #[error("solve error: {0}")]
    SolveError(String),
    #[error("local operator of subdomain {subdomain} is not positive semi-definite (pivot {eigenvalue:e})")]
    NotPositiveDefinite { subdomain: usize, eigenvalue: f64 },
    #[error("indefinite matrix detected (p^T A p <= 0)")]
    IndefiniteMatrix,
    #[error("indefinite preconditioner detected (beta < 0)")]
    IndefinitePreconditioner,
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("communication error: {0}")]
    CommError(String),
    #[error("eigendecomposition failed: {0}")]
    EigenError(String),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl KError {
    /// Shorthand used by every size check in the crate.
    pub(crate) fn check_len(expected: usize, found: usize) -> Result<(), KError> {
        if expected == found {
            Ok(())
        } else {
            Err(KError::DimensionMismatch { expected, found })
        }
    }
}
