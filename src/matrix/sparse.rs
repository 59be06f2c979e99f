// SparseMatrix trait and the CSR storage of assembled global operators

use crate::core::traits::{Indexing, MatVec};
use crate::error::KError;
use faer::Mat;
use faer::sparse::{
    SymbolicSparseRowMat,    // owning symbolic CSR alias
    SparseRowMat,            // owning numeric CSR alias
    Triplet,
};

/// A read‐only sparse matrix supporting y = A * x.
pub trait SparseMatrix<T> {
    /// Compute y = A * x.  `x.len()` is the column count, `y.len()` the row count.
    fn spmv(&self, x: &[T], y: &mut [T]);
}

/// Assembled global operator in compressed-row storage.
#[derive(Clone)]
pub struct CsrMatrix {
    inner: SparseRowMat<usize, f64>,
}

impl CsrMatrix {
    /// Build a CSR from raw row‐ptr, col‐idx, and values (columns sorted within each row).
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        // second argument `None` means “no separate row_nnz”
        let symbolic = SymbolicSparseRowMat::new_checked(nrows, ncols, row_ptr, None, col_idx);
        let inner = SparseRowMat::new(symbolic, values);
        Self { inner }
    }

    /// Build a CSR from `(row, col, value)` triplets; duplicates are summed.
    pub fn from_triplets(nrows: usize, ncols: usize, triplets: &[Triplet<usize, usize, f64>]) -> Result<Self, KError> {
        let inner = SparseRowMat::try_new_from_triplets(nrows, ncols, triplets)
            .map_err(|e| KError::FactorError(format!("sparse assembly failed: {e:?}")))?;
        Ok(Self { inner })
    }

    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.inner.as_ref().val().len()
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let m = self.inner.as_ref();
        let row_ptr = m.symbolic().row_ptr();
        let (start, end) = (row_ptr[i], row_ptr[i + 1]);
        (&m.symbolic().col_idx()[start..end], &m.val()[start..end])
    }

    /// Entry `(i, j)`, zero when not stored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (cols, vals) = self.row(i);
        match cols.binary_search(&j) {
            Ok(k) => vals[k],
            Err(_) => 0.0,
        }
    }

    /// Same sparsity pattern, values replaced by `f(i, j, a_ij)`.
    pub fn map_values(&self, f: impl Fn(usize, usize, f64) -> f64) -> CsrMatrix {
        let mut row_ptr = Vec::with_capacity(self.nrows() + 1);
        let mut col_idx = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());
        row_ptr.push(0);
        for i in 0..self.nrows() {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                col_idx.push(j);
                values.push(f(i, j, v));
            }
            row_ptr.push(col_idx.len());
        }
        CsrMatrix::from_csr(self.nrows(), self.ncols(), row_ptr, col_idx, values)
    }

    /// Dense restriction `R A Rᵀ` to the global indices `dofs` (in that order).
    pub fn submatrix(&self, dofs: &[usize]) -> Mat<f64> {
        let n = dofs.len();
        let mut local_of = std::collections::HashMap::with_capacity(n);
        for (l, &g) in dofs.iter().enumerate() {
            local_of.insert(g, l);
        }
        let mut sub = Mat::<f64>::zeros(n, n);
        for (li, &gi) in dofs.iter().enumerate() {
            let (cols, vals) = self.row(gi);
            for (gj, &v) in cols.iter().zip(vals) {
                if let Some(&lj) = local_of.get(gj) {
                    sub[(li, lj)] = v;
                }
            }
        }
        sub
    }

    /// Largest entrywise asymmetry `|a_ij - a_ji|` over the stored entries.
    pub fn asymmetry(&self) -> f64 {
        let mut worst = 0.0f64;
        for i in 0..self.nrows() {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                worst = worst.max((v - self.get(j, i)).abs());
            }
        }
        worst
    }

    /// Dense copy, for tests and small problems.
    pub fn to_dense(&self) -> Mat<f64> {
        let mut d = Mat::<f64>::zeros(self.nrows(), self.ncols());
        for i in 0..self.nrows() {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                d[(i, j)] = v;
            }
        }
        d
    }
}

impl SparseMatrix<f64> for CsrMatrix {
    fn spmv(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), CsrMatrix::ncols(self));
        assert_eq!(y.len(), CsrMatrix::nrows(self));
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            y.par_iter_mut().enumerate().for_each(|(i, yi)| {
                let (cols, vals) = self.row(i);
                *yi = cols.iter().zip(vals).map(|(&j, &v)| v * x[j]).sum();
            });
        }
        #[cfg(not(feature = "rayon"))]
        {
            for (i, yi) in y.iter_mut().enumerate() {
                let (cols, vals) = self.row(i);
                *yi = cols.iter().zip(vals).map(|(&j, &v)| v * x[j]).sum();
            }
        }
    }
}

impl MatVec<Vec<f64>> for CsrMatrix {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        self.spmv(x, y);
    }
}

impl Indexing for CsrMatrix {
    fn nrows(&self) -> usize {
        CsrMatrix::nrows(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap1d(n: usize) -> CsrMatrix {
        let mut t = Vec::new();
        for i in 0..n {
            t.push(Triplet { row: i, col: i, val: 2.0 });
            if i > 0 {
                t.push(Triplet { row: i, col: i - 1, val: -1.0 });
                t.push(Triplet { row: i - 1, col: i, val: -1.0 });
            }
        }
        CsrMatrix::from_triplets(n, n, &t).unwrap()
    }

    #[test]
    fn triplets_accumulate_duplicates() {
        let t = [
            Triplet { row: 1, col: 1, val: 4.0 },
            Triplet { row: 0, col: 0, val: 1.0 },
            Triplet { row: 1, col: 0, val: -1.0 },
            Triplet { row: 0, col: 0, val: 2.0 },
        ];
        let a = CsrMatrix::from_triplets(2, 2, &t).unwrap();
        assert_eq!(a.get(0, 0), 3.0);
        assert_eq!(a.get(1, 0), -1.0);
        assert_eq!(a.get(1, 1), 4.0);
        assert_eq!(a.get(0, 1), 0.0);
        assert_eq!(a.nnz(), 3);
    }

    #[test]
    fn out_of_bounds_triplet_is_an_error() {
        let r = CsrMatrix::from_triplets(2, 2, &[Triplet { row: 2, col: 0, val: 1.0 }]);
        assert!(matches!(r, Err(KError::FactorError(_))));
    }

    #[test]
    fn spmv_and_restriction() {
        let a = lap1d(5);
        let mut y = vec![0.0; 5];
        a.spmv(&[1.0; 5], &mut y);
        assert_eq!(y, vec![1.0, 0.0, 0.0, 0.0, 1.0]);
        let sub = a.submatrix(&[3, 2]);
        assert_eq!(sub[(0, 0)], 2.0);
        assert_eq!(sub[(0, 1)], -1.0);
        assert_eq!(a.asymmetry(), 0.0);
    }
}
