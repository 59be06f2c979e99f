//! Subdomain-wise (unassembled) matrices.
//!
//! An [`UnassembledMatrix`] stores, for every subdomain `s`, its local Neumann matrix `M_s` and the
//! local-to-global map `R_s`, so that the global operator is `A = Σ_s R_sᵀ M_s R_s`. This is the
//! input format of the domain-decomposition preconditioners: `M_s` is the non-assembled local
//! matrix, and assembling it gives the global `A` whose restrictions are the `A_s`.

use crate::core::traits::{Indexing, MatVec};
use crate::error::KError;
use crate::matrix::sparse::CsrMatrix;
use faer::Mat;
use faer::sparse::Triplet;

/// Local matrix of one subdomain together with the global index of every local dof.
#[derive(Clone)]
pub struct LocalBlock {
    pub dofs: Vec<usize>,
    pub mat: Mat<f64>,
}

#[derive(Clone)]
pub struct UnassembledMatrix {
    n_global: usize,
    blocks: Vec<LocalBlock>,
}

impl UnassembledMatrix {
    pub fn new(n_global: usize, blocks: Vec<LocalBlock>) -> Result<Self, KError> {
        for block in &blocks {
            KError::check_len(block.dofs.len(), block.mat.nrows())?;
            KError::check_len(block.dofs.len(), block.mat.ncols())?;
            if let Some(&g) = block.dofs.iter().find(|&&g| g >= n_global) {
                return Err(KError::DimensionMismatch { expected: n_global, found: g + 1 });
            }
        }
        Ok(Self { n_global, blocks })
    }

    pub fn n_global(&self) -> usize {
        self.n_global
    }

    pub fn n_subdomains(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> &[LocalBlock] {
        &self.blocks
    }

    pub fn block(&self, s: usize) -> &LocalBlock {
        &self.blocks[s]
    }

    /// Local-to-global maps of all subdomains, as consumed by [`crate::parallel::Exchange`].
    pub fn index_sets(&self) -> Vec<Vec<usize>> {
        self.blocks.iter().map(|b| b.dofs.clone()).collect()
    }

    /// Global operator `A = Σ_s R_sᵀ M_s R_s`.
    pub fn assemble(&self) -> Result<CsrMatrix, KError> {
        let mut triplets = Vec::new();
        for block in &self.blocks {
            for (lj, &gj) in block.dofs.iter().enumerate() {
                for (li, &gi) in block.dofs.iter().enumerate() {
                    let v = block.mat[(li, lj)];
                    if v != 0.0 {
                        triplets.push(Triplet { row: gi, col: gj, val: v });
                    }
                }
            }
        }
        CsrMatrix::from_triplets(self.n_global, self.n_global, &triplets)
    }

    /// For every stored entry `(i, j)` of `a`, the number of subdomains containing both `i` and `j`.
    pub fn pair_multiplicity(&self, a: &CsrMatrix) -> CsrMatrix {
        let mut counts: Vec<Vec<f64>> = (0..a.nrows()).map(|i| vec![0.0; a.row(i).0.len()]).collect();
        let mut member = vec![false; self.n_global];
        for block in &self.blocks {
            for &g in &block.dofs {
                member[g] = true;
            }
            for &i in &block.dofs {
                let (cols, _) = a.row(i);
                for (k, &j) in cols.iter().enumerate() {
                    if member[j] {
                        counts[i][k] += 1.0;
                    }
                }
            }
            for &g in &block.dofs {
                member[g] = false;
            }
        }
        a.map_values(|i, j, _| {
            let (cols, _) = a.row(i);
            match cols.binary_search(&j) {
                Ok(k) => counts[i][k],
                Err(_) => 0.0,
            }
        })
    }

    /// Splitting matrix `B = A ⊘ Mu`, whose restrictions `B_s` satisfy `Σ_s R_sᵀ B_s R_s = A`.
    pub fn split_matrix(&self, a: &CsrMatrix) -> CsrMatrix {
        let mu = self.pair_multiplicity(a);
        a.map_values(|i, j, v| {
            let m = mu.get(i, j);
            if m > 0.0 { v / m } else { v }
        })
    }
}

impl MatVec<Vec<f64>> for UnassembledMatrix {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        assert_eq!(x.len(), self.n_global, "Input vector x has incorrect length");
        assert_eq!(y.len(), self.n_global, "Output vector y has incorrect length");
        y.iter_mut().for_each(|yi| *yi = 0.0);
        for block in &self.blocks {
            let xl: Vec<f64> = block.dofs.iter().map(|&g| x[g]).collect();
            let mut yl = vec![0.0; xl.len()];
            block.mat.matvec(&xl, &mut yl);
            for (&g, v) in block.dofs.iter().zip(yl) {
                y[g] += v;
            }
        }
    }
}

impl Indexing for UnassembledMatrix {
    fn nrows(&self) -> usize {
        self.n_global
    }
}
