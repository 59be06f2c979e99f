//! Local/global exchange service.
//!
//! Maps between the per-subdomain local vectors (one entry per local degree of freedom, duplicated
//! at subdomain interfaces) and the single global vector (one entry per global degree of freedom).
//! Every process only touches the local vectors of the subdomains it owns; the forward direction
//! finishes with a collective reduction over the communicator, so every process must call it in
//! the same order.

use crate::error::KError;
use crate::parallel::Comm;
use std::sync::Arc;

/// How values are combined at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Replace the destination entries. Interface entries written by several subdomains must agree.
    Overwrite,
    /// Accumulate into the destination entries.
    Add,
}

/// Local-to-global mapping for the subdomains owned by this process.
pub struct Exchange {
    n_global: usize,
    n_subdomains: usize,
    owned: Vec<usize>,
    dofs: Vec<Vec<usize>>,
    comm: Arc<dyn Comm>,
}

impl Exchange {
    /// Builds the exchange from the index sets of *all* subdomains.
    ///
    /// `index_sets[s][i]` is the global index of local degree of freedom `i` of subdomain `s`.
    pub fn new(n_global: usize, index_sets: &[Vec<usize>], comm: Arc<dyn Comm>) -> Result<Self, KError> {
        let owned = comm.owned_subdomains(index_sets.len())?;
        let mut dofs = Vec::with_capacity(owned.len());
        for &s in &owned {
            let set = &index_sets[s];
            let mut seen = vec![false; n_global];
            for &g in set {
                if g >= n_global {
                    return Err(KError::DimensionMismatch { expected: n_global, found: g + 1 });
                }
                if seen[g] {
                    return Err(KError::CommError(format!(
                        "global dof {g} appears twice in subdomain {s}"
                    )));
                }
                seen[g] = true;
            }
            dofs.push(set.clone());
        }
        Ok(Self { n_global, n_subdomains: index_sets.len(), owned, dofs, comm })
    }

    pub fn n_global(&self) -> usize {
        self.n_global
    }

    /// Total number of subdomains across all processes.
    pub fn n_subdomains(&self) -> usize {
        self.n_subdomains
    }

    /// Ids of the subdomains owned by this process.
    pub fn owned(&self) -> &[usize] {
        &self.owned
    }

    /// Local-to-global map of the `pos`-th owned subdomain.
    pub fn dofs(&self, pos: usize) -> &[usize] {
        &self.dofs[pos]
    }

    pub fn comm(&self) -> &dyn Comm {
        self.comm.as_ref()
    }

    /// Fresh zeroed local vectors, one per owned subdomain.
    pub fn local_zeros(&self) -> Vec<Vec<f64>> {
        self.dofs.iter().map(|d| vec![0.0; d.len()]).collect()
    }

    fn check_locals(&self, locals: &[Vec<f64>]) -> Result<(), KError> {
        KError::check_len(self.owned.len(), locals.len())?;
        for (local, dofs) in locals.iter().zip(&self.dofs) {
            KError::check_len(dofs.len(), local.len())?;
        }
        Ok(())
    }

    /// Global → local (reverse scatter). No communication: global vectors are replicated.
    pub fn reverse_into(&self, global: &[f64], locals: &mut [Vec<f64>], mode: InsertMode) -> Result<(), KError> {
        KError::check_len(self.n_global, global.len())?;
        self.check_locals(locals)?;
        for (local, dofs) in locals.iter_mut().zip(&self.dofs) {
            for (li, &g) in local.iter_mut().zip(dofs) {
                match mode {
                    InsertMode::Overwrite => *li = global[g],
                    InsertMode::Add => *li += global[g],
                }
            }
        }
        Ok(())
    }

    /// Global → local restriction of `global` onto every owned subdomain.
    pub fn reverse(&self, global: &[f64]) -> Result<Vec<Vec<f64>>, KError> {
        let mut locals = self.local_zeros();
        self.reverse_into(global, &mut locals, InsertMode::Overwrite)?;
        Ok(locals)
    }

    /// Local vectors of the owned subdomains, read from `global`. Sizes are not checked.
    pub(crate) fn restrict(&self, global: &[f64]) -> Vec<Vec<f64>> {
        self.dofs.iter().map(|dofs| dofs.iter().map(|&g| global[g]).collect()).collect()
    }

    /// Sum over all subdomains of the local vectors spread to the global space. Collective;
    /// sizes are not checked.
    pub(crate) fn accumulate(&self, locals: &[Vec<f64>]) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_global];
        for (local, dofs) in locals.iter().zip(&self.dofs) {
            for (&v, &g) in local.iter().zip(dofs) {
                sums[g] += v;
            }
        }
        self.comm.all_reduce_slice(&mut sums);
        sums
    }

    /// Local → global (forward scatter). Collective.
    pub fn forward(&self, locals: &[Vec<f64>], global: &mut [f64], mode: InsertMode) -> Result<(), KError> {
        KError::check_len(self.n_global, global.len())?;
        self.check_locals(locals)?;
        let sums = self.accumulate(locals);
        match mode {
            InsertMode::Add => {
                for (gi, si) in global.iter_mut().zip(&sums) {
                    *gi += si;
                }
            }
            InsertMode::Overwrite => {
                let mut writers = vec![0.0; self.n_global];
                for dofs in &self.dofs {
                    for &g in dofs {
                        writers[g] += 1.0;
                    }
                }
                self.comm.all_reduce_slice(&mut writers);
                for ((gi, si), wi) in global.iter_mut().zip(&sums).zip(&writers) {
                    if *wi > 0.0 {
                        *gi = si / wi;
                    }
                }
            }
        }
        Ok(())
    }

    /// Local → global accumulation of a single subdomain's local vector. Collective.
    ///
    /// Only the owner of `subdomain` contributes; the others contribute zero but still take part
    /// in the reduction.
    pub fn forward_single(&self, subdomain: usize, locals: &[Vec<f64>], global: &mut [f64]) -> Result<(), KError> {
        KError::check_len(self.n_global, global.len())?;
        self.check_locals(locals)?;
        if subdomain >= self.n_subdomains {
            return Err(KError::CommError(format!(
                "subdomain {subdomain} out of range ({} subdomains)",
                self.n_subdomains
            )));
        }
        let mut sums = vec![0.0; self.n_global];
        if let Some(pos) = self.owned.iter().position(|&s| s == subdomain) {
            for (&v, &g) in locals[pos].iter().zip(&self.dofs[pos]) {
                sums[g] += v;
            }
        }
        self.comm.all_reduce_slice(&mut sums);
        for (gi, si) in global.iter_mut().zip(&sums) {
            *gi += si;
        }
        Ok(())
    }

    /// Number of subdomains sharing each local degree of freedom, and its global maximum.
    ///
    /// Forward-adds local vectors of ones, then reads the result back with a reverse overwrite.
    pub fn multiplicity(&self) -> Result<(Vec<Vec<f64>>, f64), KError> {
        let ones: Vec<Vec<f64>> = self.dofs.iter().map(|d| vec![1.0; d.len()]).collect();
        let mut global = vec![0.0; self.n_global];
        self.forward(&ones, &mut global, InsertMode::Add)?;
        let mut locals = self.local_zeros();
        self.reverse_into(&global, &mut locals, InsertMode::Overwrite)?;
        let local_max = locals.iter().flatten().cloned().fold(0.0, f64::max);
        let mult_max = self.comm.all_reduce_max(local_max);
        Ok((locals, mult_max))
    }
}
