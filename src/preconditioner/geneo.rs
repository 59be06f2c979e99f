//! GenEO coarse-space enrichment.
//!
//! On each subdomain, with `Ã_s` the local solver operator, `M̃_s` the scaled Neumann operator and
//! `A_s` the assembled restriction:
//!
//! - eigmax: `Ã_s y = θ A_s y`, smallest `θ`, search space orthogonal to the current basis. The
//!   modes with `θ < tau_eigmax` are added, which bounds the largest eigenvalue of the two-level
//!   preconditioned operator by `max_multiplicity / tau_eigmax`.
//! - eigmin (Additive Schwarz only): `M̃_s z = λ Ã_s z`, smallest `λ`. The modes with
//!   `λ < tau_eigmin` are added, which bounds the smallest eigenvalue from below by `tau_eigmin`.
//!
//! A solver delivering fewer pairs than requested only weakens the coarse space.

use crate::config::GenEoOptions;
use crate::core::traits::LinearOperator;
use crate::core::wrappers::orthonormalize;
use crate::error::KError;
use crate::solver::{EigenProblem, Eigensolver, Which};

/// Operators of one subdomain's eigenproblems.
pub struct GenEoInput<'a> {
    pub subdomain: usize,
    /// `Ã_s`.
    pub local_op: &'a dyn LinearOperator,
    /// `M̃_s`.
    pub scaled_op: &'a dyn LinearOperator,
    /// `A_s`.
    pub assembled_op: &'a dyn LinearOperator,
    pub asm: bool,
    /// `false` when no eigmax problem is defined for the current operator pair.
    pub eigmax_available: bool,
}

/// Composition of one subdomain's contribution to the coarse space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubdomainReport {
    pub subdomain: usize,
    pub minimal: usize,
    pub eigmax: usize,
    pub eigmin: usize,
    /// Eigenpairs requested and delivered, summed over the eigenproblems solved.
    pub requested: usize,
    pub converged: usize,
}

impl SubdomainReport {
    pub fn total(&self) -> usize {
        self.minimal + self.eigmax + self.eigmin
    }
}

// Solves one problem, warns on under-convergence, returns the vectors below `tau`.
fn select_below(
    eigensolver: &dyn Eigensolver,
    problem: &EigenProblem<'_>,
    nev: usize,
    tau: f64,
    label: &str,
    report: &mut SubdomainReport,
) -> Result<Vec<Vec<f64>>, KError> {
    let pairs = eigensolver.solve(problem, nev, Which::Smallest)?;
    report.requested += nev;
    report.converged += pairs.converged();
    if pairs.converged() < nev {
        log::warn!(
            "subdomain {}: {} eigenpairs converged for the {label} problem (less than the {nev} requested)",
            report.subdomain,
            pairs.converged()
        );
    }
    Ok(pairs
        .values
        .into_iter()
        .zip(pairs.vectors)
        .filter(|(theta, _)| *theta < tau)
        .map(|(_, v)| v)
        .collect())
}

/// Enriches the orthonormal `minimal` basis of one subdomain.
pub fn enrich(
    opts: &GenEoOptions,
    input: &GenEoInput<'_>,
    minimal: Vec<Vec<f64>>,
    eigensolver: &dyn Eigensolver,
) -> Result<(Vec<Vec<f64>>, SubdomainReport), KError> {
    let n = input.local_op.nrows();
    let mut report = SubdomainReport { subdomain: input.subdomain, minimal: minimal.len(), ..Default::default() };
    let mut basis = minimal;

    if opts.eigmax && input.eigmax_available {
        let nev = opts.nev.min(n.saturating_sub(basis.len()));
        if nev > 0 {
            let problem = EigenProblem::generalized(input.local_op, input.assembled_op).deflated(&basis);
            let found = select_below(eigensolver, &problem, nev, opts.tau_eigmax, "eigmax", &mut report)?;
            let added = orthonormalize(&basis, found, 1e-8);
            report.eigmax = added.len();
            basis.extend(added);
        }
    }

    if opts.eigmin && input.asm {
        let nev = opts.nev.min(n.saturating_sub(basis.len()));
        if nev > 0 {
            let problem = EigenProblem::generalized(input.scaled_op, input.local_op).deflated(&basis);
            let found = select_below(eigensolver, &problem, nev, opts.tau_eigmin, "eigmin", &mut report)?;
            let added = orthonormalize(&basis, found, 1e-8);
            report.eigmin = added.len();
            basis.extend(added);
        }
    }

    log::debug!(
        "subdomain {}: coarse contribution {} minimal + {} eigmax + {} eigmin",
        report.subdomain,
        report.minimal,
        report.eigmax,
        report.eigmin
    );
    Ok((basis, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{DenseEigensolver, EigenPairs};
    use faer::Mat;

    struct Stalled;
    impl Eigensolver for Stalled {
        fn solve(&self, _: &EigenProblem<'_>, nev: usize, _: Which) -> Result<EigenPairs, KError> {
            Ok(EigenPairs::empty(nev))
        }
    }

    fn diag(d: &[f64]) -> Mat<f64> {
        Mat::from_fn(d.len(), d.len(), |i, j| if i == j { d[i] } else { 0.0 })
    }

    #[test]
    fn eigmax_keeps_modes_below_threshold() {
        // θ = 0.01, 0.5, 1
        let local = diag(&[0.01, 0.5, 1.0]);
        let assembled = diag(&[1.0, 1.0, 1.0]);
        let input = GenEoInput {
            subdomain: 0,
            local_op: &local,
            scaled_op: &local,
            assembled_op: &assembled,
            asm: false,
            eigmax_available: true,
        };
        let opts = GenEoOptions { nev: 3, ..Default::default() };
        let (basis, report) = enrich(&opts, &input, Vec::new(), &DenseEigensolver::new()).unwrap();
        assert_eq!(report.eigmax, 1);
        assert_eq!(report.eigmin, 0);
        assert!((basis[0][0].abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stalled_eigensolver_keeps_the_minimal_basis() {
        let local = diag(&[1.0, 1.0]);
        let input = GenEoInput {
            subdomain: 4,
            local_op: &local,
            scaled_op: &local,
            assembled_op: &local,
            asm: true,
            eigmax_available: true,
        };
        let minimal = vec![vec![1.0, 0.0]];
        let (basis, report) = enrich(&GenEoOptions::default(), &input, minimal, &Stalled).unwrap();
        assert_eq!(basis.len(), 1);
        assert_eq!(report.converged, 0);
        assert_eq!(report.requested, 2);
        assert_eq!(report.total(), 1);
    }
}
