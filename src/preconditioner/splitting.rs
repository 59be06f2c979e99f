//! Algebraic sign splitting of indefinite local blocks.
//!
//! `A` is split as `Σ_s R_sᵀ B_s R_s` with `B = A ⊘ Mu`, `Mu_ij` the number of subdomains
//! containing both `i` and `j`. The restrictions `B_s` are symmetric but may be indefinite. With
//! `B_s = V Λ Vᵀ`, the negative eigenpairs give the low-rank `Aneg_s = Σ |λ| v vᵀ`, and
//!
//! - `Apos_s = B_s + Aneg_s` is positive semi-definite, its kernel holding the negative
//!   eigenvectors,
//! - `Apos_s⁺ = P B_s⁺ P` with `P` the projector onto the complement of the negative eigenvectors,
//! - globally `Apos = A + Σ_s R_sᵀ Aneg_s R_s`.
//!
//! The preconditioner is the two-level BNN preconditioner of `Apos` with local operators
//! `diag(μ) Apos_s diag(μ)`. The scaled negative eigenvectors, and the kernel of `B_s`, seed the
//! coarse space.

use crate::config::{CoarseCorrection, SplittingOptions};
use crate::core::traits::LinearOperator;
use crate::core::wrappers::pointwise;
use crate::error::KError;
use crate::matrix::{CsrMatrix, UnassembledMatrix};
use crate::operator::{
    ComplementProjector, DistributedSpectralCorrection, ProjectedInverse, ScaledOperator, SpanProjector,
    SpectralCorrection, SumOperator,
};
use crate::parallel::{Comm, Exchange};
use crate::preconditioner::coarse::CoarseOperators;
use crate::preconditioner::geneo::{self, GenEoInput, SubdomainReport};
use crate::preconditioner::minimal::{minimal_coarse_space, with_fallback};
use crate::preconditioner::scaling::partition_of_unity;
use crate::preconditioner::two_level::{map_owned, LocalPair, TwoLevel};
use crate::preconditioner::{CoarseSpaceReport, DomainDecomposition};
use crate::solver::direct::NULL_PIVOT_TOL;
use crate::solver::{Definiteness, EigenProblem, Eigensolver, LocalSolver, SymmetricDirectSolver, Which};
use faer::Mat;
use std::sync::Arc;

/// The pieces of one subdomain's splitting.
pub struct SplitBlock {
    /// `B_s`.
    pub bs: Arc<Mat<f64>>,
    /// `Aneg_s`.
    pub anegs: Arc<SpectralCorrection>,
    /// `Apos_s = B_s + Aneg_s`.
    pub aposs: Arc<SumOperator>,
}

pub struct PcSplitting {
    a: Arc<CsrMatrix>,
    apos: Arc<SumOperator>,
    blocks: Vec<SplitBlock>,
    engine: TwoLevel,
    report: CoarseSpaceReport,
}

// Negative part of the spectrum of `bs`: eigenvalues below `-NULL_PIVOT_TOL * max |b_ij|`.
fn negative_spectrum(
    bs: &Mat<f64>,
    nev: usize,
    subdomain: usize,
    eigensolver: &dyn Eigensolver,
) -> Result<(Vec<f64>, Vec<Vec<f64>>), KError> {
    let n = bs.nrows();
    let nev = nev.min(n);
    if nev == 0 {
        return Ok((Vec::new(), Vec::new()));
    }
    let pairs = eigensolver.solve(&EigenProblem::standard(bs), nev, Which::Smallest)?;
    if pairs.converged() < nev {
        log::warn!(
            "subdomain {subdomain}: {} eigenvalues of B_s converged (less than the {nev} requested)",
            pairs.converged()
        );
    }
    let scale = (0..n).flat_map(|i| (0..n).map(move |j| (i, j))).map(|(i, j)| bs[(i, j)].abs()).fold(0.0, f64::max);
    let tol = NULL_PIVOT_TOL * scale;
    let mut dnegs = Vec::new();
    let mut vnegs = Vec::new();
    for (lambda, v) in pairs.values.into_iter().zip(pairs.vectors) {
        if lambda < -tol {
            dnegs.push(-lambda);
            vnegs.push(v);
        }
    }
    Ok((dnegs, vnegs))
}

impl PcSplitting {
    pub fn new(
        matrix: &UnassembledMatrix,
        comm: Arc<dyn Comm>,
        opts: &SplittingOptions,
        eigensolver: &dyn Eigensolver,
    ) -> Result<Self, KError> {
        let dd = &opts.dd;
        let a = Arc::new(matrix.assemble()?);
        let b = matrix.split_matrix(&a);
        log::debug!("split operator: {} nonzeros, asymmetry {:e}", b.nnz(), b.asymmetry());
        let exchange = Arc::new(Exchange::new(matrix.n_global(), &matrix.index_sets(), comm)?);
        let (mult, mult_max) = exchange.multiplicity()?;
        let rank0 = exchange.comm().rank() == 0;
        if dd.switch_to_asm {
            log::warn!(
                "Additive Schwarz with the sign splitting has no eigmax coarse component, \
                 the coarse space only holds the minimal and eigmin vectors"
            );
        }

        let built = map_owned(exchange.owned(), |pos, s| {
            let dofs = exchange.dofs(pos);
            let n = dofs.len();
            let bs = Arc::new(b.submatrix(dofs));
            let as_ = a.submatrix(dofs);
            let (dnegs, vnegs) = negative_spectrum(&bs, opts.bs_nev, s, eigensolver)?;
            let n_negative = dnegs.len();
            if dd.verbose {
                log::info!("subdomain {s}: B_s has {n_negative} negative eigenvalue(s)");
            }

            let anegs = Arc::new(SpectralCorrection::new(n, dnegs, vnegs.clone()));
            let aposs = Arc::new(SumOperator::new(vec![
                bs.clone() as Arc<dyn LinearOperator>,
                anegs.clone() as Arc<dyn LinearOperator>,
            ]));
            let bs_solver = Arc::new(SymmetricDirectSolver::factorize(&bs, Definiteness::Indefinite, s)?);
            if bs_solver.negative_pivots() > n_negative {
                log::warn!(
                    "subdomain {s}: B_s has {} negative pivots but only {n_negative} negative eigenpairs were split off, \
                     increase bs_nev",
                    bs_solver.negative_pivots()
                );
            }
            let inv_aposs = Arc::new(ProjectedInverse::new(
                ComplementProjector::new(SpanProjector::new(n, vnegs.clone())),
                bs_solver.clone(),
            ));

            let mus = mult[pos].clone();
            let invmus = partition_of_unity(&mus);
            let ms = Arc::new(ScaledOperator::new(aposs.clone() as Arc<dyn LinearOperator>, mus.clone(), mus));

            let (pair, minimal) = if dd.switch_to_asm {
                let solver = SymmetricDirectSolver::factorize(&as_, Definiteness::PositiveSemidefinite, s)?;
                let minimal = minimal_coarse_space(&solver, &invmus);
                let pair = LocalPair {
                    op: Arc::new(as_.clone()) as Arc<dyn LinearOperator>,
                    solver: Arc::new(solver) as Arc<dyn LocalSolver>,
                };
                (pair, minimal)
            } else {
                let seed = vnegs
                    .iter()
                    .chain(bs_solver.null_space())
                    .map(|v| pointwise(v, &invmus))
                    .collect();
                let minimal = with_fallback(seed, &invmus);
                let solver = ScaledOperator::new(inv_aposs as Arc<dyn LocalSolver>, invmus.clone(), invmus.clone());
                let pair = LocalPair {
                    op: ms.clone() as Arc<dyn LinearOperator>,
                    solver: Arc::new(solver) as Arc<dyn LocalSolver>,
                };
                (pair, minimal)
            };

            let (basis, report) = if dd.geneo {
                let input = GenEoInput {
                    subdomain: s,
                    local_op: pair.op.as_ref(),
                    scaled_op: ms.as_ref(),
                    assembled_op: &as_,
                    asm: dd.switch_to_asm,
                    eigmax_available: !dd.switch_to_asm,
                };
                geneo::enrich(&dd.geneo_opts, &input, minimal, eigensolver)?
            } else {
                let report = SubdomainReport { subdomain: s, minimal: minimal.len(), ..Default::default() };
                (minimal, report)
            };
            if dd.verbose {
                log::info!(
                    "subdomain {s}: {} minimal, {} eigmax, {} eigmin coarse vector(s)",
                    report.minimal,
                    report.eigmax,
                    report.eigmin
                );
            }
            Ok((SplitBlock { bs, anegs, aposs }, pair, basis, report))
        })?;

        let mut blocks = Vec::with_capacity(built.len());
        let mut locals = Vec::with_capacity(built.len());
        let mut v0s = Vec::with_capacity(built.len());
        let mut subdomains = Vec::with_capacity(built.len());
        for (block, pair, basis, report) in built {
            blocks.push(block);
            locals.push(pair);
            v0s.push(basis);
            subdomains.push(report);
        }

        let corrections: Vec<SpectralCorrection> = blocks.iter().map(|b| b.anegs.as_ref().clone()).collect();
        let negative_eigenvalues: Vec<usize> = corrections.iter().map(|c| c.rank()).collect();
        let total_negative = exchange.comm().all_reduce(negative_eigenvalues.iter().sum::<usize>() as f64);
        if dd.verbose && rank0 {
            log::info!("{total_negative} negative eigenvalue(s) split off over all subdomains");
        }
        let aneg = Arc::new(DistributedSpectralCorrection::new(exchange.clone(), corrections));
        let apos = Arc::new(SumOperator::new(vec![
            a.clone() as Arc<dyn LinearOperator>,
            aneg as Arc<dyn LinearOperator>,
        ]));

        let coarse = CoarseOperators::new(&v0s, apos.clone(), &exchange)?;
        let report = CoarseSpaceReport {
            subdomains,
            coarse_dim: coarse.dim(),
            mult_max,
            negative_eigenvalues,
            eigmax_unavailable: dd.switch_to_asm,
        };
        if dd.verbose && rank0 {
            log::info!("coarse space of dimension {} (max multiplicity {mult_max})", coarse.dim());
            if dd.geneo && dd.geneo_opts.eigmax && !dd.switch_to_asm {
                log::info!(
                    "GenEO eigmax threshold {}: largest eigenvalue bounded by {}",
                    dd.geneo_opts.tau_eigmax,
                    mult_max / dd.geneo_opts.tau_eigmax
                );
            }
        }
        let engine = TwoLevel::new(exchange, locals, coarse, dd.coarse_correction())?;
        Ok(Self { a, apos, blocks, engine, report })
    }

    /// The assembled indefinite-split operator `A`.
    pub fn matrix(&self) -> &Arc<CsrMatrix> {
        &self.a
    }

    /// `Apos = A + Aneg`, the operator this preconditions.
    pub fn apos(&self) -> &Arc<SumOperator> {
        &self.apos
    }

    pub fn exchange(&self) -> &Arc<Exchange> {
        self.engine.exchange()
    }

    pub fn coarse(&self) -> &CoarseOperators {
        self.engine.coarse()
    }

    pub fn split_block(&self, pos: usize) -> &SplitBlock {
        &self.blocks[pos]
    }

    pub fn local_operator(&self, pos: usize) -> &dyn LinearOperator {
        self.engine.local(pos).op.as_ref()
    }

    pub fn local_solver(&self, pos: usize) -> &dyn LocalSolver {
        self.engine.local(pos).solver.as_ref()
    }
}

impl DomainDecomposition for PcSplitting {
    fn apply(&self, x: &[f64]) -> Result<Vec<f64>, KError> {
        self.engine.apply(x)
    }

    fn apply_multi(&self, x: &[f64]) -> Result<Vec<Vec<f64>>, KError> {
        self.engine.apply_multi(x)
    }

    fn coarse_init(&self, b: &[f64]) -> Result<Vec<f64>, KError> {
        self.engine.coarse().coarse_init(b)
    }

    fn correction(&self) -> CoarseCorrection {
        self.engine.correction()
    }

    fn operator(&self) -> Arc<dyn LinearOperator> {
        self.apos.clone()
    }

    fn report(&self) -> &CoarseSpaceReport {
        &self.report
    }
}
