//! Balancing Neumann-Neumann and non-overlapping Additive Schwarz.
//!
//! The local solver of subdomain `s` inverts either the scaled Neumann matrix `K_s M_s K_s` (BNN,
//! default) or the assembled restriction `A_s` (Additive Schwarz). The coarse space is the minimal
//! one (kernel of the local operator, or the weighted constant), optionally enriched by GenEO,
//! and the coarse operators are built on the assembled `A`.

use crate::config::{CoarseCorrection, DdOptions};
use crate::core::traits::LinearOperator;
use crate::error::KError;
use crate::matrix::{CsrMatrix, DenseOps, UnassembledMatrix};
use crate::parallel::{Comm, Exchange};
use crate::preconditioner::coarse::CoarseOperators;
use crate::preconditioner::geneo::{self, GenEoInput, SubdomainReport};
use crate::preconditioner::minimal::minimal_coarse_space;
use crate::preconditioner::scaling::{partition_of_unity, scaling_factors};
use crate::preconditioner::two_level::{map_owned, LocalPair, TwoLevel};
use crate::preconditioner::{CoarseSpaceReport, DomainDecomposition};
use crate::solver::{Definiteness, Eigensolver, LocalSolver, SymmetricDirectSolver};
use std::sync::Arc;

pub struct PcBnn {
    a: Arc<CsrMatrix>,
    engine: TwoLevel,
    report: CoarseSpaceReport,
}

impl PcBnn {
    pub fn new(
        matrix: &UnassembledMatrix,
        comm: Arc<dyn Comm>,
        opts: &DdOptions,
        eigensolver: &dyn Eigensolver,
    ) -> Result<Self, KError> {
        let a = Arc::new(matrix.assemble()?);
        log::debug!("assembled operator: {} nonzeros, asymmetry {:e}", a.nnz(), a.asymmetry());
        let exchange = Arc::new(Exchange::new(matrix.n_global(), &matrix.index_sets(), comm)?);
        let (mult, mult_max) = exchange.multiplicity()?;
        let rank0 = exchange.comm().rank() == 0;
        if opts.switch_to_asm && rank0 {
            log::info!("switching to Additive Schwarz instead of BNN");
        }

        let built = map_owned(exchange.owned(), |pos, s| {
            let ms = &matrix.block(s).mat;
            let as_ = a.submatrix(exchange.dofs(pos));
            let k = scaling_factors(ms, &as_, &mult[pos], opts.kscaling);
            let ms_scaled = Arc::new(ms.diagonal_scale(&k, &k));
            let local_op = if opts.switch_to_asm { Arc::new(as_.clone()) } else { ms_scaled.clone() };
            let solver = SymmetricDirectSolver::factorize(&local_op, Definiteness::PositiveSemidefinite, s)?;
            let minimal = minimal_coarse_space(&solver, &partition_of_unity(&k));
            let (basis, report) = if opts.geneo {
                let input = GenEoInput {
                    subdomain: s,
                    local_op: local_op.as_ref(),
                    scaled_op: ms_scaled.as_ref(),
                    assembled_op: &as_,
                    asm: opts.switch_to_asm,
                    eigmax_available: true,
                };
                geneo::enrich(&opts.geneo_opts, &input, minimal, eigensolver)?
            } else {
                let report = SubdomainReport { subdomain: s, minimal: minimal.len(), ..Default::default() };
                (minimal, report)
            };
            if opts.verbose {
                log::info!(
                    "subdomain {s}: {} minimal, {} eigmax, {} eigmin coarse vector(s)",
                    report.minimal,
                    report.eigmax,
                    report.eigmin
                );
            }
            let pair = LocalPair {
                op: local_op as Arc<dyn LinearOperator>,
                solver: Arc::new(solver) as Arc<dyn LocalSolver>,
            };
            Ok((pair, basis, report))
        })?;

        let mut locals = Vec::with_capacity(built.len());
        let mut v0s = Vec::with_capacity(built.len());
        let mut subdomains = Vec::with_capacity(built.len());
        for (pair, basis, report) in built {
            locals.push(pair);
            v0s.push(basis);
            subdomains.push(report);
        }
        let coarse = CoarseOperators::new(&v0s, a.clone(), &exchange)?;
        let report = CoarseSpaceReport {
            subdomains,
            coarse_dim: coarse.dim(),
            mult_max,
            negative_eigenvalues: Vec::new(),
            eigmax_unavailable: false,
        };
        if opts.verbose && rank0 {
            log::info!("coarse space of dimension {} (max multiplicity {mult_max})", coarse.dim());
            if opts.geneo && opts.geneo_opts.eigmax {
                log::info!(
                    "GenEO eigmax threshold {}: largest eigenvalue bounded by {}",
                    opts.geneo_opts.tau_eigmax,
                    mult_max / opts.geneo_opts.tau_eigmax
                );
            }
            if opts.geneo && opts.geneo_opts.eigmin && opts.switch_to_asm {
                log::info!("GenEO eigmin threshold: smallest eigenvalue bounded by {}", opts.geneo_opts.tau_eigmin);
            }
        }
        let engine = TwoLevel::new(exchange, locals, coarse, opts.coarse_correction())?;
        Ok(Self { a, engine, report })
    }

    pub fn matrix(&self) -> &Arc<CsrMatrix> {
        &self.a
    }

    pub fn exchange(&self) -> &Arc<Exchange> {
        self.engine.exchange()
    }

    pub fn coarse(&self) -> &CoarseOperators {
        self.engine.coarse()
    }

    /// Local operator `Ã_s` of the `pos`-th owned subdomain.
    pub fn local_operator(&self, pos: usize) -> &dyn LinearOperator {
        self.engine.local(pos).op.as_ref()
    }

    /// Local solver of `Ã_s`.
    pub fn local_solver(&self, pos: usize) -> &dyn LocalSolver {
        self.engine.local(pos).solver.as_ref()
    }
}

impl DomainDecomposition for PcBnn {
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
        self.a.clone()
    }

    fn report(&self) -> &CoarseSpaceReport {
        &self.report
    }
}
