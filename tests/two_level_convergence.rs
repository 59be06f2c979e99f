//! PCG with the two-level preconditioners on the diffusion model problem.
//!
//! These tests check the scalability and robustness claims: iteration counts that do not grow
//! with the number of subdomains, that stay bounded under a coefficient jump once GenEO enriches
//! the coarse space, and a preconditioner that stays symmetric positive definite when the local
//! eigensolver delivers nothing.

use geneo_dd::assembly::DiffusionProblem;
use geneo_dd::config::{DdOptions, SplittingOptions};
use geneo_dd::context::{DdVariant, KspContext};
use geneo_dd::core::{dot, LinearOperator};
use geneo_dd::error::KError;
use geneo_dd::matrix::UnassembledMatrix;
use geneo_dd::parallel::UniverseComm;
use geneo_dd::preconditioner::{DomainDecomposition, PcBnn};
use geneo_dd::solver::{DenseEigensolver, EigenPairs, EigenProblem, Eigensolver, Which};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn system(n: usize, s: usize, contrast: f64) -> (UnassembledMatrix, Vec<f64>) {
    DiffusionProblem::new(n, n, s, s).unwrap().with_checkerboard(contrast).assemble_system().unwrap()
}

// Solves and checks the true residual; returns the iteration count.
fn solve(pc: Arc<dyn DomainDecomposition>, b: &[f64]) -> usize {
    let op = pc.operator();
    let mut ksp = KspContext::new(pc).with_tol(1e-8).with_max_it(500);
    let mut x = vec![0.0; b.len()];
    let stats = ksp.solve(b, &mut x).unwrap();
    assert!(stats.converged, "PCG did not converge in {} iterations", stats.iterations);
    let r: Vec<f64> = op.apply_to(&x).iter().zip(b).map(|(ax, bi)| bi - ax).collect();
    assert!(dot(&r, &r).sqrt() <= 1e-6 * dot(b, b).sqrt());
    stats.iterations
}

fn build(variant: DdVariant, matrix: &UnassembledMatrix) -> Arc<dyn DomainDecomposition> {
    let _ = env_logger::builder().is_test(true).try_init();
    variant.build(matrix, Arc::new(UniverseComm::Serial), &DenseEigensolver::new()).unwrap()
}

#[test]
fn minimal_coarse_space_scales_with_the_number_of_subdomains() {
    let opts = DdOptions::default().with_geneo(false);
    // H/h = 8 in both runs
    let (m2, b2) = system(16, 2, 1.0);
    let (m4, b4) = system(32, 4, 1.0);
    let it2 = solve(build(DdVariant::Bnn(opts.clone()), &m2), &b2);
    let it4 = solve(build(DdVariant::Bnn(opts), &m4), &b4);
    assert!(it4 <= 2 * it2, "{it4} iterations with 16 subdomains against {it2} with 4");
}

#[test]
fn geneo_is_robust_to_coefficient_jumps() {
    let opts = DdOptions::default().with_nev(6);
    let (m, b) = system(16, 4, 1.0);
    let homogeneous = solve(build(DdVariant::Bnn(opts.clone()), &m), &b);
    let (m, b) = system(16, 4, 1e6);
    let jump = solve(build(DdVariant::Bnn(opts), &m), &b);
    assert!(jump <= 3 * homogeneous + 5, "{jump} iterations with the jump against {homogeneous} without");
}

#[test]
fn every_coarse_correction_converges() {
    let (m, b) = system(12, 3, 100.0);
    let base = DdOptions::default().with_nev(4);
    let variants = [
        base.clone(),
        base.clone().with_add_coarse_solve(true),
        base.clone().with_coarse_projection(false).with_add_coarse_solve(true),
        base.clone().with_coarse_projection(false),
        base.asm(true),
    ];
    for opts in variants {
        solve(build(DdVariant::Bnn(opts), &m), &b);
    }
}

#[test]
fn splitting_preconditions_the_positive_operator() {
    let (m, b) = system(12, 3, 1e3);
    let pc = build(DdVariant::Splitting(SplittingOptions::new(DdOptions::default().with_nev(4))), &m);
    assert_eq!(pc.report().negative_eigenvalues.len(), 9);
    solve(pc, &b);
}

// Delivers no eigenpair at all.
struct Stalled;

impl Eigensolver for Stalled {
    fn solve(&self, _: &EigenProblem<'_>, nev: usize, _: Which) -> Result<EigenPairs, KError> {
        Ok(EigenPairs::empty(nev))
    }
}

#[test]
fn stalled_eigensolver_keeps_a_usable_preconditioner() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (m, b) = system(12, 3, 1.0);
    let pc = PcBnn::new(&m, Arc::new(UniverseComm::Serial), &DdOptions::default().with_verbose(true), &Stalled).unwrap();
    let report = pc.report();
    assert_eq!(report.coarse_dim, report.subdomains.iter().map(|r| r.minimal).sum::<usize>());
    assert!(report.subdomains.iter().all(|r| r.converged == 0 && r.requested > 0));

    let mut rng = StdRng::seed_from_u64(17);
    let n = b.len();
    let project = |x: Vec<f64>| {
        let mut x = x;
        pc.coarse().project(&mut x).unwrap();
        x
    };
    let x = project((0..n).map(|_| rng.gen_range(-1.0..1.0)).collect());
    let y = project((0..n).map(|_| rng.gen_range(-1.0..1.0)).collect());
    let mx = pc.apply(&x).unwrap();
    let my = pc.apply(&y).unwrap();
    let (xmy, ymx) = (dot(&x, &my), dot(&y, &mx));
    assert!((xmy - ymx).abs() <= 1e-10 * (xmy.abs() + ymx.abs()).max(1e-300));
    assert!(dot(&x, &mx) > 0.0);
    assert!(dot(&y, &my) > 0.0);

    solve(Arc::new(pc), &b);
}

#[test]
fn multipreconditioner_outputs_sum_to_the_preconditioner() {
    let (m, _) = system(12, 3, 10.0);
    let pc = PcBnn::new(&m, Arc::new(UniverseComm::Serial), &DdOptions::default().with_nev(4), &DenseEigensolver::new())
        .unwrap();
    let mut rng = StdRng::seed_from_u64(23);
    let mut x: Vec<f64> = (0..m.n_global()).map(|_| rng.gen_range(-1.0..1.0)).collect();
    pc.coarse().project(&mut x).unwrap();

    let y = pc.apply(&x).unwrap();
    let ys = pc.apply_multi(&x).unwrap();
    assert_eq!(ys.len(), 9);
    let mut sum = vec![0.0; x.len()];
    for yi in &ys {
        for (s, v) in sum.iter_mut().zip(yi) {
            *s += v;
        }
    }
    let diff: Vec<f64> = sum.iter().zip(&y).map(|(s, v)| s - v).collect();
    assert!(dot(&diff, &diff).sqrt() <= 1e-10 * dot(&y, &y).sqrt());
}

#[test]
fn multipreconditioner_outputs_are_projected_without_coarse_projection() {
    let (m, _) = system(12, 3, 1.0);
    let opts = DdOptions::default().with_nev(4).with_coarse_projection(false);
    let pc = PcBnn::new(&m, Arc::new(UniverseComm::Serial), &opts, &DenseEigensolver::new()).unwrap();
    let mut rng = StdRng::seed_from_u64(29);
    let x: Vec<f64> = (0..m.n_global()).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let a = pc.matrix();
    for y in pc.apply_multi(&x).unwrap() {
        let ay = a.apply_to(&y);
        let scale = dot(&ay, &ay).sqrt().max(1.0);
        for z in pc.coarse().basis() {
            assert!(dot(z, &ay).abs() <= 1e-9 * scale * dot(z, z).sqrt());
        }
    }
}
