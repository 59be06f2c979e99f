//! Algebraic properties of the coarse projections, the partition of unity and the local solves,
//! checked on the diffusion model problem with random vectors.

use approx::assert_abs_diff_eq;
use geneo_dd::assembly::DiffusionProblem;
use geneo_dd::config::{DdOptions, SplittingOptions};
use geneo_dd::core::{dot, LinearOperator};
use geneo_dd::parallel::{Exchange, InsertMode, UniverseComm};
use geneo_dd::preconditioner::scaling::{partition_of_unity, scaling_factors};
use geneo_dd::preconditioner::{DomainDecomposition, PcBnn, PcSplitting};
use geneo_dd::solver::{DenseEigensolver, LocalSolver};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn random_vec(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn norm(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

fn sub(x: &[f64], y: &[f64]) -> Vec<f64> {
    x.iter().zip(y).map(|(a, b)| a - b).collect()
}

fn bnn(contrast: f64) -> PcBnn {
    let (m, _) = DiffusionProblem::new(12, 12, 3, 3).unwrap().with_checkerboard(contrast).assemble_system().unwrap();
    let opts = DdOptions::default().with_nev(4);
    PcBnn::new(&m, Arc::new(UniverseComm::Serial), &opts, &DenseEigensolver::new()).unwrap()
}

#[test]
fn projections_are_idempotent() {
    let pc = bnn(1.0);
    let coarse = pc.coarse();
    let mut rng = StdRng::seed_from_u64(7);
    let n = pc.matrix().nrows();
    for _ in 0..3 {
        let x = random_vec(&mut rng, n);
        let mut p1 = x.clone();
        coarse.project(&mut p1).unwrap();
        let mut p2 = p1.clone();
        coarse.project(&mut p2).unwrap();
        assert!(norm(&sub(&p1, &p2)) <= 1e-10 * norm(&x));

        let mut q1 = x.clone();
        coarse.project_transpose(&mut q1).unwrap();
        let mut q2 = q1.clone();
        coarse.project_transpose(&mut q2).unwrap();
        assert!(norm(&sub(&q1, &q2)) <= 1e-10 * norm(&x));
    }
}

#[test]
fn energy_splits_between_coarse_space_and_complement() {
    let pc = bnn(1.0);
    let a = pc.matrix();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..3 {
        let x = random_vec(&mut rng, a.nrows());
        let mut px = x.clone();
        pc.coarse().project_transpose(&mut px).unwrap();
        let cx = sub(&x, &px);
        let total = dot(&a.apply_to(&x), &x);
        let fine = dot(&a.apply_to(&px), &px);
        let coarse = dot(&a.apply_to(&cx), &cx);
        assert!(fine >= 0.0 && coarse >= 0.0);
        assert_abs_diff_eq!(fine + coarse, total, epsilon = 1e-10 * total);
    }
}

#[test]
fn projections_are_adjoint_in_the_energy_product() {
    let pc = bnn(1.0);
    let a = pc.matrix();
    let mut rng = StdRng::seed_from_u64(3);
    let x = random_vec(&mut rng, a.nrows());

    // A Π x == Πᵀ A x
    let mut px = x.clone();
    pc.coarse().project_transpose(&mut px).unwrap();
    let lhs = a.apply_to(&px);
    let mut rhs = a.apply_to(&x);
    pc.coarse().project(&mut rhs).unwrap();
    assert!(norm(&sub(&lhs, &rhs)) <= 1e-10 * norm(&a.apply_to(&x)));

    // Πᵀ A Π x has no component in the coarse space
    let mut y = lhs;
    pc.coarse().project(&mut y).unwrap();
    for z in pc.coarse().basis() {
        assert_abs_diff_eq!(dot(z, &y), 0.0, epsilon = 1e-10 * norm(&y).max(1.0));
    }
}

#[test]
fn partition_of_unity_sums_to_one() {
    let problem = DiffusionProblem::new(12, 12, 3, 3).unwrap().with_checkerboard(1e4);
    let (m, _) = problem.assemble_system().unwrap();
    let a = m.assemble().unwrap();
    let ex = Exchange::new(m.n_global(), &m.index_sets(), Arc::new(UniverseComm::Serial)).unwrap();
    let (mult, mult_max) = ex.multiplicity().unwrap();
    assert_eq!(mult_max, 4.0);
    for kscaling in [false, true] {
        let pou: Vec<Vec<f64>> = ex
            .owned()
            .iter()
            .enumerate()
            .map(|(pos, &s)| {
                let ms = &m.block(s).mat;
                let as_ = a.submatrix(ex.dofs(pos));
                partition_of_unity(&scaling_factors(ms, &as_, &mult[pos], kscaling))
            })
            .collect();
        let mut sum = vec![0.0; m.n_global()];
        ex.forward(&pou, &mut sum, InsertMode::Add).unwrap();
        for s in sum {
            assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
        }
    }
    for mu in &mult {
        for (m, w) in mu.iter().zip(partition_of_unity(mu)) {
            assert_abs_diff_eq!(m * w, 1.0, epsilon = 1e-15);
        }
    }
}

fn check_round_trip(op: &dyn LinearOperator, solve: impl Fn(&[f64]) -> Vec<f64>, rng: &mut StdRng) {
    let x = random_vec(rng, op.nrows());
    let tx = op.apply_to(&x);
    let back = op.apply_to(&solve(&tx));
    assert!(norm(&sub(&back, &tx)) <= 1e-8 * norm(&tx));
}

#[test]
fn local_solves_invert_the_local_operators() {
    let mut rng = StdRng::seed_from_u64(5);
    let pc = bnn(100.0);
    for pos in 0..pc.exchange().owned().len() {
        let solver = pc.local_solver(pos);
        check_round_trip(pc.local_operator(pos), |b| solver.solve(b).unwrap(), &mut rng);
    }

    let (m, _) = DiffusionProblem::new(8, 8, 2, 2).unwrap().assemble_system().unwrap();
    let opts = SplittingOptions::new(DdOptions::default().with_nev(4));
    let pc = PcSplitting::new(&m, Arc::new(UniverseComm::Serial), &opts, &DenseEigensolver::new()).unwrap();
    for pos in 0..pc.exchange().owned().len() {
        let solver = pc.local_solver(pos);
        check_round_trip(pc.local_operator(pos), |b| solver.solve(b).unwrap(), &mut rng);
    }
}

#[test]
fn sign_split_blocks_are_consistent() {
    let (m, _) = DiffusionProblem::new(8, 8, 2, 2).unwrap().with_checkerboard(10.0).assemble_system().unwrap();
    let opts = SplittingOptions::new(DdOptions::default().with_geneo(false));
    let pc = PcSplitting::new(&m, Arc::new(UniverseComm::Serial), &opts, &DenseEigensolver::new()).unwrap();
    assert_eq!(pc.report().negative_eigenvalues.len(), 4);
    let mut rng = StdRng::seed_from_u64(13);
    for pos in 0..pc.exchange().owned().len() {
        let block = pc.split_block(pos);
        for _ in 0..5 {
            let x = random_vec(&mut rng, block.bs.nrows());
            let bx = dot(&block.bs.apply_to(&x), &x);
            let px = dot(&block.aposs.apply_to(&x), &x);
            let nx = dot(&block.anegs.apply_to(&x), &x);
            let scale = px.abs() + nx.abs() + bx.abs();
            assert!(px >= -1e-10 * scale);
            assert!(nx >= -1e-10 * scale);
            assert_abs_diff_eq!(bx, px - nx, epsilon = 1e-10 * scale);
        }
    }

    // Apos = A + Aneg
    let x = random_vec(&mut rng, pc.matrix().nrows());
    let ax = pc.matrix().apply_to(&x);
    let apx = pc.apos().apply_to(&x);
    assert!(dot(&apx, &x) >= dot(&ax, &x) - 1e-10 * dot(&ax, &x).abs());
}
