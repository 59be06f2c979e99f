use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geneo_dd::assembly::DiffusionProblem;
use geneo_dd::config::DdOptions;
use geneo_dd::parallel::UniverseComm;
use geneo_dd::preconditioner::{DomainDecomposition, PcBnn};
use geneo_dd::solver::DenseEigensolver;
use std::sync::Arc;

fn bench_bnn(c: &mut Criterion) {
    let (matrix, b) = DiffusionProblem::new(32, 32, 4, 4)
        .and_then(|p| p.with_checkerboard(1e4).assemble_system())
        .expect("model problem");
    let opts = DdOptions::default().with_nev(6);
    // MPI can only be initialized once per process
    let comm: Arc<UniverseComm> = Arc::new(UniverseComm::from_features().expect("communicator"));

    c.bench_function("BNN + GenEO setup", |ben| {
        ben.iter(|| PcBnn::new(black_box(&matrix), comm.clone(), &opts, &DenseEigensolver::new()).expect("setup"))
    });

    let pc = PcBnn::new(&matrix, comm.clone(), &opts, &DenseEigensolver::new()).expect("setup");
    c.bench_function("BNN + GenEO apply", |ben| {
        ben.iter(|| pc.apply(black_box(&b)).expect("apply"))
    });
    c.bench_function("BNN multipreconditioned apply", |ben| {
        ben.iter(|| pc.apply_multi(black_box(&b)).expect("apply"))
    });
}

criterion_group!(benches, bench_bnn);
criterion_main!(benches);
