// rayon-based shared-memory communicator
//
// A single address space owns every subdomain, so the reductions are identities; the
// subdomain-local work (factorizations, eigensolves, local solves) runs on the rayon pool.

pub struct RayonComm;

impl RayonComm {
    pub fn new() -> Self {
        let threads = num_cpus::get();
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
        log::debug!("rayon pool with {threads} worker threads");
        RayonComm
    }
}

impl Default for RayonComm {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Comm for RayonComm {
    fn rank(&self) -> usize { 0 }
    fn size(&self) -> usize { 1 }
    fn barrier(&self) { rayon::scope(|_| {}); }
    fn all_reduce(&self, x: f64) -> f64 {
        x // No-op for shared memory
    }
    fn all_reduce_slice(&self, _buf: &mut [f64]) {}
    fn all_reduce_max(&self, x: f64) -> f64 {
        x
    }
}
