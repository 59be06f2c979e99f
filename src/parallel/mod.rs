//! Communicators and the local/global exchange service.
//!
//! Every process holds a replicated copy of global vectors. A communicator decides which
//! subdomains the process owns (all of them in a single address space, one per rank under MPI)
//! and provides the collective reductions the [`exchange::Exchange`] service is built on.

pub trait Comm: Send + Sync {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn barrier(&self);
    /// Sum of `x` over all processes.
    fn all_reduce(&self, x: f64) -> f64;
    /// Elementwise sum of `buf` over all processes, result left in `buf` on every process.
    fn all_reduce_slice(&self, buf: &mut [f64]);
    /// Maximum of `x` over all processes.
    fn all_reduce_max(&self, x: f64) -> f64;
    /// Subdomains handled by this process, out of `n_subdomains`.
    ///
    /// A single process owns them all; with several processes there must be exactly one
    /// subdomain per rank.
    fn owned_subdomains(&self, n_subdomains: usize) -> Result<Vec<usize>, crate::error::KError> {
        if self.size() == 1 {
            Ok((0..n_subdomains).collect())
        } else if self.size() == n_subdomains {
            Ok(vec![self.rank()])
        } else {
            Err(crate::error::KError::CommError(format!(
                "{} subdomains cannot be mapped onto {} processes",
                n_subdomains,
                self.size()
            )))
        }
    }
}

#[cfg(feature="mpi")]
pub mod mpi_comm;
#[cfg(feature="mpi")]
pub use mpi_comm::MpiComm;

#[cfg(feature="rayon")]
pub mod rayon_comm;
#[cfg(feature="rayon")]
pub use rayon_comm::RayonComm;

pub mod exchange;
pub use exchange::{Exchange, InsertMode};

pub enum UniverseComm {
    #[cfg(feature="mpi")]
    Mpi(MpiComm),
    #[cfg(feature="rayon")]
    Rayon(RayonComm),
    Serial,
}

impl UniverseComm {
    /// The communicator matching the enabled features: MPI first, then rayon, then serial.
    ///
    /// Fails only when MPI cannot be initialized with multiple-thread support.
    pub fn from_features() -> Result<Self, crate::error::KError> {
        #[cfg(feature="mpi")]
        {
            return Ok(UniverseComm::Mpi(MpiComm::new()?));
        }
        #[cfg(all(feature="rayon", not(feature="mpi")))]
        {
            return Ok(UniverseComm::Rayon(RayonComm::new()));
        }
        #[allow(unreachable_code)]
        Ok(UniverseComm::Serial)
    }
}

impl Comm for UniverseComm {
    fn rank(&self) -> usize {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.rank(),
            #[cfg(feature="rayon")]
            UniverseComm::Rayon(comm) => comm.rank(),
            UniverseComm::Serial => 0,
        }
    }
    fn size(&self) -> usize {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.size(),
            #[cfg(feature="rayon")]
            UniverseComm::Rayon(comm) => comm.size(),
            UniverseComm::Serial => 1,
        }
    }
    fn barrier(&self) {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.barrier(),
            #[cfg(feature="rayon")]
            UniverseComm::Rayon(comm) => comm.barrier(),
            UniverseComm::Serial => {},
        }
    }
    fn all_reduce(&self, x: f64) -> f64 {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.all_reduce(x),
            #[cfg(feature="rayon")]
            UniverseComm::Rayon(comm) => comm.all_reduce(x),
            UniverseComm::Serial => x,
        }
    }
    fn all_reduce_slice(&self, buf: &mut [f64]) {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.all_reduce_slice(buf),
            #[cfg(feature="rayon")]
            UniverseComm::Rayon(comm) => comm.all_reduce_slice(buf),
            UniverseComm::Serial => {},
        }
    }
    fn all_reduce_max(&self, x: f64) -> f64 {
        match self {
            #[cfg(feature="mpi")]
            UniverseComm::Mpi(comm) => comm.all_reduce_max(x),
            #[cfg(feature="rayon")]
            UniverseComm::Rayon(comm) => comm.all_reduce_max(x),
            UniverseComm::Serial => x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "mpi"))]
    #[test]
    fn feature_communicator_is_a_single_process() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UniverseComm>();
        let comm = UniverseComm::from_features().unwrap();
        assert_eq!((comm.rank(), comm.size()), (0, 1));
        assert_eq!(comm.all_reduce_max(2.5), 2.5);
    }

    #[test]
    fn single_process_owns_every_subdomain() {
        let comm = UniverseComm::Serial;
        assert_eq!(comm.owned_subdomains(4).unwrap(), vec![0, 1, 2, 3]);
        let mut buf = [1.0, 2.0];
        comm.all_reduce_slice(&mut buf);
        assert_eq!(buf, [1.0, 2.0]);
        assert_eq!(comm.all_reduce_max(3.0), 3.0);
        assert_eq!(comm.all_reduce(2.5), 2.5);
        comm.barrier();
    }
}
