/// MPI-based parallel communication module.
///
/// This module provides an implementation of the `Comm` trait on top of MPI for
/// distributed-memory runs with one subdomain per rank. The reductions are the
/// synchronization points of the exchange service: every rank must reach the same
/// call before any rank proceeds.
///
/// # Example
/// ```no_run
/// #[cfg(feature = "mpi")]
/// {
///     use geneo_dd::parallel::{Comm, MpiComm};
///     let comm = MpiComm::new().expect("MPI with multiple-thread support");
///     println!("Rank: {} / {}", comm.rank(), comm.size());
///     comm.barrier();
/// }
/// ```

#[cfg(feature = "mpi")]
use mpi::traits::*;
#[cfg(feature = "mpi")]
use mpi::topology::SimpleCommunicator;
#[cfg(feature = "mpi")]
use mpi::environment::Universe;
#[cfg(feature = "mpi")]
use mpi::Threading;
#[cfg(feature = "mpi")]
use crate::error::KError;

/// MPI communicator wrapper for distributed parallelism.
///
/// Holds the MPI universe (finalized on drop), the world communicator, the rank of the
/// current process, and the total number of processes.
#[cfg(feature = "mpi")]
pub struct MpiComm {
    _universe: Universe,
    /// The MPI world communicator (all processes in the job).
    pub world: SimpleCommunicator,
    /// The rank (ID) of this process within the communicator.
    pub rank: usize,
    /// The total number of processes in the communicator.
    pub size: usize,
}

#[cfg(feature = "mpi")]
impl MpiComm {
    /// Initializes MPI with `MPI_THREAD_MULTIPLE` and constructs a new `MpiComm` instance.
    ///
    /// Subdomain setup may reach the communicator from the rayon pool, so any lower thread
    /// support level is rejected with [`KError::CommError`], as is a second initialization.
    pub fn new() -> Result<Self, KError> {
        let (universe, provided) = mpi::initialize_with_threading(Threading::Multiple)
            .ok_or_else(|| KError::CommError("MPI is already initialized".into()))?;
        if provided != Threading::Multiple {
            return Err(KError::CommError(format!(
                "MPI provides thread support {provided:?}, {:?} is required",
                Threading::Multiple
            )));
        }
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Ok(MpiComm { _universe: universe, world, rank, size })
    }
}

// MPI was initialized with MPI_THREAD_MULTIPLE, so collectives may be issued from any thread.
#[cfg(feature = "mpi")]
unsafe impl Send for MpiComm {}
#[cfg(feature = "mpi")]
unsafe impl Sync for MpiComm {}

#[cfg(feature = "mpi")]
impl super::Comm for MpiComm {
    fn rank(&self) -> usize { self.rank }
    fn size(&self) -> usize { self.size }
    fn barrier(&self) { self.world.barrier(); }

    fn all_reduce(&self, x: f64) -> f64 {
        use mpi::collective::SystemOperation;
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, &SystemOperation::sum());
        y
    }

    fn all_reduce_slice(&self, buf: &mut [f64]) {
        use mpi::collective::SystemOperation;
        let send = buf.to_vec();
        self.world.all_reduce_into(&send[..], buf, &SystemOperation::sum());
    }

    fn all_reduce_max(&self, x: f64) -> f64 {
        use mpi::collective::SystemOperation;
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, &SystemOperation::max());
        y
    }
}

#[cfg(all(test, feature = "mpi"))]
mod tests {
    use super::*;
    use crate::parallel::Comm;

    #[test]
    fn initialization_requires_multiple_thread_support() {
        match MpiComm::new() {
            Ok(comm) => {
                assert!(comm.rank() < comm.size());
                assert_eq!(comm.all_reduce_max(comm.rank() as f64), (comm.size() - 1) as f64);
            }
            Err(e) => assert!(matches!(e, KError::CommError(_))),
        }
    }
}
