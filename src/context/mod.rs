//! Context types tying the preconditioners to the Krylov solver.
//!
//! Modules:
//! - [`ksp_context`]: `KspContext`, PCG with a two-level preconditioner.
//! - [`pc_context`]: `DdVariant`, selection and construction of the preconditioner.
//!
//! # Example
//! ```rust,ignore
//! let pc = DdVariant::default().build(&matrix, comm, &DenseEigensolver::new())?;
//! let mut ksp = KspContext::new(pc).with_tol(1e-8);
//! let stats = ksp.solve(&b, &mut x)?;
//! ```

pub mod ksp_context;
pub use ksp_context::KspContext;
pub mod pc_context;
pub use pc_context::DdVariant;
