//! Scaling of the local Neumann matrices and the partition of unity it induces.
//!
//! The local solver operator is `K_s M_s K_s` with `K_s` diagonal:
//! - multiplicity scaling: `K_s = diag(μ_s)`, `μ_s(i)` the number of subdomains sharing dof `i`,
//! - k-scaling: `K_s = diag(A_s) / diag(M_s)`, the share of the assembled diagonal carried by the
//!   subdomain. Entries with a zero Neumann diagonal fall back to the multiplicity.
//!
//! Its inverse is `D_s M_s⁺ D_s` with `D_s = K_s⁻¹`, and the `D_s` sum to one over the subdomains
//! sharing a dof.

use crate::matrix::DenseOps;
use faer::Mat;

/// Diagonal of `K_s`.
pub fn scaling_factors(ms: &Mat<f64>, as_: &Mat<f64>, multiplicity: &[f64], kscaling: bool) -> Vec<f64> {
    if !kscaling {
        return multiplicity.to_vec();
    }
    let (ad, md) = (as_.diagonal_vec(), ms.diagonal_vec());
    multiplicity
        .iter()
        .zip(ad.iter().zip(&md))
        .map(|(&mu, (&a, &m))| {
            let k = a / m;
            if m != 0.0 && k.is_finite() && k > 0.0 { k } else { mu }
        })
        .collect()
}

/// Partition-of-unity weights `D_s = K_s⁻¹`.
pub fn partition_of_unity(scaling: &[f64]) -> Vec<f64> {
    scaling.iter().map(|k| 1.0 / k).collect()
}
