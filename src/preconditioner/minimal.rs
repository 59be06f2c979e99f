// Mandatory coarse vectors of a subdomain: the kernel detected by its local factorization, or the
// partition-of-unity weighted constant (Nicolaides vector) when the local operator is nonsingular.

use crate::core::wrappers::orthonormalize;
use crate::solver::SymmetricDirectSolver;

pub fn minimal_coarse_space(solver: &SymmetricDirectSolver, pou: &[f64]) -> Vec<Vec<f64>> {
    let kernel = solver.null_space().to_vec();
    let basis = if kernel.is_empty() { vec![pou.to_vec()] } else { kernel };
    orthonormalize(&[], basis, 1e-10)
}

/// Same fallback for a seed computed elsewhere (the sign-splitting variant).
pub fn with_fallback(seed: Vec<Vec<f64>>, pou: &[f64]) -> Vec<Vec<f64>> {
    let basis = orthonormalize(&[], seed, 1e-10);
    if basis.is_empty() {
        orthonormalize(&[], vec![pou.to_vec()], 1e-10)
    } else {
        basis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Definiteness;
    use faer::Mat;

    #[test]
    fn nonsingular_block_gets_the_weighted_constant() {
        let a = Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { -1.0 });
        let solver = SymmetricDirectSolver::factorize(&a, Definiteness::PositiveSemidefinite, 0).unwrap();
        let v = minimal_coarse_space(&solver, &[1.0, 0.5]);
        assert_eq!(v.len(), 1);
        assert!((v[0][0] - 2.0 * v[0][1]).abs() < 1e-14);
        assert_eq!(with_fallback(Vec::new(), &[1.0, 1.0]).len(), 1);
    }
}
