//! Model problem: Q1 finite elements for `-div(kappa grad u) = 1` on the unit square.
//!
//! The structured `nx × ny` element mesh is cut into `sx × sy` box subdomains. Nodes on the west
//! boundary carry a homogeneous Dirichlet condition and are eliminated, so subdomains that do not
//! touch it are floating (their Neumann matrix has the constants as kernel). The coefficient is
//! constant per element.

use crate::error::KError;
use crate::matrix::unassembled::{LocalBlock, UnassembledMatrix};
use faer::Mat;

// Six times the Q1 stiffness of the unit-coefficient Laplacian on a square element, nodes
// counter-clockwise from the lower-left corner; the 1/6 goes with the coefficient. Independent of
// the element size in 2D.
const Q1_STIFFNESS: [[f64; 4]; 4] = [
    [4.0, -1.0, -2.0, -1.0],
    [-1.0, 4.0, -1.0, -2.0],
    [-2.0, -1.0, 4.0, -1.0],
    [-1.0, -2.0, -1.0, 4.0],
];

pub struct DiffusionProblem {
    nx: usize,
    ny: usize,
    sx: usize,
    sy: usize,
    kappa: Vec<f64>,
}

impl DiffusionProblem {
    /// Homogeneous problem on `nx × ny` elements split into `sx × sy` subdomains.
    pub fn new(nx: usize, ny: usize, sx: usize, sy: usize) -> Result<Self, KError> {
        if sx == 0 || sy == 0 || nx % sx != 0 || ny % sy != 0 {
            return Err(KError::Unsupported("mesh size must be a multiple of the subdomain grid"));
        }
        Ok(Self { nx, ny, sx, sy, kappa: vec![1.0; nx * ny] })
    }

    /// Sets the coefficient of element `(ex, ey)` to `f(ex, ey)`.
    pub fn with_coefficient(mut self, f: impl Fn(usize, usize) -> f64) -> Self {
        for ey in 0..self.ny {
            for ex in 0..self.nx {
                self.kappa[ey * self.nx + ex] = f(ex, ey);
            }
        }
        self
    }

    /// Coefficient `contrast` on every other subdomain (checkerboard), 1 elsewhere.
    pub fn with_checkerboard(self, contrast: f64) -> Self {
        let (hx, hy) = (self.nx / self.sx, self.ny / self.sy);
        self.with_coefficient(|ex, ey| if (ex / hx + ey / hy) % 2 == 1 { contrast } else { 1.0 })
    }

    pub fn n_subdomains(&self) -> usize {
        self.sx * self.sy
    }

    /// Number of free (non-Dirichlet) nodes.
    pub fn n_dofs(&self) -> usize {
        self.nx * (self.ny + 1)
    }

    // Free node (i, j) with i >= 1; the west column i = 0 is eliminated.
    fn dof(&self, i: usize, j: usize) -> Option<usize> {
        if i == 0 { None } else { Some(j * self.nx + i - 1) }
    }

    /// Subdomain owning element `(ex, ey)`.
    pub fn subdomain_of_element(&self, ex: usize, ey: usize) -> usize {
        let (hx, hy) = (self.nx / self.sx, self.ny / self.sy);
        (ey / hy) * self.sx + ex / hx
    }

    /// Neumann matrices of every subdomain and the global load vector.
    pub fn assemble_system(&self) -> Result<(UnassembledMatrix, Vec<f64>), KError> {
        let (hx, hy) = (self.nx / self.sx, self.ny / self.sy);
        let h2 = 1.0 / (self.nx as f64 * self.ny as f64);
        let mut load = vec![0.0; self.n_dofs()];
        let mut blocks = Vec::with_capacity(self.n_subdomains());
        for q in 0..self.sy {
            for p in 0..self.sx {
                // local numbering: free nodes of the box, row by row
                let mut dofs = Vec::new();
                let mut local_of = std::collections::HashMap::new();
                for j in q * hy..=(q + 1) * hy {
                    for i in p * hx..=(p + 1) * hx {
                        if let Some(g) = self.dof(i, j) {
                            local_of.insert(g, dofs.len());
                            dofs.push(g);
                        }
                    }
                }
                let mut mat = Mat::<f64>::zeros(dofs.len(), dofs.len());
                for ey in q * hy..(q + 1) * hy {
                    for ex in p * hx..(p + 1) * hx {
                        let k = self.kappa[ey * self.nx + ex] / 6.0;
                        let corners = [(ex, ey), (ex + 1, ey), (ex + 1, ey + 1), (ex, ey + 1)];
                        let local: Vec<Option<usize>> = corners
                            .iter()
                            .map(|&(i, j)| self.dof(i, j).map(|g| local_of[&g]))
                            .collect();
                        for (a, la) in local.iter().enumerate() {
                            let Some(la) = *la else { continue };
                            for (b, lb) in local.iter().enumerate() {
                                if let Some(lb) = *lb {
                                    mat[(la, lb)] += k * Q1_STIFFNESS[a][b];
                                }
                            }
                            load[dofs[la]] += 0.25 * h2;
                        }
                    }
                }
                blocks.push(LocalBlock { dofs, mat });
            }
        }
        let matrix = UnassembledMatrix::new(self.n_dofs(), blocks)?;
        Ok((matrix, load))
    }
}
