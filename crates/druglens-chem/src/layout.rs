//! Distance-driven coordinate generation shared by 2D depiction and 3D
//! embedding.
//!
//! Both start from a matrix of target distances between atoms of one
//! fragment, seed coordinates with classical MDS and refine them by
//! stress majorization. The 2D targets model a zig-zag chain with
//! regular polygons for rings.

use std::collections::VecDeque;

use nalgebra::{DMatrix, Matrix2, Point, Point2, Rotation2, SVector, SymmetricEigen, Vector2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::molecule::Molecule;
use crate::rings::RingInfo;

/// Gap between packed fragments, in bond lengths.
const FRAGMENT_GAP: f64 = 1.5;
const CONVERGENCE: f64 = 1e-5;

/// Parameters for the seeded embedding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmbedOptions {
    pub seed: u64,
    pub iterations: usize,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            seed: 0xF00D,
            iterations: 300,
        }
    }
}

/// Symmetric target distances and weights between the atoms of one fragment.
#[derive(Debug, Clone)]
pub(crate) struct Targets {
    pub dist: DMatrix<f64>,
    pub weight: DMatrix<f64>,
}

impl Targets {
    pub fn new(n: usize) -> Self {
        Self {
            dist: DMatrix::zeros(n, n),
            weight: DMatrix::zeros(n, n),
        }
    }

    pub fn len(&self) -> usize {
        self.dist.nrows()
    }

    pub fn set(&mut self, i: usize, j: usize, dist: f64, weight: f64) {
        self.dist[(i, j)] = dist;
        self.dist[(j, i)] = dist;
        self.weight[(i, j)] = weight;
        self.weight[(j, i)] = weight;
    }
}

/// Graph distances within one fragment, indexed by position in `atoms`.
pub(crate) fn topological_distances(mol: &Molecule, atoms: &[usize]) -> Vec<Vec<usize>> {
    let mut local = vec![usize::MAX; mol.atom_count()];
    for (i, &a) in atoms.iter().enumerate() {
        local[a] = i;
    }
    atoms
        .iter()
        .map(|&start| {
            let mut dist = vec![usize::MAX; atoms.len()];
            dist[local[start]] = 0;
            let mut queue = VecDeque::from([start]);
            while let Some(atom) = queue.pop_front() {
                let d = dist[local[atom]];
                for &(n, _) in mol.neighbors(atom) {
                    if dist[local[n]] == usize::MAX {
                        dist[local[n]] = d + 1;
                        queue.push_back(n);
                    }
                }
            }
            dist
        })
        .collect()
}

/// Chord of a regular polygon with unit edges between vertices `s` apart.
pub(crate) fn polygon_chord(size: usize, separation: usize) -> f64 {
    let n = size as f64;
    (std::f64::consts::PI * separation as f64 / n).sin() / (std::f64::consts::PI / n).sin()
}

/// Classical MDS: the top `D` eigenpairs of the double-centred squared
/// distance matrix. Dimensions with no positive eigenvalue collapse to 0.
pub(crate) fn classical_mds<const D: usize>(targets: &Targets) -> Vec<Point<f64, D>> {
    let n = targets.len();
    let squared = targets.dist.map(|d| -0.5 * d * d);
    // Symmetric, so row and column means coincide.
    let means = squared.column_mean();
    let total = means.mean();
    let centred = DMatrix::from_fn(n, n, |i, j| squared[(i, j)] - means[i] - means[j] + total);

    let eigen = SymmetricEigen::new(centred);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    (0..n)
        .map(|i| {
            Point::from(SVector::<f64, D>::from_fn(|dim, _| {
                order.get(dim).map_or(0.0, |&k| {
                    eigen.eigenvectors[(i, k)] * eigen.eigenvalues[k].max(0.0).sqrt()
                })
            }))
        })
        .collect()
}

/// Add uniform noise of the given amplitude to every coordinate.
pub(crate) fn jitter<const D: usize>(coords: &mut [Point<f64, D>], amplitude: f64, rng: &mut StdRng) {
    for p in coords.iter_mut() {
        for x in p.coords.iter_mut() {
            *x += rng.gen_range(-amplitude..amplitude);
        }
    }
}

/// Localised stress majorization (one point at a time).
pub(crate) fn majorize<const D: usize>(coords: &mut [Point<f64, D>], targets: &Targets, iterations: usize) {
    let n = targets.len();
    for _ in 0..iterations {
        let mut max_shift: f64 = 0.0;
        for i in 0..n {
            let mut acc = SVector::<f64, D>::zeros();
            let mut weight_sum = 0.0;
            for j in 0..n {
                let w = targets.weight[(i, j)];
                if i == j || w == 0.0 {
                    continue;
                }
                let delta = coords[i] - coords[j];
                let len = delta.norm();
                let pull = if len > 1e-9 {
                    delta * (targets.dist[(i, j)] / len)
                } else {
                    SVector::zeros()
                };
                acc += (coords[j].coords + pull) * w;
                weight_sum += w;
            }
            if weight_sum == 0.0 {
                continue;
            }
            let next = Point::from(acc / weight_sum);
            max_shift = max_shift.max((next - coords[i]).amax());
            coords[i] = next;
        }
        if max_shift < CONVERGENCE {
            break;
        }
    }
}

/// Centre points at the origin and rotate the major principal axis onto x.
fn align_principal_axis(points: &mut [Point2<f64>]) {
    let n = points.len() as f64;
    let centroid = points.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / n;
    let mut covariance = Matrix2::zeros();
    for p in points.iter_mut() {
        p.coords -= centroid;
        covariance += p.coords * p.coords.transpose();
    }

    let eigen = SymmetricEigen::new(covariance);
    let major = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] { 0 } else { 1 };
    let axis: Vector2<f64> = eigen.eigenvectors.column(major).into_owned();
    let rotation = Rotation2::rotation_between(&axis, &Vector2::x());
    for p in points.iter_mut() {
        *p = rotation * *p;
    }
}

/// Target distance for a 2D zig-zag chain of `k` unit bonds.
fn zigzag_distance(k: usize) -> f64 {
    let along = 0.866 * k as f64;
    let across = if k % 2 == 1 { 0.25 } else { 0.0 };
    (along * along + across).sqrt()
}

fn fragment_2d(mol: &Molecule, rings: &RingInfo, atoms: &[usize], opts: &EmbedOptions, rng: &mut StdRng) -> Vec<Point2<f64>> {
    match atoms.len() {
        0 => return Vec::new(),
        1 => return vec![Point2::origin()],
        2 => return vec![Point2::new(-0.5, 0.0), Point2::new(0.5, 0.0)],
        _ => {}
    }

    let topo = topological_distances(mol, atoms);
    let mut targets = Targets::new(atoms.len());
    for i in 0..atoms.len() {
        for j in (i + 1)..atoms.len() {
            let k = topo[i][j];
            let d = match rings.shared_ring(atoms[i], atoms[j]) {
                Some((size, separation)) => polygon_chord(size, separation),
                None => zigzag_distance(k),
            };
            targets.set(i, j, d, 1.0 / (d * d));
        }
    }

    let mut coords = classical_mds::<2>(&targets);
    jitter(&mut coords, 0.05, rng);
    majorize(&mut coords, &targets, opts.iterations);
    align_principal_axis(&mut coords);
    coords
}

/// 2D coordinates in bond-length units, fragments packed left to right.
pub fn compute_2d(mol: &Molecule, rings: &RingInfo, opts: &EmbedOptions) -> Vec<Point2<f64>> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut coords = vec![Point2::origin(); mol.atom_count()];
    let mut cursor = 0.0;

    for atoms in mol.fragments() {
        let local = fragment_2d(mol, rings, &atoms, opts, &mut rng);
        let min_x = local.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = local.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        for (&atom, p) in atoms.iter().zip(&local) {
            coords[atom] = Point2::new(p.x - min_x + cursor, p.y);
        }
        cursor += max_x - min_x + FRAGMENT_GAP;
    }
    coords
}
