//! Single 3D conformer from a distance-geometry style embedding.
//!
//! Target distances come from the bonded topology: covalent radii for
//! bonds, hybridisation angles for 1-3 pairs, planar polygons for
//! aromatic and small rings and loose estimates for anything further
//! apart. The same MDS + stress majorization engine as the 2D layout
//! then places the atoms. Stereo markers are ignored.

use std::collections::VecDeque;

use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::layout::{classical_mds, jitter, majorize, polygon_chord, EmbedOptions, Targets};
use crate::molecule::{BondOrder, Molecule};
use crate::rings::RingInfo;

/// Gap between fragments along x, in ångström.
const FRAGMENT_GAP: f64 = 3.0;
/// Relative weight of pairs more than two bonds apart.
const LONG_RANGE_WEIGHT: f64 = 0.2;
const TETRAHEDRAL: f64 = 109.47;

#[derive(Debug, Clone)]
pub struct Conformer {
    /// Hydrogen-complete copy of the input molecule.
    pub molecule: Molecule,
    /// Positions in ångström, indexed like `molecule`'s atoms.
    pub coords: Vec<Point3<f64>>,
}

fn bond_length(mol: &Molecule, bond: usize) -> f64 {
    let b = mol.bond(bond);
    let base = mol.atom(b.begin).element.covalent_radius() + mol.atom(b.end).element.covalent_radius();
    let factor = if b.aromatic {
        0.915
    } else {
        match b.order {
            BondOrder::Single | BondOrder::Aromatic => 1.0,
            BondOrder::Double => 0.87,
            BondOrder::Triple => 0.78,
            BondOrder::Quadruple => 0.75,
        }
    };
    base * factor
}

/// Bond angle at `center` in degrees, from its hybridisation.
fn bond_angle(mol: &Molecule, center: usize) -> f64 {
    let mut doubles = 0;
    let mut triples = 0;
    let mut aromatic = false;
    for &(_, b) in mol.neighbors(center) {
        let bond = mol.bond(b);
        aromatic |= bond.aromatic;
        match bond.order {
            BondOrder::Double => doubles += 1,
            BondOrder::Triple | BondOrder::Quadruple => triples += 1,
            _ => {}
        }
    }
    if triples > 0 || doubles > 1 {
        180.0
    } else if doubles == 1 || aromatic {
        120.0
    } else {
        TETRAHEDRAL
    }
}

/// Rings that should be flat: aromatic ones and anything up to five atoms.
fn planar_rings(mol: &Molecule, rings: &RingInfo) -> Vec<usize> {
    (0..rings.num_rings())
        .filter(|&r| {
            rings.rings()[r].len() <= 5
                || rings.ring_bonds(r).iter().all(|&b| mol.bond(b).aromatic)
        })
        .collect()
}

/// BFS from `start` recording hop count and summed bond length along the
/// BFS tree path, indexed by position in `atoms`.
fn path_lengths(mol: &Molecule, atoms: &[usize], local: &[usize], start: usize) -> Vec<(usize, f64)> {
    let mut out = vec![(usize::MAX, 0.0); atoms.len()];
    out[local[start]] = (0, 0.0);
    let mut queue = VecDeque::from([start]);
    while let Some(atom) = queue.pop_front() {
        let (hops, length) = out[local[atom]];
        for &(n, b) in mol.neighbors(atom) {
            if out[local[n]].0 == usize::MAX {
                out[local[n]] = (hops + 1, length + bond_length(mol, b));
                queue.push_back(n);
            }
        }
    }
    out
}

fn fragment_targets(mol: &Molecule, rings: &RingInfo, atoms: &[usize]) -> Targets {
    let mut local = vec![usize::MAX; mol.atom_count()];
    for (i, &a) in atoms.iter().enumerate() {
        local[a] = i;
    }
    let mut targets = Targets::new(atoms.len());

    // Long-range estimates first; closer relations overwrite them.
    for (i, &a) in atoms.iter().enumerate() {
        for (j, (hops, length)) in path_lengths(mol, atoms, &local, a).into_iter().enumerate() {
            if j <= i || hops < 3 {
                continue;
            }
            let factor = if hops == 3 { 0.8 } else { 0.75 };
            let d = length * factor;
            targets.set(i, j, d, LONG_RANGE_WEIGHT / (d * d));
        }
    }

    for center in atoms.iter().copied() {
        let angle = bond_angle(mol, center).to_radians();
        let neighbors = mol.neighbors(center);
        for (x, &(a, ba)) in neighbors.iter().enumerate() {
            for &(b, bb) in &neighbors[x + 1..] {
                let la = bond_length(mol, ba);
                let lb = bond_length(mol, bb);
                let angle = match small_ring_angle(rings, a, center, b) {
                    Some(internal) => internal,
                    None => angle,
                };
                let d = (la * la + lb * lb - 2.0 * la * lb * angle.cos()).sqrt();
                targets.set(local[a], local[b], d, 1.0 / (d * d));
            }
        }
    }

    for r in planar_rings(mol, rings) {
        let ring = &rings.rings()[r];
        let bonds = rings.ring_bonds(r);
        let edge = bonds.iter().map(|&b| bond_length(mol, b)).sum::<f64>() / bonds.len() as f64;
        for (p, &a) in ring.iter().enumerate() {
            for (q, &b) in ring.iter().enumerate().skip(p + 2) {
                let separation = (q - p).min(ring.len() - (q - p));
                let d = edge * polygon_chord(ring.len(), separation);
                targets.set(local[a], local[b], d, 1.0 / (d * d));
            }
        }
    }

    for (idx, bond) in mol.bonds().iter().enumerate() {
        if local[bond.begin] == usize::MAX {
            continue;
        }
        let d = bond_length(mol, idx);
        targets.set(local[bond.begin], local[bond.end], d, 4.0 / (d * d));
    }
    targets
}

/// Internal angle when `a-center-b` runs along a ring of 3 to 5 atoms.
fn small_ring_angle(rings: &RingInfo, a: usize, center: usize, b: usize) -> Option<f64> {
    rings
        .atom_rings(center)
        .iter()
        .map(|&r| &rings.rings()[r])
        .filter(|ring| ring.len() <= 5 && ring.contains(&a) && ring.contains(&b))
        .map(|ring| ring.len())
        .min()
        .map(|n| std::f64::consts::PI * (n as f64 - 2.0) / n as f64)
}

/// Embed the hydrogen-complete molecule in 3D.
pub fn embed_3d(mol: &Molecule, opts: &EmbedOptions) -> Conformer {
    let molecule = mol.with_explicit_hydrogens();
    let rings = RingInfo::perceive(&molecule);
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut coords = vec![Point3::origin(); molecule.atom_count()];
    let mut cursor = 0.0;

    for atoms in molecule.fragments() {
        let local: Vec<Point3<f64>> = if atoms.len() == 1 {
            vec![Point3::origin()]
        } else {
            let targets = fragment_targets(&molecule, &rings, &atoms);
            let mut local = classical_mds::<3>(&targets);
            jitter(&mut local, 0.1, &mut rng);
            majorize(&mut local, &targets, opts.iterations);
            local
        };

        let min_x = local.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = local.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        for (&atom, p) in atoms.iter().zip(&local) {
            coords[atom] = Point3::new(p.x - min_x + cursor, p.y, p.z);
        }
        cursor += max_x - min_x + FRAGMENT_GAP;
    }

    Conformer { molecule, coords }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::sanitize;
    use crate::smiles::parse;

    fn conformer(smiles: &str) -> Conformer {
        let mut mol = parse(smiles).unwrap();
        sanitize(&mut mol).unwrap();
        embed_3d(&mol, &EmbedOptions::default())
    }

    fn dist(a: Point3<f64>, b: Point3<f64>) -> f64 {
        nalgebra::distance(&a, &b)
    }

    #[test]
    fn test_hydrogens_are_added() {
        let conf = conformer("CCO");
        assert_eq!(conf.molecule.atom_count(), 9);
        assert_eq!(conf.coords.len(), 9);
    }

    #[test]
    fn test_bond_lengths_are_chemical() {
        let conf = conformer("CC(=O)Nc1ccc(O)cc1");
        for (idx, bond) in conf.molecule.bonds().iter().enumerate() {
            let expected = bond_length(&conf.molecule, idx);
            let got = dist(conf.coords[bond.begin], conf.coords[bond.end]);
            assert!((got - expected).abs() < 0.25, "bond {idx}: {got} vs {expected}");
        }
    }

    #[test]
    fn test_atoms_do_not_collapse() {
        let conf = conformer("CC(C)Cc1ccc(cc1)C(C)C(=O)O");
        let n = conf.coords.len();
        for i in 0..n {
            for j in (i + 1)..n {
                assert!(dist(conf.coords[i], conf.coords[j]) > 0.5, "atoms {i} and {j} overlap");
            }
        }
    }

    #[test]
    fn test_embedding_is_deterministic() {
        let a = conformer("c1ccncc1CN");
        let b = conformer("c1ccncc1CN");
        assert_eq!(a.coords, b.coords);
    }

    #[test]
    fn test_benzene_ring_is_planar() {
        let conf = conformer("c1ccccc1");
        let ring: Vec<Point3<f64>> = conf.coords[..6].to_vec();
        let normal = (ring[1] - ring[0]).cross(&(ring[2] - ring[0])).normalize();
        for p in &ring[3..] {
            assert!((p - ring[0]).dot(&normal).abs() < 0.15);
        }
    }

    #[test]
    fn test_angles_follow_hybridisation() {
        assert_eq!(bond_angle(&conformer("C#N").molecule, 0), 180.0);
        assert_eq!(bond_angle(&conformer("C=O").molecule, 0), 120.0);
        assert_eq!(bond_angle(&conformer("C").molecule, 0), TETRAHEDRAL);
    }
}
