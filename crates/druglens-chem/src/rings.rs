//! Ring perception: smallest set of smallest rings.

use std::collections::{HashSet, VecDeque};

use crate::molecule::Molecule;

/// Rings of a molecule, each as atoms in cyclic order.
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    rings: Vec<Vec<usize>>,
    ring_bonds: Vec<Vec<usize>>,
    atom_rings: Vec<Vec<usize>>,
    bond_rings: Vec<Vec<usize>>,
}

impl RingInfo {
    /// Find the shortest cycle through every bond, then keep the
    /// smallest linearly independent ones (over GF(2)) up to the
    /// cyclomatic number.
    pub fn perceive(mol: &Molecule) -> Self {
        let n_atoms = mol.atom_count();
        let n_bonds = mol.bond_count();
        let mut info = RingInfo {
            rings: Vec::new(),
            ring_bonds: Vec::new(),
            atom_rings: vec![Vec::new(); n_atoms],
            bond_rings: vec![Vec::new(); n_bonds],
        };

        let cyclomatic = (n_bonds + mol.fragments().len()).saturating_sub(n_atoms);
        if cyclomatic == 0 {
            return info;
        }

        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut candidates: Vec<(Vec<usize>, Vec<usize>)> = Vec::new();
        for (idx, bond) in mol.bonds().iter().enumerate() {
            if let Some((atoms, mut bonds)) = shortest_path_avoiding(mol, bond.begin, bond.end, idx) {
                bonds.push(idx);
                let mut key = bonds.clone();
                key.sort_unstable();
                if seen.insert(key) {
                    candidates.push((atoms, bonds));
                }
            }
        }
        candidates.sort_by_key(|(atoms, _)| atoms.len());

        let words = n_bonds.div_ceil(64);
        let mut basis: Vec<Vec<u64>> = Vec::new();
        for (atoms, bonds) in candidates {
            if info.rings.len() == cyclomatic {
                break;
            }
            let mut vector = vec![0u64; words];
            for &b in &bonds {
                vector[b / 64] |= 1 << (b % 64);
            }
            if reduce(&basis, &mut vector) {
                basis.push(vector);
                basis.sort_by_key(|v| std::cmp::Reverse(leading_bit(v)));
                let ring_idx = info.rings.len();
                for &a in &atoms {
                    info.atom_rings[a].push(ring_idx);
                }
                for &b in &bonds {
                    info.bond_rings[b].push(ring_idx);
                }
                info.rings.push(atoms);
                info.ring_bonds.push(bonds);
            }
        }
        info
    }

    pub fn rings(&self) -> &[Vec<usize>] {
        &self.rings
    }

    pub fn ring_bonds(&self, ring: usize) -> &[usize] {
        &self.ring_bonds[ring]
    }

    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    pub fn atom_in_ring(&self, atom: usize) -> bool {
        !self.atom_rings[atom].is_empty()
    }

    pub fn bond_in_ring(&self, bond: usize) -> bool {
        !self.bond_rings[bond].is_empty()
    }

    /// Indices of rings containing `atom`.
    pub fn atom_rings(&self, atom: usize) -> &[usize] {
        &self.atom_rings[atom]
    }

    /// Smallest ring containing `bond`.
    pub fn smallest_ring_of_bond(&self, bond: usize) -> Option<&[usize]> {
        self.bond_rings[bond]
            .iter()
            .map(|&r| self.rings[r].as_slice())
            .min_by_key(|r| r.len())
    }

    /// Smallest ring containing both atoms, with their cyclic separation.
    pub fn shared_ring(&self, a: usize, b: usize) -> Option<(usize, usize)> {
        self.atom_rings[a]
            .iter()
            .filter(|r| self.atom_rings[b].contains(r))
            .map(|&r| {
                let ring = &self.rings[r];
                let ia = ring.iter().position(|&x| x == a).unwrap_or(0);
                let ib = ring.iter().position(|&x| x == b).unwrap_or(0);
                let d = ia.abs_diff(ib);
                (ring.len(), d.min(ring.len() - d))
            })
            .min_by_key(|(size, _)| *size)
    }
}

/// BFS from `from` to `to` without using bond `skip`.
/// Returns the atom path and the bonds along it.
fn shortest_path_avoiding(mol: &Molecule, from: usize, to: usize, skip: usize) -> Option<(Vec<usize>, Vec<usize>)> {
    let mut parent: Vec<Option<(usize, usize)>> = vec![None; mol.atom_count()];
    let mut visited = vec![false; mol.atom_count()];
    let mut queue = VecDeque::from([from]);
    visited[from] = true;

    while let Some(atom) = queue.pop_front() {
        if atom == to {
            break;
        }
        for &(n, b) in mol.neighbors(atom) {
            if b == skip || visited[n] {
                continue;
            }
            visited[n] = true;
            parent[n] = Some((atom, b));
            queue.push_back(n);
        }
    }
    if !visited[to] {
        return None;
    }

    let mut atoms = vec![to];
    let mut bonds = Vec::new();
    let mut current = to;
    while let Some((prev, bond)) = parent[current] {
        atoms.push(prev);
        bonds.push(bond);
        current = prev;
    }
    atoms.reverse();
    bonds.reverse();
    Some((atoms, bonds))
}

fn leading_bit(v: &[u64]) -> Option<usize> {
    v.iter()
        .enumerate()
        .rev()
        .find(|(_, w)| **w != 0)
        .map(|(i, w)| i * 64 + 63 - w.leading_zeros() as usize)
}

/// Eliminate `v` against a basis kept sorted by descending leading bit.
/// Returns true when something independent is left.
fn reduce(basis: &[Vec<u64>], v: &mut [u64]) -> bool {
    for row in basis {
        let Some(lead) = leading_bit(row) else { continue };
        if v[lead / 64] & (1 << (lead % 64)) != 0 {
            for (a, b) in v.iter_mut().zip(row) {
                *a ^= b;
            }
        }
    }
    v.iter().any(|w| *w != 0)
}
