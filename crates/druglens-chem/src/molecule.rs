//! Molecular graph produced by the SMILES parser.

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Tetrahedral marker as written in the input; geometry ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chirality {
    CounterClockwise,
    Clockwise,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub element: Element,
    pub aromatic: bool,
    pub charge: i8,
    pub isotope: Option<u16>,
    /// Written inside brackets; such atoms never get implicit hydrogens.
    pub bracket: bool,
    /// Hydrogen count given in a bracket atom.
    pub explicit_h: u8,
    /// Hydrogens filled in from default valences during sanitization.
    pub implicit_h: u8,
    pub chirality: Option<Chirality>,
    pub atom_class: Option<u32>,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            aromatic: false,
            charge: 0,
            isotope: None,
            bracket: false,
            explicit_h: 0,
            implicit_h: 0,
            chirality: None,
            atom_class: None,
        }
    }

    pub fn total_h(&self) -> u8 {
        self.explicit_h + self.implicit_h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    /// Only present before kekulization.
    Aromatic,
}

impl BondOrder {
    /// Contribution to explicit valence; aromatic bonds count as single
    /// until kekulization assigns them.
    pub fn valence(&self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }

    /// MDL bond type code.
    pub fn mdl_code(&self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
            // V2000 has no quadruple bond type
            BondOrder::Quadruple => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
    /// Part of an aromatic system; kept after kekulization.
    pub aromatic: bool,
}

impl Bond {
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom { self.end } else { self.begin }
    }
}

/// Atoms, bonds and an adjacency list kept in sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// `(neighbour, bond index)` per atom.
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Add a bond; returns `None` for self-loops and duplicates.
    pub fn add_bond(&mut self, begin: usize, end: usize, order: BondOrder) -> Option<usize> {
        if begin == end || begin >= self.atoms.len() || end >= self.atoms.len() {
            return None;
        }
        if self.bond_between(begin, end).is_some() {
            return None;
        }
        let idx = self.bonds.len();
        self.bonds.push(Bond {
            begin,
            end,
            order,
            aromatic: order == BondOrder::Aromatic,
        });
        self.adjacency[begin].push((end, idx));
        self.adjacency[end].push((begin, idx));
        Some(idx)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bonds_mut(&mut self) -> &mut [Bond] {
        &mut self.bonds
    }

    pub fn bond(&self, idx: usize) -> &Bond {
        &self.bonds[idx]
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.element != Element::H).count()
    }

    /// `(neighbour, bond index)` pairs of an atom.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency
            .get(a)?
            .iter()
            .find(|(n, _)| *n == b)
            .map(|(_, bond)| *bond)
    }

    /// Sum of bond orders around an atom, hydrogens excluded.
    pub fn explicit_valence(&self, atom: usize) -> u8 {
        self.adjacency[atom]
            .iter()
            .map(|(_, b)| self.bonds[*b].order.valence())
            .sum()
    }

    /// Connected components as sorted atom index lists.
    pub fn fragments(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.atoms.len()];
        let mut fragments = Vec::new();
        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            let mut stack = vec![start];
            let mut fragment = Vec::new();
            seen[start] = true;
            while let Some(atom) = stack.pop() {
                fragment.push(atom);
                for &(n, _) in &self.adjacency[atom] {
                    if !seen[n] {
                        seen[n] = true;
                        stack.push(n);
                    }
                }
            }
            fragment.sort_unstable();
            fragments.push(fragment);
        }
        fragments
    }

    /// Copy with every implicit and bracket hydrogen turned into an atom.
    ///
    /// Heavy atoms keep their indices; hydrogens are appended.
    pub fn with_explicit_hydrogens(&self) -> Molecule {
        let mut out = self.clone();
        for idx in 0..self.atoms.len() {
            let count = self.atoms[idx].total_h();
            out.atoms[idx].explicit_h = 0;
            out.atoms[idx].implicit_h = 0;
            for _ in 0..count {
                let mut h = Atom::new(Element::H);
                h.bracket = true;
                let h_idx = out.add_atom(h);
                out.add_bond(idx, h_idx, BondOrder::Single);
            }
        }
        out
    }

    /// Hill-order molecular formula including hydrogens.
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;

        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut carbon = 0;
        let mut hydrogen = 0;
        for atom in &self.atoms {
            hydrogen += atom.total_h() as usize;
            match atom.element {
                Element::C => carbon += 1,
                Element::H => hydrogen += 1,
                e => *counts.entry(e.symbol()).or_default() += 1,
            }
        }

        let mut formula = String::new();
        let mut push = |symbol: &str, n: usize| {
            if n > 0 {
                formula.push_str(symbol);
                if n > 1 {
                    formula.push_str(&n.to_string());
                }
            }
        };
        if carbon > 0 {
            push("C", carbon);
            push("H", hydrogen);
            for (symbol, n) in counts {
                push(symbol, n);
            }
        } else {
            counts.insert("H", hydrogen);
            for (symbol, n) in counts {
                push(symbol, n);
            }
        }
        formula
    }
}
