//! Periodic table data needed for parsing, valence and geometry.

use serde::{Deserialize, Serialize};
use std::fmt;

const SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// A chemical element identified by atomic number; 0 is the `*` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Element(u8);

impl Element {
    pub const WILDCARD: Element = Element(0);
    pub const H: Element = Element(1);
    pub const B: Element = Element(5);
    pub const C: Element = Element(6);
    pub const N: Element = Element(7);
    pub const O: Element = Element(8);
    pub const F: Element = Element(9);
    pub const P: Element = Element(15);
    pub const S: Element = Element(16);
    pub const CL: Element = Element(17);
    pub const BR: Element = Element(35);
    pub const I: Element = Element(53);

    pub fn from_atomic_number(z: u8) -> Option<Self> {
        (z as usize <= SYMBOLS.len()).then_some(Element(z))
    }

    /// Look up a symbol with exact capitalisation (`Cl`, not `CL`).
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        if symbol == "*" {
            return Some(Element::WILDCARD);
        }
        SYMBOLS
            .iter()
            .position(|s| *s == symbol)
            .map(|i| Element(i as u8 + 1))
    }

    pub fn atomic_number(&self) -> u8 {
        self.0
    }

    pub fn symbol(&self) -> &'static str {
        match self.0 {
            0 => "*",
            z => SYMBOLS[z as usize - 1],
        }
    }

    /// Allowed valences in increasing order; empty means unrestricted.
    pub fn default_valences(&self) -> &'static [u8] {
        match self.0 {
            1 => &[1],
            2 | 10 | 18 | 36 | 86 => &[0],
            3 | 11 | 19 | 37 | 55 | 87 => &[1],
            4 | 12 | 20 | 38 | 56 | 88 => &[2],
            5 | 13 => &[3],
            6 | 14 => &[4],
            7 => &[3],
            8 => &[2],
            9 | 17 | 35 => &[1],
            15 => &[3, 5, 7],
            16 | 34 | 52 | 84 => &[2, 4, 6],
            32 => &[4],
            33 | 51 | 83 => &[3, 5, 7],
            50 | 82 => &[2, 4],
            53 => &[1, 3, 5],
            54 => &[0, 2, 4, 6],
            85 => &[1, 3, 5, 7],
            _ => &[],
        }
    }

    /// Valences after the isoelectronic shift for a formal charge
    /// (N+ behaves like C, O- like F, ...).
    pub fn charged_valences(&self, charge: i8) -> &'static [u8] {
        let own = self.default_valences();
        if charge == 0 || own.is_empty() {
            return own;
        }
        let shifted = i16::from(self.0) - i16::from(charge);
        match u8::try_from(shifted).ok().and_then(Element::from_atomic_number) {
            Some(e) if e.0 > 0 && !e.default_valences().is_empty() => e.default_valences(),
            _ => own,
        }
    }

    /// Single-bond covalent radius in ångström.
    pub fn covalent_radius(&self) -> f64 {
        match self.0 {
            1 => 0.31,
            5 => 0.84,
            6 => 0.76,
            7 => 0.71,
            8 => 0.66,
            9 => 0.57,
            3 => 1.28,
            11 => 1.66,
            12 => 1.41,
            13 => 1.21,
            14 => 1.11,
            15 => 1.07,
            16 => 1.05,
            17 => 1.02,
            19 => 2.03,
            20 => 1.76,
            26 => 1.32,
            29 => 1.32,
            30 => 1.22,
            32 => 1.20,
            33 => 1.19,
            34 => 1.20,
            35 => 1.20,
            50 => 1.39,
            52 => 1.38,
            53 => 1.39,
            _ => 1.50,
        }
    }

    /// Depiction colour as RGB.
    pub fn color(&self) -> [u8; 3] {
        match self.0 {
            1 => [96, 96, 96],
            5 => [255, 128, 128],
            6 | 0 => [0, 0, 0],
            7 => [51, 51, 255],
            8 => [255, 13, 13],
            9 => [51, 204, 51],
            15 => [255, 128, 0],
            16 => [204, 153, 0],
            17 => [0, 204, 0],
            35 => [153, 77, 26],
            53 => [160, 31, 240],
            34 => [204, 122, 0],
            14 => [128, 102, 77],
            _ => [110, 110, 110],
        }
    }

    /// Atoms that SMILES may write without brackets.
    pub fn is_organic_subset(&self) -> bool {
        matches!(self.0, 5 | 6 | 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
    }

    /// Elements that may appear lower-case (aromatic) in SMILES.
    pub fn can_be_aromatic(&self) -> bool {
        matches!(self.0, 0 | 5 | 6 | 7 | 8 | 15 | 16 | 33 | 34 | 52)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_round_trip() {
        for z in 1..=118u8 {
            let e = Element::from_atomic_number(z).unwrap();
            assert_eq!(Element::from_symbol(e.symbol()), Some(e));
        }
        assert_eq!(Element::from_symbol("Cl"), Some(Element::CL));
        assert_eq!(Element::from_symbol("CL"), None);
        assert_eq!(Element::from_symbol("Xx"), None);
    }

    #[test]
    fn test_charged_valences_are_isoelectronic() {
        assert_eq!(Element::N.charged_valences(1), &[4]);
        assert_eq!(Element::O.charged_valences(-1), &[1]);
        assert_eq!(Element::C.charged_valences(-1), &[3]);
        assert_eq!(Element::O.charged_valences(1), &[3]);
        // Unrestricted metals stay unrestricted.
        let fe = Element::from_symbol("Fe").unwrap();
        assert!(fe.charged_valences(2).is_empty());
    }
}
