//! SMILES reader (OpenSMILES subset).
//!
//! Only syntax is checked here. Valences, aromaticity and hydrogens are
//! handled by [`crate::sanitize`], so a string that parses may still be
//! chemically meaningless.

use std::collections::HashMap;

use crate::element::Element;
use crate::error::SmilesError;
use crate::molecule::{Atom, BondOrder, Chirality, Molecule};

type Result<T> = std::result::Result<T, SmilesError>;

/// Parse a SMILES string into a molecular graph.
///
/// Anything after the first whitespace is treated as a title and
/// ignored. The empty string yields an empty molecule.
pub fn parse(smiles: &str) -> Result<Molecule> {
    let end = smiles
        .find(|c: char| c == ' ' || c == '\t' || c == '\n' || c == '\r')
        .unwrap_or(smiles.len());
    Parser::new(&smiles[..end]).run()
}

#[derive(Debug, Clone, Copy)]
struct RingOpening {
    atom: usize,
    bond: Option<BondOrder>,
    pos: usize,
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    mol: Molecule,
    prev: Option<usize>,
    pending: Option<(BondOrder, usize)>,
    branches: Vec<(usize, usize)>,
    rings: HashMap<u16, RingOpening>,
    /// Set right after '(' until the first atom of the branch.
    branch_start: bool,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            mol: Molecule::new(),
            prev: None,
            pending: None,
            branches: Vec::new(),
            rings: HashMap::new(),
            branch_start: false,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn unexpected(&self) -> SmilesError {
        let ch = self.src[self.pos..].chars().next().unwrap_or('\0');
        SmilesError::UnexpectedCharacter { ch, pos: self.pos }
    }

    fn run(mut self) -> Result<Molecule> {
        while let Some(c) = self.peek() {
            match c {
                b'(' => self.open_branch()?,
                b')' => self.close_branch()?,
                b'-' | b'=' | b'#' | b'$' | b':' | b'/' | b'\\' => self.bond_symbol(c)?,
                b'.' => {
                    if let Some((_, pos)) = self.pending {
                        return Err(SmilesError::DanglingBond { pos });
                    }
                    if self.branch_start {
                        return Err(SmilesError::InvalidBranch { pos: self.pos });
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'0'..=b'9' => {
                    let pos = self.pos;
                    self.pos += 1;
                    self.ring_closure(u16::from(c - b'0'), pos)?;
                }
                b'%' => {
                    let pos = self.pos;
                    match (self.peek_at(1), self.peek_at(2)) {
                        (Some(d1), Some(d2)) if d1.is_ascii_digit() && d2.is_ascii_digit() => {
                            self.pos += 3;
                            let label = u16::from(d1 - b'0') * 10 + u16::from(d2 - b'0');
                            self.ring_closure(label, pos)?;
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
                b'[' => self.bracket_atom()?,
                _ => self.organic_atom()?,
            }
        }

        if let Some((_, pos)) = self.pending {
            return Err(SmilesError::DanglingBond { pos });
        }
        if let Some(&(_, pos)) = self.branches.first() {
            return Err(SmilesError::UnclosedBranch { pos });
        }
        if let Some((label, open)) = self.rings.iter().min_by_key(|(_, open)| open.pos) {
            return Err(SmilesError::UnclosedRing { label: *label, pos: open.pos });
        }
        Ok(self.mol)
    }

    fn open_branch(&mut self) -> Result<()> {
        let pos = self.pos;
        let prev = match self.prev {
            Some(prev) if self.pending.is_none() && !self.branch_start => prev,
            _ => return Err(SmilesError::InvalidBranch { pos }),
        };
        self.branches.push((prev, pos));
        self.branch_start = true;
        self.pos += 1;
        Ok(())
    }

    fn close_branch(&mut self) -> Result<()> {
        let pos = self.pos;
        if self.branch_start {
            return Err(SmilesError::InvalidBranch { pos });
        }
        if let Some((_, bond_pos)) = self.pending {
            return Err(SmilesError::DanglingBond { pos: bond_pos });
        }
        let (atom, _) = self
            .branches
            .pop()
            .ok_or(SmilesError::UnmatchedBranchClose { pos })?;
        self.prev = Some(atom);
        self.pos += 1;
        Ok(())
    }

    fn bond_symbol(&mut self, c: u8) -> Result<()> {
        if self.prev.is_none() || self.pending.is_some() {
            return Err(self.unexpected());
        }
        let order = match c {
            b'=' => BondOrder::Double,
            b'#' => BondOrder::Triple,
            b'$' => BondOrder::Quadruple,
            b':' => BondOrder::Aromatic,
            _ => BondOrder::Single,
        };
        self.pending = Some((order, self.pos));
        self.pos += 1;
        Ok(())
    }

    fn implicit_order(&self, a: usize, b: usize) -> BondOrder {
        if self.mol.atom(a).aromatic && self.mol.atom(b).aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn ring_closure(&mut self, label: u16, pos: usize) -> Result<()> {
        let atom = match self.prev {
            Some(atom) if !self.branch_start => atom,
            _ => {
                self.pos = pos;
                return Err(self.unexpected());
            }
        };
        let bond = self.pending.take().map(|(order, _)| order);

        match self.rings.remove(&label) {
            Some(open) => {
                if open.atom == atom {
                    return Err(SmilesError::RingToSelf { label, pos });
                }
                let order = match (open.bond, bond) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmilesError::ConflictingRingBond { label, pos });
                    }
                    (Some(a), _) => a,
                    (None, Some(b)) => b,
                    (None, None) => self.implicit_order(open.atom, atom),
                };
                self.mol
                    .add_bond(open.atom, atom, order)
                    .ok_or(SmilesError::DuplicateBond { pos })?;
            }
            None => {
                self.rings.insert(label, RingOpening { atom, bond, pos });
            }
        }
        Ok(())
    }

    fn push_atom(&mut self, atom: Atom, pos: usize) -> Result<()> {
        let idx = self.mol.add_atom(atom);
        if let Some(prev) = self.prev {
            let order = match self.pending.take() {
                Some((order, _)) => order,
                None => self.implicit_order(prev, idx),
            };
            self.mol
                .add_bond(prev, idx, order)
                .ok_or(SmilesError::DuplicateBond { pos })?;
        }
        self.prev = Some(idx);
        self.branch_start = false;
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<()> {
        let pos = self.pos;
        let (element, aromatic, len) = match (self.bytes[pos], self.peek_at(1)) {
            (b'B', Some(b'r')) => (Element::BR, false, 2),
            (b'C', Some(b'l')) => (Element::CL, false, 2),
            (b'B', _) => (Element::B, false, 1),
            (b'C', _) => (Element::C, false, 1),
            (b'N', _) => (Element::N, false, 1),
            (b'O', _) => (Element::O, false, 1),
            (b'P', _) => (Element::P, false, 1),
            (b'S', _) => (Element::S, false, 1),
            (b'F', _) => (Element::F, false, 1),
            (b'I', _) => (Element::I, false, 1),
            (b'b', _) => (Element::B, true, 1),
            (b'c', _) => (Element::C, true, 1),
            (b'n', _) => (Element::N, true, 1),
            (b'o', _) => (Element::O, true, 1),
            (b'p', _) => (Element::P, true, 1),
            (b's', _) => (Element::S, true, 1),
            (b'*', _) => (Element::WILDCARD, false, 1),
            _ => return Err(self.unexpected()),
        };
        self.pos += len;
        let mut atom = Atom::new(element);
        atom.aromatic = aromatic;
        self.push_atom(atom, pos)
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        // Digits only, so parsing fails only on overflow.
        self.src[start..self.pos].parse().ok().or(Some(u32::MAX))
    }

    fn bracket_atom(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        let invalid = |reason| SmilesError::InvalidBracketAtom { pos: start, reason };

        let isotope = match self.read_number() {
            Some(n) => Some(u16::try_from(n).map_err(|_| invalid("isotope out of range"))?),
            None => None,
        };

        let (element, aromatic) = self.bracket_symbol(start)?;

        let chirality = if self.peek() == Some(b'@') {
            self.pos += 1;
            if self.peek() == Some(b'@') {
                self.pos += 1;
                Some(Chirality::Clockwise)
            } else if matches!(self.peek(), Some(b'A'..=b'Z')) && matches!(self.peek_at(1), Some(b'A'..=b'Z')) {
                self.pos += 2;
                self.read_number().ok_or(invalid("chirality class needs a number"))?;
                Some(Chirality::Other)
            } else {
                Some(Chirality::CounterClockwise)
            }
        } else {
            None
        };

        let mut explicit_h = 0u8;
        if self.peek() == Some(b'H') {
            self.pos += 1;
            let n = self.read_number().unwrap_or(1);
            explicit_h = u8::try_from(n).ok().filter(|n| *n <= 9).ok_or(invalid("hydrogen count out of range"))?;
        }

        let mut charge = 0i32;
        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            let unit = if sign == b'+' { 1 } else { -1 };
            self.pos += 1;
            match self.read_number() {
                Some(n) => charge = unit * i32::try_from(n).unwrap_or(i32::MAX),
                None => {
                    charge = unit;
                    while self.peek() == Some(sign) {
                        self.pos += 1;
                        charge += unit;
                    }
                }
            }
            if charge.abs() > 15 {
                return Err(invalid("charge out of range"));
            }
        }

        let mut atom_class = None;
        if self.peek() == Some(b':') {
            self.pos += 1;
            atom_class = Some(self.read_number().ok_or(invalid("atom class needs a number"))?);
        }

        match self.peek() {
            Some(b']') => self.pos += 1,
            None => return Err(SmilesError::UnclosedBracket { pos: start }),
            Some(_) => return Err(self.unexpected()),
        }

        let mut atom = Atom::new(element);
        atom.aromatic = aromatic;
        atom.bracket = true;
        atom.isotope = isotope;
        atom.chirality = chirality;
        atom.explicit_h = explicit_h;
        atom.charge = charge as i8;
        atom.atom_class = atom_class;
        self.push_atom(atom, start)
    }

    fn bracket_symbol(&mut self, start: usize) -> Result<(Element, bool)> {
        let first = self.peek().ok_or(SmilesError::UnclosedBracket { pos: start })?;
        let second = self.peek_at(1);
        let unknown = |symbol: String, pos| SmilesError::UnknownElement { symbol, pos };

        match first {
            b'*' => {
                self.pos += 1;
                Ok((Element::WILDCARD, false))
            }
            b'a'..=b'z' => {
                if let Some(s @ (b'e' | b's')) = second {
                    let symbol = match (first, s) {
                        (b's', b'e') => Some(34u8),
                        (b'a', b's') => Some(33),
                        (b't', b'e') => Some(52),
                        _ => None,
                    };
                    if let Some(z) = symbol.and_then(Element::from_atomic_number) {
                        self.pos += 2;
                        return Ok((z, true));
                    }
                }
                let element = match first {
                    b'b' => Element::B,
                    b'c' => Element::C,
                    b'n' => Element::N,
                    b'o' => Element::O,
                    b'p' => Element::P,
                    b's' => Element::S,
                    _ => return Err(unknown((first as char).to_string(), self.pos)),
                };
                self.pos += 1;
                Ok((element, true))
            }
            b'A'..=b'Z' => {
                if let Some(lower @ b'a'..=b'z') = second {
                    let symbol: String = [first as char, lower as char].iter().collect();
                    if let Some(element) = Element::from_symbol(&symbol) {
                        self.pos += 2;
                        return Ok((element, false));
                    }
                }
                let symbol = (first as char).to_string();
                let element = Element::from_symbol(&symbol).ok_or_else(|| unknown(symbol, self.pos))?;
                self.pos += 1;
                Ok((element, false))
            }
            _ => Err(self.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(smiles: &str) -> Molecule {
        parse(smiles).unwrap_or_else(|e| panic!("{smiles}: {e}"))
    }

    #[test]
    fn test_empty_string_is_empty_molecule() {
        let mol = ok("");
        assert!(mol.is_empty());
    }

    #[test]
    fn test_chain_with_branches() {
        // isobutanol
        let mol = ok("CC(C)CO");
        assert_eq!(mol.atom_count(), 5);
        assert_eq!(mol.bond_count(), 4);
        assert_eq!(mol.degree(1), 3);
        assert_eq!(mol.atom(4).element, Element::O);
    }

    #[test]
    fn test_two_letter_organic_atoms() {
        let mol = ok("ClCBr");
        let symbols: Vec<_> = mol.atoms().iter().map(|a| a.element.symbol()).collect();
        assert_eq!(symbols, vec!["Cl", "C", "Br"]);
    }

    #[test]
    fn test_ring_closures_and_bond_orders() {
        let mol = ok("C1=CC=CC=C1");
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bond_count(), 6);
        let doubles = mol.bonds().iter().filter(|b| b.order == BondOrder::Double).count();
        assert_eq!(doubles, 3);

        let mol = ok("C%10CC%10");
        assert_eq!(mol.bond_count(), 3);
    }

    #[test]
    fn test_aromatic_bonds_between_aromatic_atoms() {
        let mol = ok("c1ccccc1C");
        let aromatic = mol.bonds().iter().filter(|b| b.order == BondOrder::Aromatic).count();
        assert_eq!(aromatic, 6);
        assert_eq!(mol.bonds().last().unwrap().order, BondOrder::Single);
    }

    #[test]
    fn test_bracket_atoms() {
        let mol = ok("[13CH3][NH3+].[O-2]");
        let c = mol.atom(0);
        assert_eq!(c.isotope, Some(13));
        assert_eq!(c.explicit_h, 3);
        assert!(c.bracket);
        let n = mol.atom(1);
        assert_eq!(n.charge, 1);
        assert_eq!(n.explicit_h, 3);
        assert_eq!(mol.atom(2).charge, -2);
        assert_eq!(mol.bond_count(), 1);

        let mol = ok("[C@@H](F)(Cl)Br");
        assert_eq!(mol.atom(0).chirality, Some(Chirality::Clockwise));

        let mol = ok("c1cc[se]c1");
        assert_eq!(mol.atom(3).element.symbol(), "Se");
        assert!(mol.atom(3).aromatic);

        let mol = ok("[Fe++]");
        assert_eq!(mol.atom(0).charge, 2);
        let mol = ok("[CH3:7]");
        assert_eq!(mol.atom(0).atom_class, Some(7));
    }

    #[test]
    fn test_title_after_whitespace_is_ignored() {
        let mol = ok("CCO ethanol");
        assert_eq!(mol.atom_count(), 3);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(parse("C1CC"), Err(SmilesError::UnclosedRing { label: 1, .. })));
        assert!(matches!(parse("C(C"), Err(SmilesError::UnclosedBranch { .. })));
        assert!(matches!(parse("CC)"), Err(SmilesError::UnmatchedBranchClose { .. })));
        assert!(matches!(parse("C()C"), Err(SmilesError::InvalidBranch { .. })));
        assert!(matches!(parse("CC="), Err(SmilesError::DanglingBond { .. })));
        assert!(matches!(parse("[CH4"), Err(SmilesError::UnclosedBracket { .. })));
        assert!(matches!(parse("[Xx]"), Err(SmilesError::UnknownElement { .. })));
        assert!(matches!(parse("C11"), Err(SmilesError::RingToSelf { .. })));
        assert!(matches!(parse("C12CC12"), Err(SmilesError::DuplicateBond { .. })));
        assert!(matches!(parse("C=1CC#1"), Err(SmilesError::ConflictingRingBond { .. })));
        assert!(matches!(parse("=C"), Err(SmilesError::UnexpectedCharacter { ch: '=', .. })));
        assert!(matches!(parse("not a smiles"), Err(SmilesError::UnexpectedCharacter { ch: 't', .. })));
        assert!(matches!(parse("Xe"), Err(SmilesError::UnexpectedCharacter { ch: 'X', .. })));
        assert!(matches!(parse("Cé"), Err(SmilesError::UnexpectedCharacter { ch: 'é', .. })));
    }
}
