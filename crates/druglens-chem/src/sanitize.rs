//! Chemistry checks applied after parsing.
//!
//! Strict sanitization turns the raw graph into something the layout and
//! conformer code can trust: aromatic systems are kekulized, implicit
//! hydrogens are filled in and every atom is checked against its
//! allowed valences.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ChemError, Result};
use crate::molecule::{BondOrder, Molecule};
use crate::rings::RingInfo;

/// Upper bound on matching steps before kekulization gives up.
const MAX_KEKULIZE_STEPS: usize = 200_000;

/// How much checking [`crate::StructureRenderer::parse`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sanitize {
    /// Syntax only.
    None,
    /// Kekulization, implicit hydrogens and valence checks.
    #[default]
    Strict,
}

/// Run strict sanitization in place and return the perceived rings.
pub fn sanitize(mol: &mut Molecule) -> Result<RingInfo> {
    let rings = RingInfo::perceive(mol);

    for idx in 0..mol.bond_count() {
        if mol.bond(idx).order == BondOrder::Aromatic && !rings.bond_in_ring(idx) {
            let bond = &mut mol.bonds_mut()[idx];
            bond.order = BondOrder::Single;
            bond.aromatic = false;
        }
    }
    if let Some(atom) = (0..mol.atom_count()).find(|&i| mol.atom(i).aromatic && !rings.atom_in_ring(i)) {
        return Err(ChemError::NonRingAromatic { atom });
    }

    kekulize(mol)?;
    assign_hydrogens(mol)?;
    trace!(atoms = mol.atom_count(), rings = rings.num_rings(), "sanitized molecule");
    Ok(rings)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PiDemand {
    None,
    Required,
    Optional,
}

/// Whether an aromatic atom has to take part in a double bond.
fn pi_demand(mol: &Molecule, idx: usize) -> PiDemand {
    let atom = mol.atom(idx);
    if !atom.aromatic {
        return PiDemand::None;
    }
    let has_double = mol
        .neighbors(idx)
        .iter()
        .any(|&(_, b)| mol.bond(b).order == BondOrder::Double);
    if has_double {
        return PiDemand::None;
    }

    let valences = if atom.bracket {
        atom.element.charged_valences(atom.charge)
    } else {
        atom.element.default_valences()
    };
    if valences.is_empty() {
        return PiDemand::Optional;
    }

    let used = mol.explicit_valence(idx) + atom.explicit_h;
    match valences.iter().find(|&&v| v >= used) {
        Some(&target) if used < target => PiDemand::Required,
        _ => PiDemand::None,
    }
}

/// Replace aromatic bond orders by alternating single and double bonds.
///
/// Aromatic flags on atoms and bonds survive so depiction can still
/// tell which rings were aromatic.
fn kekulize(mol: &mut Molecule) -> Result<()> {
    if !mol.bonds().iter().any(|b| b.order == BondOrder::Aromatic) {
        return Ok(());
    }

    let demand: Vec<PiDemand> = (0..mol.atom_count()).map(|i| pi_demand(mol, i)).collect();
    let mut matched: Vec<Option<usize>> = vec![None; mol.atom_count()];
    let mut budget = MAX_KEKULIZE_STEPS;

    if !match_pi_bonds(mol, &demand, &mut matched, &mut budget) {
        let atoms = (0..mol.atom_count())
            .filter(|&i| demand[i] == PiDemand::Required)
            .collect();
        return Err(ChemError::Kekulize { atoms });
    }

    for idx in 0..mol.bond_count() {
        let bond = mol.bond(idx);
        if bond.order != BondOrder::Aromatic {
            continue;
        }
        let order = if matched[bond.begin] == Some(idx) {
            BondOrder::Double
        } else {
            BondOrder::Single
        };
        mol.bonds_mut()[idx].order = order;
    }
    Ok(())
}

/// Backtracking perfect matching over atoms that require a double bond,
/// always extending the most constrained atom first.
fn match_pi_bonds(
    mol: &Molecule,
    demand: &[PiDemand],
    matched: &mut [Option<usize>],
    budget: &mut usize,
) -> bool {
    if *budget == 0 {
        return false;
    }
    *budget -= 1;

    let mut best: Option<(usize, Vec<(usize, usize)>)> = None;
    for atom in 0..demand.len() {
        if demand[atom] != PiDemand::Required || matched[atom].is_some() {
            continue;
        }
        let options: Vec<(usize, usize)> = mol
            .neighbors(atom)
            .iter()
            .copied()
            .filter(|&(n, b)| {
                mol.bond(b).order == BondOrder::Aromatic
                    && demand[n] != PiDemand::None
                    && matched[n].is_none()
            })
            .collect();
        if options.is_empty() {
            return false;
        }
        if best.as_ref().map_or(true, |(_, o)| options.len() < o.len()) {
            best = Some((atom, options));
        }
    }

    let Some((atom, options)) = best else {
        return true;
    };
    for (neighbor, bond) in options {
        matched[atom] = Some(bond);
        matched[neighbor] = Some(bond);
        if match_pi_bonds(mol, demand, matched, budget) {
            return true;
        }
        matched[atom] = None;
        matched[neighbor] = None;
    }
    false
}

/// Fill implicit hydrogens of unbracketed atoms and check valences.
fn assign_hydrogens(mol: &mut Molecule) -> Result<()> {
    for idx in 0..mol.atom_count() {
        let bonds = mol.explicit_valence(idx);
        let atom = mol.atom(idx);
        let element = atom.element;

        if atom.bracket {
            let valence = bonds + atom.explicit_h;
            let allowed = element.charged_valences(atom.charge);
            if allowed.last().is_some_and(|&max| valence > max) {
                return Err(ChemError::Valence { atom: idx, symbol: element.symbol(), valence });
            }
            continue;
        }

        let allowed = element.default_valences();
        if allowed.is_empty() {
            continue;
        }
        match allowed.iter().find(|&&v| v >= bonds) {
            Some(&target) => mol.atoms_mut()[idx].implicit_h = target - bonds,
            None => {
                return Err(ChemError::Valence { atom: idx, symbol: element.symbol(), valence: bonds });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse;

    fn strict(smiles: &str) -> Result<Molecule> {
        let mut mol = parse(smiles)?;
        sanitize(&mut mol)?;
        Ok(mol)
    }

    fn double_bonds(mol: &Molecule) -> usize {
        mol.bonds().iter().filter(|b| b.order == BondOrder::Double).count()
    }

    #[test]
    fn test_benzene_kekulizes() {
        let mol = strict("c1ccccc1").unwrap();
        assert_eq!(double_bonds(&mol), 3);
        assert!(mol.atoms().iter().all(|a| a.implicit_h == 1 && a.aromatic));
        assert!(mol.bonds().iter().all(|b| b.aromatic));
        assert_eq!(mol.formula(), "C6H6");
    }

    #[test]
    fn test_heteroaromatics() {
        assert_eq!(strict("c1ccncc1").unwrap().formula(), "C5H5N");
        assert_eq!(strict("c1cc[nH]c1").unwrap().formula(), "C4H5N");
        assert_eq!(strict("c1ccsc1").unwrap().formula(), "C4H4S");
        assert_eq!(strict("c1ccc2ccccc2c1").unwrap().formula(), "C10H8");
        assert_eq!(strict("O=c1cccc[nH]1").unwrap().formula(), "C5H5NO");
        assert_eq!(strict("c1cc[n+](C)cc1").unwrap().formula(), "C6H8N");
    }

    #[test]
    fn test_pyrrole_without_hydrogen_fails() {
        assert!(matches!(strict("c1ccnc1"), Err(ChemError::Kekulize { .. })));
    }

    #[test]
    fn test_non_ring_aromatic_atom() {
        assert_eq!(strict("CcC"), Err(ChemError::NonRingAromatic { atom: 1 }));
    }

    #[test]
    fn test_biphenyl_link_is_single() {
        let mol = strict("c1ccccc1-c1ccccc1").unwrap();
        let link = mol.bond_between(0, 6).unwrap();
        assert_eq!(mol.bond(link).order, BondOrder::Single);
        assert!(!mol.bond(link).aromatic);
        assert_eq!(mol.formula(), "C12H10");
    }

    #[test]
    fn test_implicit_hydrogens() {
        assert_eq!(strict("CCO").unwrap().formula(), "C2H6O");
        assert_eq!(strict("CC(=O)O").unwrap().formula(), "C2H4O2");
        assert_eq!(strict("CS(=O)(=O)C").unwrap().formula(), "C2H6O2S");
        assert_eq!(strict("[NH4+]").unwrap().formula(), "H4N");
        let mol = strict("C[N+](C)(C)C").unwrap();
        assert_eq!(mol.atom(1).implicit_h, 0);
    }

    #[test]
    fn test_valence_errors() {
        assert!(matches!(
            strict("C(C)(C)(C)(C)C"),
            Err(ChemError::Valence { atom: 0, valence: 5, .. })
        ));
        assert!(matches!(strict("[OH3]"), Err(ChemError::Valence { .. })));
        assert!(matches!(strict("FF=C"), Err(ChemError::Valence { atom: 1, .. })));
    }

    #[test]
    fn test_wildcard_is_unrestricted() {
        let mol = strict("*c1ccccc1").unwrap();
        assert_eq!(mol.atom(0).implicit_h, 0);
    }
}
