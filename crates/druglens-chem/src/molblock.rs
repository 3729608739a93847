//! MDL V2000 MolBlock writer.

use std::fmt::Write;

use nalgebra::Point3;

use crate::error::{ChemError, Result};
use crate::molecule::Molecule;

/// The counts line has three columns per field.
pub const MAX_ATOMS: usize = 999;
/// Property lines carry at most eight entries.
const ENTRIES_PER_LINE: usize = 8;

/// Serialise a molecule with 3D coordinates.
///
/// Charges and isotopes go into `M  CHG` / `M  ISO` property lines;
/// the atom block keeps zeros in those columns.
pub fn write_mol_block(mol: &Molecule, coords: &[Point3<f64>]) -> Result<String> {
    if mol.atom_count() > MAX_ATOMS || mol.bond_count() > MAX_ATOMS {
        return Err(ChemError::TooLarge { atoms: mol.atom_count() });
    }
    if coords.len() != mol.atom_count() {
        return Err(ChemError::Render(format!(
            "{} coordinates for {} atoms",
            coords.len(),
            mol.atom_count()
        )));
    }

    let mut out = String::new();
    out.push('\n');
    out.push_str("  druglens          3D\n");
    out.push('\n');
    let _ = writeln!(
        out,
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
        mol.atom_count(),
        mol.bond_count()
    );

    for (atom, p) in mol.atoms().iter().zip(coords) {
        let (x, y, z) = (p.x, p.y, p.z);
        let _ = writeln!(
            out,
            "{x:>10.4}{y:>10.4}{z:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
            atom.element.symbol()
        );
    }
    for bond in mol.bonds() {
        let _ = writeln!(
            out,
            "{:>3}{:>3}{:>3}  0",
            bond.begin + 1,
            bond.end + 1,
            bond.order.mdl_code()
        );
    }

    let charges: Vec<(usize, i32)> = mol
        .atoms()
        .iter()
        .enumerate()
        .filter(|(_, a)| a.charge != 0)
        .map(|(i, a)| (i + 1, i32::from(a.charge)))
        .collect();
    write_property(&mut out, "CHG", &charges);

    let isotopes: Vec<(usize, i32)> = mol
        .atoms()
        .iter()
        .enumerate()
        .filter_map(|(i, a)| a.isotope.map(|iso| (i + 1, i32::from(iso))))
        .collect();
    write_property(&mut out, "ISO", &isotopes);

    out.push_str("M  END\n");
    Ok(out)
}

fn write_property(out: &mut String, tag: &str, entries: &[(usize, i32)]) {
    for chunk in entries.chunks(ENTRIES_PER_LINE) {
        let _ = write!(out, "M  {tag}{:>3}", chunk.len());
        for (atom, value) in chunk {
            let _ = write!(out, "{atom:>4}{value:>4}");
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::molecule::{Atom, BondOrder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_formaldehyde_block() {
        let mut mol = Molecule::new();
        mol.add_atom(Atom::new(Element::C));
        mol.add_atom(Atom::new(Element::O));
        mol.add_bond(0, 1, BondOrder::Double);
        let block = write_mol_block(&mol, &[Point3::new(0.0, 0.0, 0.0), Point3::new(1.2, -0.5, 0.25)]).unwrap();
        let expected = "\n  druglens          3D\n\n  2  1  0  0  0  0  0  0  0  0999 V2000\n    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0\n    1.2000   -0.5000    0.2500 O   0  0  0  0  0  0  0  0  0  0  0  0\n  1  2  2  0\nM  END\n";
        assert_eq!(block, expected);
    }

    #[test]
    fn test_charge_and_isotope_lines() {
        let mut mol = Molecule::new();
        let mut n = Atom::new(Element::N);
        n.charge = 1;
        let mut o = Atom::new(Element::O);
        o.charge = -1;
        let mut c = Atom::new(Element::C);
        c.isotope = Some(13);
        mol.add_atom(n);
        mol.add_atom(o);
        mol.add_atom(c);
        mol.add_bond(0, 1, BondOrder::Single);
        mol.add_bond(0, 2, BondOrder::Single);
        let block = write_mol_block(&mol, &[Point3::origin(); 3]).unwrap();
        assert!(block.contains("M  CHG  2   1   1   2  -1\n"));
        assert!(block.contains("M  ISO  1   3  13\n"));
        assert!(block.ends_with("M  END\n"));
    }

    #[test]
    fn test_rejects_oversized_molecule() {
        let mut mol = Molecule::new();
        for _ in 0..=MAX_ATOMS {
            mol.add_atom(Atom::new(Element::C));
        }
        let coords = vec![Point3::origin(); mol.atom_count()];
        assert_eq!(
            write_mol_block(&mol, &coords),
            Err(ChemError::TooLarge { atoms: 1000 })
        );
    }
}
