//! RDKit cross-check for sanitized structures.
//!
//! Built with the `rdkit` feature, every structure read at
//! `Sanitize::Strict` must also pass RDKit's parse and sanitization.
//! RDKit's verdict decides validity; the in-crate graph is still built
//! afterwards because layout, embedding and drawing work on it.
//! Syntax-only reads stay with the in-crate parser.

use rdkit::ROMol;

use crate::error::{ChemError, Result};
use crate::sanitize::Sanitize;

/// Fail when RDKit cannot read and sanitize `smiles`.
pub fn check_smiles(smiles: &str, level: Sanitize) -> Result<()> {
    match level {
        Sanitize::None => Ok(()),
        Sanitize::Strict => ROMol::from_smiles(smiles)
            .map(|_| ())
            .map_err(|e| ChemError::Toolkit(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aromatic_rings_pass_strict() {
        for smiles in ["c1ccccc1", "c1ccncc1", "c1cc[nH]c1", "CC(=O)Oc1ccccc1C(=O)O"] {
            assert!(check_smiles(smiles, Sanitize::Strict).is_ok(), "{smiles}");
        }
    }

    #[test]
    fn test_pentavalent_carbon_needs_lenient_mode() {
        let smiles = "C(C)(C)(C)(C)C";
        assert!(check_smiles(smiles, Sanitize::None).is_ok());
        assert!(matches!(check_smiles(smiles, Sanitize::Strict), Err(ChemError::Toolkit(_))));
    }

    #[test]
    fn test_unparseable_input_fails_strict() {
        assert!(check_smiles("C1CC", Sanitize::Strict).is_err());
        assert!(check_smiles("C((C", Sanitize::Strict).is_err());
    }
}
