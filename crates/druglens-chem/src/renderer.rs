//! Public entry points used by the web layer.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conformer::embed_3d;
use crate::depict::depict_png;
use crate::error::Result;
use crate::layout::{compute_2d, EmbedOptions};
use crate::molblock::write_mol_block;
use crate::molecule::Molecule;
use crate::rings::RingInfo;
use crate::sanitize::{sanitize, Sanitize};
use crate::smiles;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Width and height of the 2D image in pixels.
    pub image_size: u32,
    pub embed: EmbedOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_size: 300,
            embed: EmbedOptions::default(),
        }
    }
}

/// Turns SMILES into a base64 PNG or a 3D MolBlock.
///
/// The `Option` returning methods swallow every failure; the `try_`
/// variants report why.
#[derive(Debug, Clone, Default)]
pub struct StructureRenderer {
    options: RenderOptions,
}

impl StructureRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Parse with the requested strictness.
    pub fn parse(&self, smiles: &str, level: Sanitize) -> Result<Molecule> {
        self.parse_with_rings(smiles, level).map(|(mol, _)| mol)
    }

    fn parse_with_rings(&self, smiles: &str, level: Sanitize) -> Result<(Molecule, RingInfo)> {
        #[cfg(feature = "rdkit")]
        crate::toolkit::check_smiles(smiles, level)?;

        let mut mol = smiles::parse(smiles)?;
        let rings = match level {
            Sanitize::None => RingInfo::perceive(&mol),
            Sanitize::Strict => sanitize(&mut mol)?,
        };
        Ok((mol, rings))
    }

    /// PNG bytes of the 2D depiction.
    pub fn try_render_2d(&self, smiles: &str) -> Result<Vec<u8>> {
        let (mol, rings) = self.parse_with_rings(smiles, Sanitize::Strict)?;
        let coords = compute_2d(&mol, &rings, &self.options.embed);
        depict_png(&mol, &rings, &coords, self.options.image_size)
    }

    /// Base64-encoded PNG, or `None` if anything went wrong.
    pub fn render_2d(&self, smiles: &str) -> Option<String> {
        match self.try_render_2d(smiles) {
            Ok(png) => Some(STANDARD.encode(png)),
            Err(e) => {
                debug!(smiles, error = %e, "2D rendering failed");
                None
            }
        }
    }

    pub fn try_mol_block_3d(&self, smiles: &str) -> Result<String> {
        let (mol, _) = self.parse_with_rings(smiles, Sanitize::Strict)?;
        let conformer = embed_3d(&mol, &self.options.embed);
        write_mol_block(&conformer.molecule, &conformer.coords)
    }

    /// V2000 MolBlock of one hydrogen-complete conformer, or `None`.
    pub fn mol_block_3d(&self, smiles: &str) -> Option<String> {
        match self.try_mol_block_3d(smiles) {
            Ok(block) => Some(block),
            Err(e) => {
                debug!(smiles, error = %e, "3D embedding failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChemError;
    use base64::Engine as _;

    fn renderer() -> StructureRenderer {
        StructureRenderer::new(RenderOptions {
            image_size: 120,
            embed: EmbedOptions { seed: 7, iterations: 100 },
        })
    }

    #[test]
    fn test_strictness_levels_differ() {
        let r = renderer();
        // pentavalent carbon is syntactically fine
        assert!(r.parse("C(C)(C)(C)(C)C", Sanitize::None).is_ok());
        assert!(matches!(
            r.parse("C(C)(C)(C)(C)C", Sanitize::Strict),
            Err(ChemError::Valence { .. })
        ));
        assert!(r.parse("C1CC", Sanitize::None).is_err());
    }

    #[test]
    fn test_render_2d_returns_base64_png() {
        let image = renderer().render_2d("c1ccccc1O").unwrap();
        let png = STANDARD.decode(image).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_failures_are_silent() {
        let r = renderer();
        assert_eq!(r.render_2d("C1CC"), None);
        assert_eq!(r.render_2d("c1cccc1"), None);
        assert_eq!(r.mol_block_3d("not smiles"), None);
        assert_eq!(r.mol_block_3d("C(C)(C)(C)(C)C"), None);
    }

    #[test]
    fn test_mol_block_has_hydrogens() {
        let block = renderer().mol_block_3d("CCO").unwrap();
        let counts = block.lines().nth(3).unwrap();
        assert!(counts.starts_with("  9  8"), "{counts}");
        assert!(block.trim_end().ends_with("M  END"));
    }

    #[test]
    fn test_mol_block_is_deterministic() {
        let r = renderer();
        assert_eq!(r.mol_block_3d("CC(=O)Nc1ccc(O)cc1"), r.mol_block_3d("CC(=O)Nc1ccc(O)cc1"));
    }
}
