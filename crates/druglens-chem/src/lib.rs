//! DrugLens Chem - molecular structure handling for the classifier front-end.
//!
//! This crate turns SMILES strings into pictures and coordinates:
//! 1. Parsing SMILES into a molecular graph
//! 2. Sanitizing (ring perception, kekulization, hydrogens, valences)
//! 3. Computing 2D layouts and drawing PNG depictions
//! 4. Embedding a 3D conformer and writing a V2000 MolBlock

pub mod conformer;
pub mod depict;
pub mod element;
pub mod error;
pub mod font;
pub mod layout;
pub mod molblock;
pub mod molecule;
pub mod renderer;
pub mod rings;
pub mod sanitize;
pub mod smiles;
#[cfg(feature = "rdkit")]
pub mod toolkit;

pub use element::Element;
pub use error::{ChemError, Result, SmilesError};
pub use layout::EmbedOptions;
pub use molecule::{Atom, Bond, BondOrder, Molecule};
pub use renderer::{RenderOptions, StructureRenderer};
pub use sanitize::Sanitize;
