//! Error types for parsing, sanitization and rendering.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChemError>;

/// Syntax errors; positions are byte offsets into the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedCharacter { ch: char, pos: usize },

    #[error("unknown element '{symbol}' at position {pos}")]
    UnknownElement { symbol: String, pos: usize },

    #[error("bracket atom opened at position {pos} is not closed")]
    UnclosedBracket { pos: usize },

    #[error("invalid bracket atom at position {pos}: {reason}")]
    InvalidBracketAtom { pos: usize, reason: &'static str },

    #[error("')' at position {pos} has no matching '('")]
    UnmatchedBranchClose { pos: usize },

    #[error("branch opened at position {pos} is not closed")]
    UnclosedBranch { pos: usize },

    #[error("empty or misplaced branch at position {pos}")]
    InvalidBranch { pos: usize },

    #[error("ring closure {label} opened at position {pos} is not closed")]
    UnclosedRing { label: u16, pos: usize },

    #[error("ring closure {label} at position {pos} bonds an atom to itself")]
    RingToSelf { label: u16, pos: usize },

    #[error("ring closure {label} at position {pos} has conflicting bond symbols")]
    ConflictingRingBond { label: u16, pos: usize },

    #[error("duplicate bond at position {pos}")]
    DuplicateBond { pos: usize },

    #[error("bond symbol at position {pos} is not followed by an atom")]
    DanglingBond { pos: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChemError {
    #[error("SMILES parse error: {0}")]
    Smiles(#[from] SmilesError),

    #[error("explicit valence for atom #{atom} {symbol}, {valence}, is greater than permitted")]
    Valence { atom: usize, symbol: &'static str, valence: u8 },

    #[error("non-ring atom #{atom} marked aromatic")]
    NonRingAromatic { atom: usize },

    #[error("can't kekulize mol; unkekulized atoms: {atoms:?}")]
    Kekulize { atoms: Vec<usize> },

    #[error("molecule with {atoms} atoms does not fit a V2000 MolBlock")]
    TooLarge { atoms: usize },

    #[error("rendering failed: {0}")]
    Render(String),

    #[cfg(feature = "rdkit")]
    #[error("RDKit rejected the structure: {0}")]
    Toolkit(String),
}
