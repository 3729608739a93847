//! druglens-web: HTTP front-end for the drug-likeness classifier.
//! Serves:
//!   - the prediction form (`/`)
//!   - score + label + 2D depiction for one SMILES (`/predict`)
//!   - an interactive 3D conformer viewer (`/visualize_3d`)
//!   - a health check (`/health`)

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod templates;

pub use error::ApiError;
pub use router::build_router;
pub use state::{AppContext, SharedState};
