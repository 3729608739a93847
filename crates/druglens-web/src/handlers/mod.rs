//! HTTP handlers for all web routes.

pub mod health;
pub mod index;
pub mod predict;
pub mod visualize;
