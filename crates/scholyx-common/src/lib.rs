//! scholyx-common — Shared types, errors, and traits used across all Scholyx crates.

pub mod error;
pub mod localise;
pub mod recover;
pub mod sandbox;

pub use error::{Result, ScholyxError};
pub use localise::Localisable;
