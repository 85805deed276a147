//! scholyx-translate — Batched translation of human-readable result fields.
//! See ARCHITECTURE.md §5:
//! - Backend trait with an HTTP (Cloud Translation v2) implementation
//! - Delimiter-batched `translate_batch` preserving count and order
//! - Structured-result localisation that never touches scores or ordering

pub mod backend;
pub mod translator;

pub use backend::{GoogleTranslateClient, TranslationBackend};
pub use translator::Translator;
