//! Trait for structured results whose human-readable fields may be rewritten
//! into another language. Implementations expose only display text — scores,
//! identifiers and ordering stay untouched by any localisation pass.

pub trait Localisable {
    /// Mutable references to every translatable field, in a stable order.
    fn localisable_fields(&mut self) -> Vec<&mut String>;
}
