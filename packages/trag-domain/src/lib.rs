pub mod candidate;
pub mod score;
pub mod text;
pub mod trigram;

pub use candidate::{AttributeValue, Candidate, CrossReference, ReferenceKind};
