//! Ports - the seams between the journal engine and its collaborators

pub mod journal;
pub mod serializer;
pub mod store;

pub use journal::*;
pub use serializer::*;
pub use store::*;
