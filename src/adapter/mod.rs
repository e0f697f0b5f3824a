//! Adapters - concrete stores and serializers behind the ports

pub mod serializer;
pub mod store;

pub use serializer::*;
pub use store::*;
