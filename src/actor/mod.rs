//! Actor front-end for the journal
//!
//! Persistent actors talk to the journal through a Ractor actor, the same way
//! they talk to any other part of the system.

pub mod journal;
pub mod message;

pub use journal::*;
pub use message::*;
