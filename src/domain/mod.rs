//! Journal domain: records, key layout and errors

pub mod constant;
pub mod error;
pub mod keys;
pub mod record;

pub use error::*;
pub use keys::*;
pub use record::*;
