//! # Ordered Journal
//!
//! An append-only event journal for event-sourced actors, built on an ordered
//! key-value store.
//!
//! Every persistence id owns one stream of records ordered by sequence number,
//! plus a cursor holding the highest sequence number ever written. This crate
//! provides:
//! - Batched writes spanning many persistence ids, one atomic transaction per id
//! - Bounded, ordered replay for recovery
//! - Constant-time highest-sequence-number lookups
//! - Front truncation that leaves the cursor in place
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use journal::{
//!     AtomicWrite, JournalSettings, KvJournal, PersistentRepr, adapter::JsonSerializer, port::Journal
//! };
//!
//! # async fn run() -> Result<(), journal::JournalError> {
//! let journal = KvJournal::connect(&JournalSettings::default(), Arc::new(JsonSerializer::new()))?;
//!
//! let write = AtomicWrite::single(PersistentRepr::new("order-1", 1, b"created".to_vec()));
//! for outcome in journal.write_messages(vec![write]).await {
//!     outcome?;
//! }
//!
//! journal
//!     .replay_messages("order-1", 1, u64::MAX, u64::MAX, &mut |record: PersistentRepr| {
//!         println!("{} -> {} bytes", record.sequence_nr, record.payload.len())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod adapter;
pub mod config;
pub mod domain;
pub mod journal;
pub mod port;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use actor::{JournalRef, RecoveredMessages};
pub use config::{JournalSettings, load_settings};
pub use domain::{AtomicWrite, JournalError, KeyLayout, PersistentRepr};
pub use journal::KvJournal;
