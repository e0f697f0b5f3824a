//! Journal records - what the actor runtime hands in and gets back

use serde::{Deserialize, Serialize};

/// A single persisted event as seen by the actor runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentRepr {
    /// Owning stream
    pub persistence_id: String,
    /// Position within the stream, assigned by the caller
    pub sequence_nr:    u64,
    /// Serialized domain event
    pub payload:        Vec<u8>,
    /// Tells the caller how to decode `payload`
    pub manifest:       String,
    /// Logical deletion marker, carried through untouched
    pub is_deleted:     bool
}

impl PersistentRepr {
    pub fn new(persistence_id: impl Into<String>, sequence_nr: u64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            persistence_id: persistence_id.into(),
            sequence_nr,
            payload: payload.into(),
            manifest: String::new(),
            is_deleted: false
        }
    }

    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    pub fn with_deleted(mut self, is_deleted: bool) -> Self {
        self.is_deleted = is_deleted;
        self
    }
}

/// Records of one persistence id that must be stored all-or-nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicWrite {
    pub persistence_id: String,
    pub payload:        Vec<PersistentRepr>
}

impl AtomicWrite {
    pub fn new(persistence_id: impl Into<String>, payload: Vec<PersistentRepr>) -> Self {
        Self { persistence_id: persistence_id.into(), payload }
    }

    /// Wrap a single record
    pub fn single(record: PersistentRepr) -> Self {
        Self { persistence_id: record.persistence_id.clone(), payload: vec![record] }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn lowest_sequence_nr(&self) -> Option<u64> {
        self.payload.iter().map(|r| r.sequence_nr).min()
    }

    pub fn highest_sequence_nr(&self) -> Option<u64> {
        self.payload.iter().map(|r| r.sequence_nr).max()
    }
}

/// Stored shape of a record, the unit handed to the serializer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub persistence_id: String,
    pub sequence_nr:    u64,
    pub is_deleted:     bool,
    pub payload:        Vec<u8>,
    pub manifest:       String
}

impl From<&PersistentRepr> for JournalEntry {
    fn from(repr: &PersistentRepr) -> Self {
        Self {
            persistence_id: repr.persistence_id.clone(),
            sequence_nr:    repr.sequence_nr,
            is_deleted:     repr.is_deleted,
            payload:        repr.payload.clone(),
            manifest:       repr.manifest.clone()
        }
    }
}

impl From<JournalEntry> for PersistentRepr {
    fn from(entry: JournalEntry) -> Self {
        Self {
            persistence_id: entry.persistence_id,
            sequence_nr:    entry.sequence_nr,
            payload:        entry.payload,
            manifest:       entry.manifest,
            is_deleted:     entry.is_deleted
        }
    }
}
