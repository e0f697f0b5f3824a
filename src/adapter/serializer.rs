//! JSON serializer for journal entries
//!
//! Entries are wrapped in a versioned envelope so that a future layout change
//! is detected on read instead of being misinterpreted.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{error::JournalError, record::JournalEntry},
    port::serializer::Serializer
};

const ENVELOPE_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    v:     u32,
    #[serde(flatten)]
    entry: &'a JournalEntry
}

#[derive(Deserialize)]
struct VersionProbe {
    v: u32
}

/// Default serializer, encodes entries as JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for JsonSerializer {
    fn identifier(&self) -> &str {
        "json-v1"
    }

    fn to_binary(&self, entry: &JournalEntry) -> Result<Vec<u8>, JournalError> {
        serde_json::to_vec(&EnvelopeRef { v: ENVELOPE_VERSION, entry })
            .map_err(|e| JournalError::Encoding(format!("{} (persistence_id={})", e, entry.persistence_id)))
    }

    fn from_binary(&self, bytes: &[u8]) -> Result<JournalEntry, JournalError> {
        let probe: VersionProbe = serde_json::from_slice(bytes).map_err(|e| JournalError::Decoding(e.to_string()))?;
        if probe.v != ENVELOPE_VERSION {
            return Err(JournalError::Decoding(format!(
                "unsupported entry version {} (expected {})",
                probe.v, ENVELOPE_VERSION
            )));
        }

        serde_json::from_slice(bytes).map_err(|e| JournalError::Decoding(e.to_string()))
    }
}
