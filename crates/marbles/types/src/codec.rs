//! Entity codec: records to and from the ledger's byte payload.
//!
//! Records are stored as JSON objects. Field names (`docType`, `user`,
//! `check`, `userid`, `review`, ...) are fixed by records already on the
//! ledger; decoding tolerates missing fields so older payloads still load.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed {doc_type} payload: {message}")]
    Malformed {
        doc_type: &'static str,
        message: String,
    },

    #[error("failed to encode {doc_type}: {message}")]
    Encode {
        doc_type: &'static str,
        message: String,
    },
}

/// A record persisted under its own id on the ledger.
pub trait LedgerRecord: Serialize + DeserializeOwned + Default {
    /// Value of the `docType` field for this record kind.
    const DOC_TYPE: &'static str;

    fn record_id(&self) -> &str;

    fn doc_type(&self) -> &str;

    fn encode(&self) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CodecError::Encode {
            doc_type: Self::DOC_TYPE,
            message: e.to_string(),
        })
    }

    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed {
            doc_type: Self::DOC_TYPE,
            message: e.to_string(),
        })
    }

    /// Decode, yielding the zero-valued record for a malformed or absent payload.
    fn decode_lossy(bytes: Option<&[u8]>) -> Self {
        bytes
            .and_then(|bytes| Self::decode(bytes).ok())
            .unwrap_or_default()
    }

    /// Whether this decoded value is a record of this kind stored under `key`.
    fn is_stored_under(&self, key: &str) -> bool {
        self.doc_type() == Self::DOC_TYPE && self.record_id() == key
    }
}
