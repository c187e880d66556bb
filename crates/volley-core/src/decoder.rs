//! Decoding of the first captured response payload.

use prost::Message;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::wire::{AccountInfo, ProfileEnvelope};

/// Fields extracted from a successful upstream response.
///
/// Absent fields decode to zero or the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub popularity: u64,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub level: u32,
}

impl From<AccountInfo> for ProfileRecord {
    fn from(account: AccountInfo) -> Self {
        Self {
            id: account.uid,
            display_name: account.nickname,
            popularity: account.likes,
            region: account.region,
            level: account.level,
        }
    }
}

/// Turns raw response bytes into a [`ProfileRecord`].
pub trait ResponseDecoder: Send + Sync + 'static {
    fn decode(&self, payload: &[u8]) -> Result<ProfileRecord, DecodeError>;
}

/// Decodes a protobuf [`ProfileEnvelope`]. Unset scalar fields come back as
/// zero or the empty string; a missing account message is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufProfileDecoder;

impl ResponseDecoder for ProtobufProfileDecoder {
    fn decode(&self, payload: &[u8]) -> Result<ProfileRecord, DecodeError> {
        if payload.is_empty() {
            return Err(DecodeError::Empty);
        }
        let envelope =
            ProfileEnvelope::decode(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        envelope
            .account
            .map(ProfileRecord::from)
            .ok_or_else(|| DecodeError::Malformed("missing account info".to_string()))
    }
}

/// Decodes a JSON object body. Unknown fields are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProfileDecoder;

impl ResponseDecoder for JsonProfileDecoder {
    fn decode(&self, payload: &[u8]) -> Result<ProfileRecord, DecodeError> {
        if payload.is_empty() {
            return Err(DecodeError::Empty);
        }
        serde_json::from_slice(payload).map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}
