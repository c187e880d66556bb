//! Request payload encoding.
//!
//! The payload is computed once per batch and shared by every attempt.

use bytes::Bytes;
use prost::Message;

use crate::wire::ProfileRequest;

/// Turns a target identifier into the fixed request body of a batch.
pub trait PayloadEncoder: Send + Sync + 'static {
    fn encode(&self, target_id: u64) -> Bytes;
}

/// Encodes a [`ProfileRequest`] with the identifier in field 1 and the
/// constant flag `1` in field 3.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufIdEncoder;

impl PayloadEncoder for ProtobufIdEncoder {
    fn encode(&self, target_id: u64) -> Bytes {
        let request = ProfileRequest {
            id: target_id,
            flag: 1,
        };
        Bytes::from(request.encode_to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_id_is_single_byte_varint() {
        let payload = ProtobufIdEncoder.encode(1);
        assert_eq!(&payload[..], &[0x08, 0x01, 0x18, 0x01]);
    }

    #[test]
    fn multi_byte_varint() {
        // 300 = 0b1_0010_1100 → 0xAC 0x02
        let payload = ProtobufIdEncoder.encode(300);
        assert_eq!(&payload[..], &[0x08, 0xac, 0x02, 0x18, 0x01]);
    }

    #[test]
    fn max_id_fits() {
        let payload = ProtobufIdEncoder.encode(u64::MAX);
        // tag + 10 varint bytes + trailing field
        assert_eq!(payload.len(), 1 + 10 + 2);
        assert_eq!(payload[10], 0x01);
    }

    #[test]
    fn decodes_back_as_request() {
        let payload = ProtobufIdEncoder.encode(987_654_321);
        let request = ProfileRequest::decode(payload).unwrap();
        assert_eq!(request.id, 987_654_321);
        assert_eq!(request.flag, 1);
    }
}
