//! On-disk layout of a `.pgj` journal.
//!
//! ```text
//! header  : magic "PGJ1" | version u16 LE | flags u16 LE (0) | 8 reserved zero bytes
//! frame   : kind u8 | 3 reserved zero bytes | payload length u32 LE | payload
//! ```

use crate::errors::JournalError;

/// Journal file magic.
pub const MAGIC: [u8; 4] = *b"PGJ1";

/// Supported format version.
pub const VERSION: u16 = 0x0001;

/// Size of the file header.
pub const HEADER_SIZE: usize = 16;

/// Size of a record frame header.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Largest payload a frame may carry: 16 MiB.
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

const KIND_EVENT_JSON: u8 = 0x01;

/// The 16-byte file header. Only one valid value exists for version 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JournalHeader;

impl JournalHeader {
    /// Encoded header bytes.
    pub fn encode() -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..4].copy_from_slice(&MAGIC);
        bytes[4..6].copy_from_slice(&VERSION.to_le_bytes());
        bytes
    }

    /// Checks that `bytes` begin with a valid header.
    pub fn decode(bytes: &[u8]) -> Result<Self, JournalError> {
        let Some(bytes) = bytes.get(..HEADER_SIZE) else {
            return Err(JournalError::InvalidHeader(format!(
                "need {HEADER_SIZE} bytes, got {}",
                bytes.len()
            )));
        };
        if bytes[..4] != MAGIC {
            return Err(JournalError::InvalidHeader(format!(
                "bad magic {:02x?}",
                &bytes[..4]
            )));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(JournalError::InvalidHeader(format!(
                "unsupported version 0x{version:04x}"
            )));
        }
        let flags = u16::from_le_bytes([bytes[6], bytes[7]]);
        if flags != 0 {
            return Err(JournalError::InvalidHeader(format!(
                "unknown flags 0x{flags:04x}"
            )));
        }
        if bytes[8..].iter().any(|b| *b != 0) {
            return Err(JournalError::InvalidHeader(
                "reserved bytes are not zero".to_string(),
            ));
        }
        Ok(JournalHeader)
    }
}

/// Payload type of a record frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// One provisioning event as UTF-8 JSON.
    EventJson,
    /// A kind this reader does not know; skipped on read.
    Unknown(u8),
}

impl From<u8> for FrameKind {
    fn from(byte: u8) -> Self {
        match byte {
            KIND_EVENT_JSON => FrameKind::EventJson,
            other => FrameKind::Unknown(other),
        }
    }
}

impl From<FrameKind> for u8 {
    fn from(kind: FrameKind) -> Self {
        match kind {
            FrameKind::EventJson => KIND_EVENT_JSON,
            FrameKind::Unknown(byte) => byte,
        }
    }
}

/// Header preceding every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload type.
    pub kind: FrameKind,
    /// Payload length in bytes.
    pub len: u32,
}

impl FrameHeader {
    /// Header for a payload of `len` bytes.
    pub fn new(kind: FrameKind, len: usize) -> Result<Self, JournalError> {
        match u32::try_from(len) {
            Ok(len) if len <= MAX_PAYLOAD_SIZE => Ok(Self { kind, len }),
            _ => Err(JournalError::PayloadTooLarge {
                size: len as u64,
                max: MAX_PAYLOAD_SIZE,
            }),
        }
    }

    /// Encoded frame header bytes.
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut bytes = [0u8; FRAME_HEADER_SIZE];
        bytes[0] = self.kind.into();
        bytes[4..].copy_from_slice(&self.len.to_le_bytes());
        bytes
    }

    /// Decodes a frame header read at `offset`.
    pub fn decode(bytes: &[u8; FRAME_HEADER_SIZE], offset: u64) -> Result<Self, JournalError> {
        let invalid = |reason: String| JournalError::InvalidFrame { offset, reason };
        if bytes[1..4] != [0, 0, 0] {
            return Err(invalid("reserved bytes are not zero".to_string()));
        }
        let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if len > MAX_PAYLOAD_SIZE {
            return Err(invalid(format!(
                "payload length {len} exceeds {MAX_PAYLOAD_SIZE}"
            )));
        }
        Ok(Self {
            kind: FrameKind::from(bytes[0]),
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let bytes = JournalHeader::encode();
        assert_eq!(&bytes[..4], b"PGJ1");
        assert_eq!(&bytes[4..6], &[0x01, 0x00]);
        assert!(bytes[6..].iter().all(|b| *b == 0));
        assert!(JournalHeader::decode(&bytes).is_ok());
    }

    #[test]
    fn header_rejects_foreign_files() {
        let mut bytes = JournalHeader::encode();
        bytes[..4].copy_from_slice(b"NRJ1");
        assert!(JournalHeader::decode(&bytes).is_err());

        let mut bytes = JournalHeader::encode();
        bytes[4] = 0x02;
        let err = JournalHeader::decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("version"));

        let mut bytes = JournalHeader::encode();
        bytes[6] = 0x01;
        assert!(JournalHeader::decode(&bytes).is_err());

        let mut bytes = JournalHeader::encode();
        bytes[15] = 0x01;
        assert!(JournalHeader::decode(&bytes).is_err());

        assert!(JournalHeader::decode(&bytes[..10]).is_err());
    }

    #[test]
    fn frame_header_layout() {
        let header = FrameHeader::new(FrameKind::EventJson, 300).unwrap();
        let bytes = header.encode();
        assert_eq!(bytes, [0x01, 0, 0, 0, 0x2c, 0x01, 0, 0]);
        assert_eq!(FrameHeader::decode(&bytes, 16).unwrap(), header);
    }

    #[test]
    fn frame_limits() {
        assert!(FrameHeader::new(FrameKind::EventJson, MAX_PAYLOAD_SIZE as usize).is_ok());
        assert!(matches!(
            FrameHeader::new(FrameKind::EventJson, MAX_PAYLOAD_SIZE as usize + 1),
            Err(JournalError::PayloadTooLarge { .. })
        ));

        let mut bytes = FrameHeader::new(FrameKind::EventJson, 1).unwrap().encode();
        bytes[2] = 0xff;
        match FrameHeader::decode(&bytes, 40).unwrap_err() {
            JournalError::InvalidFrame { offset, .. } => assert_eq!(offset, 40),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_kinds_survive_decoding() {
        let bytes = FrameHeader::new(FrameKind::Unknown(0x7f), 0).unwrap().encode();
        assert_eq!(
            FrameHeader::decode(&bytes, 0).unwrap().kind,
            FrameKind::Unknown(0x7f)
        );
    }
}
