//! Sequential journal reader.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use pairgate_core::PairProvisionedEvent;
use serde_json::Value;

use crate::errors::JournalError;
use crate::frame::{FrameHeader, FrameKind, JournalHeader, FRAME_HEADER_SIZE, HEADER_SIZE};

/// How a reader treats a frame cut short by the end of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// A truncated frame is an error.
    #[default]
    Strict,
    /// A truncated frame ends the journal.
    Permissive,
}

/// Reads frames front to back.
///
/// # Example
///
/// ```rust,no_run
/// use pairgate_journal::{JournalReader, ReadMode};
///
/// let mut reader = JournalReader::open("pairs.pgj", ReadMode::Strict)?;
/// while let Some(event) = reader.read_event()? {
///     println!("{} -> {}", event.token, event.curve);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JournalReader {
    input: BufReader<File>,
    mode: ReadMode,
    position: u64,
}

impl JournalReader {
    /// Opens `path` and validates its header.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, JournalError> {
        let mut input = BufReader::new(File::open(path)?);
        let mut header = [0u8; HEADER_SIZE];
        input.read_exact(&mut header).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                JournalError::InvalidHeader("file shorter than header".to_string())
            }
            _ => e.into(),
        })?;
        JournalHeader::decode(&header)?;
        Ok(Self {
            input,
            mode,
            position: HEADER_SIZE as u64,
        })
    }

    /// Byte offset of the next frame.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read mode in effect.
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Next frame of any kind, or `None` at end of journal.
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        if self.input.fill_buf()?.is_empty() {
            return Ok(None);
        }
        let start = self.position;

        let mut header_bytes = [0u8; FRAME_HEADER_SIZE];
        if !self.fill(&mut header_bytes, start)? {
            return Ok(None);
        }
        let header = FrameHeader::decode(&header_bytes, start)?;

        let mut payload = vec![0u8; header.len as usize];
        if !self.fill(&mut payload, start)? {
            return Ok(None);
        }
        self.position = start + FRAME_HEADER_SIZE as u64 + u64::from(header.len);
        Ok(Some((header.kind, payload)))
    }

    /// Next event payload as raw JSON, skipping unknown frame kinds.
    pub fn read_value(&mut self) -> Result<Option<Value>, JournalError> {
        while let Some((kind, payload)) = self.read_frame()? {
            match kind {
                FrameKind::EventJson => {
                    let text = std::str::from_utf8(&payload)?;
                    return Ok(Some(serde_json::from_str(text)?));
                }
                FrameKind::Unknown(byte) => {
                    tracing::debug!(kind = byte, offset = self.position, "skipping unknown frame");
                }
            }
        }
        Ok(None)
    }

    /// Next provisioning event, skipping unknown frame kinds.
    pub fn read_event(&mut self) -> Result<Option<PairProvisionedEvent>, JournalError> {
        match self.read_value()? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    // Ok(false) means the file ended inside the frame and the mode allows it.
    fn fill(&mut self, buf: &mut [u8], frame_start: u64) -> Result<bool, JournalError> {
        match self.input.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => match self.mode {
                ReadMode::Permissive => {
                    tracing::warn!(offset = frame_start, "truncated frame treated as end of journal");
                    Ok(false)
                }
                ReadMode::Strict => Err(JournalError::TruncatedFrame {
                    offset: frame_start,
                }),
            },
            Err(e) => Err(e.into()),
        }
    }
}
