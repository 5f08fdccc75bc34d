//! Append-only journal writer.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use pairgate_core::PairProvisionedEvent;
use serde::Serialize;

use crate::errors::JournalError;
use crate::frame::{FrameHeader, FrameKind, JournalHeader, FRAME_HEADER_SIZE, HEADER_SIZE};

/// Options for [`JournalWriter::open`].
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// `fsync` after every append.
    pub sync: bool,
    /// Create the file when missing.
    pub create: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: false,
            create: true,
        }
    }
}

/// Storage a [`JournalWriter`] appends to.
///
/// Besides byte access the writer needs to know the size, cut the file back
/// after a failed append, and force data to disk.
pub trait JournalFile: Read + Write + Seek {
    /// Current size in bytes.
    fn size(&self) -> io::Result<u64>;
    /// Truncates or extends to `len` bytes.
    fn set_len(&self, len: u64) -> io::Result<()>;
    /// Flushes file data to durable storage.
    fn sync_data(&self) -> io::Result<()>;
}

impl JournalFile for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn set_len(&self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn sync_data(&self) -> io::Result<()> {
        File::sync_data(self)
    }
}

/// Appends frames to a journal file.
///
/// A new or empty file gets a header first; an existing file must already
/// carry a valid one. A trailing frame cut short by an earlier crash is
/// dropped on open, and an append that fails partway is cut back before the
/// error is returned, so the file only ever grows by whole frames.
pub struct JournalWriter<F = File> {
    file: F,
    sync: bool,
    // Length covered by complete frames.
    end: u64,
    // A failed append could not be cut back yet.
    dirty: bool,
}

impl JournalWriter<File> {
    /// Opens `path` for appending.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, JournalError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(options.create)
            .open(path)?;
        Self::from_file(file, options)
    }
}

impl<F: JournalFile> JournalWriter<F> {
    /// Prepares `file` for appending; `options.create` is not consulted.
    pub fn from_file(mut file: F, options: WriteOptions) -> Result<Self, JournalError> {
        let len = file.size()?;
        let end = if len == 0 {
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&JournalHeader::encode())?;
            HEADER_SIZE as u64
        } else if len < HEADER_SIZE as u64 {
            return Err(JournalError::ShortFile(len));
        } else {
            let mut header = [0u8; HEADER_SIZE];
            file.seek(SeekFrom::Start(0))?;
            file.read_exact(&mut header)?;
            JournalHeader::decode(&header)?;

            let end = complete_frames_end(&mut file, len)?;
            if end < len {
                tracing::warn!(offset = end, dropped = len - end, "discarding torn trailing frame");
                file.set_len(end)?;
            }
            file.seek(SeekFrom::Start(end))?;
            end
        };

        let mut writer = Self {
            file,
            sync: options.sync,
            end,
            dirty: false,
        };
        writer.flush()?;
        Ok(writer)
    }

    /// Appends a provisioning event.
    pub fn append_event(&mut self, event: &PairProvisionedEvent) -> Result<(), JournalError> {
        self.append_json(event)
    }

    /// Appends any serializable value as an event frame.
    pub fn append_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), JournalError> {
        let payload = serde_json::to_vec(value)?;
        self.append_raw(FrameKind::EventJson, &payload)
    }

    /// Appends one frame with an arbitrary kind.
    ///
    /// On error the file is left as it was before the call.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), JournalError> {
        let header = FrameHeader::new(kind, payload.len())?;
        if self.dirty {
            self.cut_back()?;
        }
        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        frame.extend_from_slice(&header.encode());
        frame.extend_from_slice(payload);

        let written = self
            .file
            .write_all(&frame)
            .map_err(JournalError::from)
            .and_then(|()| self.flush());
        match written {
            Ok(()) => {
                self.end += frame.len() as u64;
                Ok(())
            }
            Err(err) => {
                if let Err(cut) = self.cut_back() {
                    tracing::error!(offset = self.end, error = %cut, "failed to discard partial frame");
                }
                Err(err)
            }
        }
    }

    /// Byte length of the complete frames written so far, header included.
    pub fn len(&self) -> u64 {
        self.end
    }

    /// True when no frame follows the header.
    pub fn is_empty(&self) -> bool {
        self.end == HEADER_SIZE as u64
    }

    /// Flushes and closes the file.
    pub fn finish(mut self) -> Result<(), JournalError> {
        self.flush()
    }

    fn flush(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    fn cut_back(&mut self) -> Result<(), JournalError> {
        self.dirty = true;
        self.file.set_len(self.end)?;
        self.file.seek(SeekFrom::Start(self.end))?;
        self.dirty = false;
        Ok(())
    }
}

// Walks frame headers from just past the file header and returns the offset
// where the last complete frame ends.
fn complete_frames_end<F: Read + Seek>(file: &mut F, len: u64) -> Result<u64, JournalError> {
    let mut offset = HEADER_SIZE as u64;
    let mut header = [0u8; FRAME_HEADER_SIZE];
    while len - offset >= FRAME_HEADER_SIZE as u64 {
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut header)?;
        let frame = FrameHeader::decode(&header, offset)?;
        let next = offset + FRAME_HEADER_SIZE as u64 + u64::from(frame.len);
        if next > len {
            break;
        }
        offset = next;
    }
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // In-memory file whose sync can be made to fail.
    struct MemFile {
        inner: Cursor<Vec<u8>>,
        fail_sync: bool,
    }

    impl Read for MemFile {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Write for MemFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for MemFile {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl JournalFile for MemFile {
        fn size(&self) -> io::Result<u64> {
            Ok(self.inner.get_ref().len() as u64)
        }

        fn set_len(&self, _len: u64) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "set_len needs &mut"))
        }

        fn sync_data(&self) -> io::Result<()> {
            if self.fail_sync {
                Err(io::Error::other("sync failed"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn frames_end_stops_before_torn_frame() {
        let mut bytes = JournalHeader::encode().to_vec();
        bytes.extend_from_slice(&FrameHeader::new(FrameKind::EventJson, 2).unwrap().encode());
        bytes.extend_from_slice(b"{}");
        let complete = bytes.len() as u64;
        bytes.extend_from_slice(&FrameHeader::new(FrameKind::EventJson, 500).unwrap().encode());
        bytes.extend_from_slice(b"partial");

        let len = bytes.len() as u64;
        let mut cursor = Cursor::new(bytes);
        assert_eq!(complete_frames_end(&mut cursor, len).unwrap(), complete);
        assert_eq!(complete_frames_end(&mut cursor, complete).unwrap(), complete);
        assert_eq!(complete_frames_end(&mut cursor, complete + 3).unwrap(), complete);
    }

    #[test]
    fn new_writer_is_empty() {
        let file = MemFile {
            inner: Cursor::new(Vec::new()),
            fail_sync: false,
        };
        let writer = JournalWriter::from_file(file, WriteOptions::default()).unwrap();
        assert!(writer.is_empty());
        assert_eq!(writer.len(), HEADER_SIZE as u64);
    }

    #[test]
    fn failed_cut_back_is_retried_before_next_append() {
        let file = MemFile {
            inner: Cursor::new(Vec::new()),
            fail_sync: false,
        };
        let mut writer = JournalWriter::from_file(
            file,
            WriteOptions {
                sync: true,
                create: true,
            },
        )
        .unwrap();
        writer.file.fail_sync = true;
        assert!(writer.append_json(&serde_json::json!({ "n": 0 })).is_err());
        assert!(writer.dirty);
        assert_eq!(writer.len(), HEADER_SIZE as u64);

        // The stand-in cannot truncate, so the writer refuses to append past the torn bytes.
        writer.file.fail_sync = false;
        assert!(matches!(
            writer.append_json(&serde_json::json!({ "n": 1 })),
            Err(JournalError::Io(_))
        ));
    }
}
