use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tix_types::{Block, TicketId};
use tracing::{debug, warn};

/// A single persisted ledger mutation.
///
/// On-disk format of each entry:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized JournalRecord)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalRecord {
    /// A block was sealed and appended (genesis included).
    Committed(Block),
    /// A ticket inside `block_index` was scanned.
    Scanned { block_index: u64, ticket_id: TicketId },
}

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every write.
    EveryWrite,
    /// Flush to the OS and rely on its page cache.
    #[default]
    OsDefault,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Append-only journal of ledger mutations.
///
/// Records are serialized with bincode, framed with a length prefix and a
/// CRC32 checksum. On recovery the file is read front to back. A tail entry
/// whose bytes run past the end of the file is a torn write and ends
/// recovery; a complete entry that fails its CRC or does not decode is
/// corruption and fails recovery, since every record is needed to rebuild
/// the chain and its scan state.
pub struct Journal {
    path: PathBuf,
    writer: BufWriter<File>,
    offset: u64,
    sync_mode: SyncMode,
    /// Set when a failed append could not be rolled back.
    poisoned: bool,
}

impl Journal {
    /// Open (or create) the journal file at the given path.
    pub fn open(path: &Path, sync_mode: SyncMode) -> Result<Self, JournalError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            offset,
            sync_mode,
            poisoned: false,
        })
    }

    /// Append a record. Returns the byte offset of the entry.
    ///
    /// A failed write is rolled back to the end of the last complete entry.
    /// If the rollback itself fails the journal is poisoned and refuses
    /// further appends.
    pub fn append(&mut self, record: &JournalRecord) -> Result<u64, JournalError> {
        if self.poisoned {
            return Err(JournalError::Poisoned);
        }

        let payload =
            bincode::serialize(record).map_err(|e| JournalError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| JournalError::EntryTooLarge(payload.len()))?;
        let crc = crc32fast::hash(&payload);
        let entry_offset = self.offset;

        if let Err(e) = self.write_entry(length, crc, &payload) {
            warn!(offset = entry_offset, error = %e, "journal append failed; rolling back");
            if let Err(rollback) = self.rollback() {
                warn!(error = %rollback, "journal rollback failed; refusing further appends");
                self.poisoned = true;
            }
            return Err(e.into());
        }

        self.offset += HEADER_SIZE as u64 + payload.len() as u64;

        debug!(offset = entry_offset, len = payload.len(), "journal append");
        Ok(entry_offset)
    }

    fn write_entry(&mut self, length: u32, crc: u32, payload: &[u8]) -> io::Result<()> {
        self.writer.write_all(&length.to_le_bytes())?;
        self.writer.write_all(&crc.to_le_bytes())?;
        self.writer.write_all(payload)?;
        self.writer.flush()?;
        if self.sync_mode == SyncMode::EveryWrite {
            self.writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Drop whatever is still buffered and cut the file back to the end of
    /// the last complete entry.
    fn rollback(&mut self) -> io::Result<()> {
        let file = self.writer.get_ref().try_clone()?;
        let stale = std::mem::replace(&mut self.writer, BufWriter::new(file));
        let (_, _discarded) = stale.into_parts();
        self.writer.get_ref().set_len(self.offset)?;
        Ok(())
    }

    /// True once a failed append could not be rolled back.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Recover all valid records in write order.
    pub fn recover(&self) -> Result<Vec<JournalRecord>, JournalError> {
        Ok(self.scan()?.0)
    }

    /// Recover all valid records and cut off a torn tail, so that later
    /// appends follow the last complete entry.
    pub fn recover_and_repair(&mut self) -> Result<Vec<JournalRecord>, JournalError> {
        let (records, valid_end) = self.scan()?;
        if valid_end < self.offset {
            warn!(
                valid_end,
                file_len = self.offset,
                "truncating torn journal tail"
            );
            self.writer.flush()?;
            self.writer.get_ref().set_len(valid_end)?;
            self.offset = valid_end;
        }
        Ok(records)
    }

    /// Read entries front to back. Returns the decoded records and the
    /// offset just past the last complete entry. Fails on the first complete
    /// entry that is corrupt.
    fn scan(&self) -> Result<(Vec<JournalRecord>, u64), JournalError> {
        let mut file = BufReader::new(File::open(&self.path)?);
        let file_len = file.get_ref().metadata()?.len();
        let mut records = Vec::new();
        let mut offset: u64 = 0;

        while offset + HEADER_SIZE as u64 <= file_len {
            file.seek(SeekFrom::Start(offset))?;

            let mut header = [0u8; HEADER_SIZE];
            match file.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 || offset + HEADER_SIZE as u64 + length as u64 > file_len {
                warn!(offset, length, file_len, "incomplete journal entry; stopping recovery");
                break;
            }

            let mut payload = vec![0u8; length as usize];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(offset, "truncated journal entry; stopping recovery");
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                return Err(JournalError::Corrupt {
                    offset,
                    reason: format!(
                        "CRC mismatch (expected {expected_crc:#010x}, got {actual_crc:#010x})"
                    ),
                });
            }
            let record = bincode::deserialize::<JournalRecord>(&payload).map_err(|e| {
                JournalError::Corrupt {
                    offset,
                    reason: format!("undecodable entry: {e}"),
                }
            })?;
            records.push(record);

            offset += HEADER_SIZE as u64 + length as u64;
        }

        debug!(recovered = records.len(), "journal recovery complete");
        Ok((records, offset))
    }

    /// Current write offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Errors produced by the journal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("journal entry of {0} bytes exceeds the u32 length prefix")]
    EntryTooLarge(usize),

    #[error("journal replay failed: {0}")]
    Replay(String),

    #[error("journal corrupt at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("journal poisoned by an earlier failed append")]
    Poisoned,
}
