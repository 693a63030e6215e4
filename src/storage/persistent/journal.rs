//! Append-only journal.
//!
//! Every mutation is framed and appended to a single file before it is
//! applied in memory; reopening the store replays that file to rebuild
//! state. Opening also repairs the one crash artifact the format allows: a
//! frame cut short by a dying process is trimmed off, so later appends
//! never land behind unreadable bytes.
//!
//! On disk the journal is the codec header followed by frames:
//!
//! ```text
//! [MAGIC "GRDB"][version][frame][frame]...
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Cursor, ErrorKind, Result as IoResult, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::StudentRecord;

use super::codec;

/// One framed journal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the append order, starting at 1.
    pub sequence: u64,
    /// Wall-clock time of the append.
    pub timestamp: DateTime<Utc>,
    /// The logged mutation.
    pub op: JournalOp,
}

/// A logged mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JournalOp {
    /// A record was created.
    Insert(StudentRecord),
    /// A record was replaced wholesale.
    Replace(StudentRecord),
    /// A record was deleted.
    Delete {
        /// Id of the deleted record.
        id: String,
    },
}

/// The append side of the journal: the open file handle and the sequence
/// counter, guarded together so appends and rewrites cannot interleave.
#[derive(Debug)]
struct Appender {
    writer: BufWriter<File>,
    last_sequence: u64,
}

/// Result of walking an existing journal file on open.
struct TailScan {
    last_sequence: u64,
    clean_len: u64,
}

/// Append-only journal over a single file.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    appender: Mutex<Appender>,
    sync_on_write: bool,
}

impl Journal {
    /// Open a journal file, creating it if needed.
    ///
    /// An existing file is scanned for its longest prefix of whole, valid
    /// frames; a torn frame left by a crash is trimmed off before the file
    /// is reopened for appending.
    ///
    /// # Errors
    /// Any I/O failure, a foreign file, or corruption before the tail.
    pub fn open(path: &Path, sync_on_write: bool) -> IoResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        let last_sequence = if len < codec::HEADER_LEN {
            // Fresh file, or one too short to even hold a header.
            file.set_len(0)?;
            let mut handle = &file;
            codec::write_header(&mut handle)?;
            if sync_on_write {
                file.sync_all()?;
            }
            0
        } else {
            let scan = Self::scan(path)?;
            if scan.clean_len < len {
                file.set_len(scan.clean_len)?;
                if sync_on_write {
                    file.sync_all()?;
                }
            }
            scan.last_sequence
        };
        drop(file);

        let writer = BufWriter::new(OpenOptions::new().append(true).open(path)?);
        Ok(Self {
            path: path.to_path_buf(),
            appender: Mutex::new(Appender {
                writer,
                last_sequence,
            }),
            sync_on_write,
        })
    }

    /// Walk the file from the header, recording the sequence number and
    /// byte length of the longest prefix of whole, valid frames.
    ///
    /// A frame cut short ends the walk at the prefix before it. A frame
    /// that fails its checksum or parse is an error instead: damage before
    /// the tail means the file cannot be trusted.
    fn scan(path: &Path) -> IoResult<TailScan> {
        let bytes = std::fs::read(path)?;
        let total = bytes.len() as u64;
        let mut cursor = Cursor::new(bytes.as_slice());
        codec::read_header(&mut cursor)?;

        let mut scan = TailScan {
            last_sequence: 0,
            clean_len: cursor.position(),
        };
        while cursor.position() < total {
            match codec::decode::<JournalEntry>(&mut cursor) {
                Ok(entry) => {
                    scan.last_sequence = entry.sequence;
                    scan.clean_len = cursor.position();
                }
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
        }
        Ok(scan)
    }

    /// Frame and append one mutation, returning its sequence number.
    ///
    /// # Errors
    /// Any I/O failure; the entry is not counted as written.
    pub fn append(&self, op: JournalOp) -> IoResult<u64> {
        let mut appender = self.appender.lock().unwrap();

        let sequence = appender.last_sequence + 1;
        let frame = codec::encode(&JournalEntry {
            sequence,
            timestamp: Utc::now(),
            op,
        })?;

        appender.writer.write_all(&frame)?;
        appender.writer.flush()?;
        if self.sync_on_write {
            appender.writer.get_ref().sync_all()?;
        }

        appender.last_sequence = sequence;
        Ok(sequence)
    }

    /// Replay every entry currently in the journal.
    ///
    /// # Errors
    /// Any I/O failure reading the file or its header.
    pub fn iter(&self) -> IoResult<Replay> {
        Replay::load(&self.path)
    }

    /// Sequence number of the newest entry.
    pub fn current_sequence(&self) -> u64 {
        self.appender.lock().unwrap().last_sequence
    }

    /// Current on-disk size of the journal.
    ///
    /// # Errors
    /// Any I/O failure reading file metadata.
    pub fn size_bytes(&self) -> IoResult<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Replace the journal's contents with a snapshot of `records`
    /// (compaction).
    ///
    /// One `Insert` frame is written per record and the sequence counter
    /// restarts at the snapshot length. The caller must hand in the
    /// complete live data set; the store does so under its state write
    /// lock, which also holds off concurrent mutations.
    ///
    /// # Errors
    /// Any I/O failure while rewriting the file.
    pub fn rewrite(&self, records: &[StudentRecord]) -> IoResult<()> {
        let mut appender = self.appender.lock().unwrap();
        appender.writer.flush()?;

        // Detach the append handle so truncation works on every platform.
        let parked = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path.with_extension("swap"))?;
        appender.writer = BufWriter::new(parked);

        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        codec::write_header(&mut file)?;

        let mut sequence = 0u64;
        for record in records {
            sequence += 1;
            let frame = codec::encode(&JournalEntry {
                sequence,
                timestamp: Utc::now(),
                op: JournalOp::Insert(record.clone()),
            })?;
            file.write_all(&frame)?;
        }
        if self.sync_on_write {
            file.sync_all()?;
        }
        drop(file);

        appender.writer = BufWriter::new(OpenOptions::new().append(true).open(&self.path)?);
        appender.last_sequence = sequence;
        Ok(())
    }
}

/// Owning iterator over a journal's entries, loaded in one read.
///
/// Journals stay small (compaction bounds their growth), so replay reads
/// the whole file up front rather than streaming it.
pub struct Replay {
    cursor: Cursor<Vec<u8>>,
    total: u64,
}

impl Replay {
    fn load(path: &Path) -> IoResult<Self> {
        let bytes = std::fs::read(path)?;
        let total = bytes.len() as u64;
        let mut cursor = Cursor::new(bytes);
        codec::read_header(&mut cursor)?;
        Ok(Self { cursor, total })
    }
}

impl Iterator for Replay {
    type Item = IoResult<JournalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.position() >= self.total {
            return None;
        }
        match codec::decode(&mut self.cursor) {
            Ok(entry) => Some(Ok(entry)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: &str) -> StudentRecord {
        StudentRecord {
            id: id.to_string(),
            name: format!("student {id}"),
            email: None,
            english: 70,
            maths: 80,
            science: 90,
            total: 240,
            average: 80.0,
            grade: 'B',
        }
    }

    fn insert_ids(journal: &Journal) -> Vec<String> {
        journal
            .iter()
            .unwrap()
            .map(|e| match e.unwrap().op {
                JournalOp::Insert(r) => r.id,
                other => panic!("expected an insert, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn append_then_replay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.journal");

        let journal = Journal::open(&path, false).unwrap();
        journal.append(JournalOp::Insert(record("S1"))).unwrap();
        journal
            .append(JournalOp::Delete {
                id: "S1".to_string(),
            })
            .unwrap();
        assert_eq!(journal.current_sequence(), 2);

        let entries: Vec<_> = journal.iter().unwrap().map(Result::unwrap).collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sequence, 1);
        assert!(matches!(entries[0].op, JournalOp::Insert(_)));
        assert!(matches!(entries[1].op, JournalOp::Delete { .. }));
    }

    #[test]
    fn sequence_resumes_after_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persist.journal");

        {
            let journal = Journal::open(&path, true).unwrap();
            journal.append(JournalOp::Insert(record("S1"))).unwrap();
        }

        let journal = Journal::open(&path, true).unwrap();
        assert_eq!(journal.current_sequence(), 1);
        assert_eq!(
            journal.append(JournalOp::Replace(record("S1"))).unwrap(),
            2
        );
    }

    #[test]
    fn open_trims_a_torn_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torn.journal");

        {
            let journal = Journal::open(&path, false).unwrap();
            journal.append(JournalOp::Insert(record("S1"))).unwrap();
            journal.append(JournalOp::Insert(record("S2"))).unwrap();
        }

        // Cut the second frame short, as a crash mid-append would.
        let len = std::fs::metadata(&path).unwrap().len();
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(len - 7).unwrap();
        drop(file);

        let journal = Journal::open(&path, false).unwrap();
        assert_eq!(journal.current_sequence(), 1);

        // The torn bytes are gone; a new append lands cleanly after S1.
        journal.append(JournalOp::Insert(record("S3"))).unwrap();
        assert_eq!(insert_ids(&journal), vec!["S1", "S3"]);
    }

    #[test]
    fn rewrite_shrinks_to_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compact.journal");

        let journal = Journal::open(&path, false).unwrap();
        for i in 0..20 {
            journal
                .append(JournalOp::Insert(record(&format!("S{i}"))))
                .unwrap();
        }
        for i in 0..19 {
            journal
                .append(JournalOp::Delete {
                    id: format!("S{i}"),
                })
                .unwrap();
        }
        let before = journal.size_bytes().unwrap();

        journal.rewrite(&[record("S19")]).unwrap();

        assert!(journal.size_bytes().unwrap() < before);
        assert_eq!(journal.current_sequence(), 1);
        assert_eq!(insert_ids(&journal), vec!["S19"]);
    }

    #[test]
    fn appends_continue_after_rewrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resume.journal");

        let journal = Journal::open(&path, false).unwrap();
        journal.append(JournalOp::Insert(record("S1"))).unwrap();
        journal.rewrite(&[record("S1")]).unwrap();
        journal.append(JournalOp::Insert(record("S2"))).unwrap();

        assert_eq!(insert_ids(&journal), vec!["S1", "S2"]);
        assert_eq!(journal.current_sequence(), 2);
    }
}
