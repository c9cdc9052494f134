use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use camino::Utf8Path;
use tracing::{debug, warn};

use super::{AUDIT_TARGET, AuditEntry, AuditError, AuditSink};
use crate::dispatch::OperationKind;

/// Append-only JSON-lines storage with one file per operation kind.
///
/// Each append opens the kind's file in append mode, writes exactly one
/// newline-terminated JSON object and syncs it to disk before returning. A
/// single lock covers the whole open-write-sync sequence and every read.
///
/// A failed append truncates the file back to its last complete line, and a
/// torn tail left by a crash is dropped before the next append. Readers skip
/// an unterminated final line.
#[derive(Debug)]
pub struct JsonLinesAuditSink {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesAuditSink {
    /// Opens (creating if needed) the audit directory.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::CreateDir`] when the directory cannot be created.
    pub fn open(dir: &Utf8Path) -> Result<Self, AuditError> {
        let dir = dir.as_std_path().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| AuditError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    /// Path of the file backing `kind`.
    #[must_use]
    pub fn path_for(&self, kind: OperationKind) -> PathBuf {
        self.dir
            .join(format!("{}.jsonl", kind.descriptor().audit_channel))
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn append(&self, kind: OperationKind, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let path = self.path_for(kind);
        let _guard = self.lock.lock().map_err(|_| AuditError::Poisoned)?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::Open {
                path: path.clone(),
                source,
            })?;
        append_record(&mut file, &line).map_err(|source| AuditError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(target: AUDIT_TARGET, path = %path.display(), id = %entry.id, "audit entry appended");
        Ok(())
    }

    fn entries(&self, kind: OperationKind) -> Result<Vec<AuditEntry>, AuditError> {
        let path = self.path_for(kind);
        let contents = {
            let _guard = self.lock.lock().map_err(|_| AuditError::Poisoned)?;
            match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(source) => return Err(AuditError::Read { path, source }),
            }
        };
        parse_lines(&path, &contents)
    }
}

/// File operations needed to append one record without leaving a partial
/// line behind.
trait RecordFile: Write {
    /// Length of the file up to and including its last newline.
    fn committed_len(&mut self) -> io::Result<u64>;

    /// Flushes written data to stable storage.
    fn sync(&mut self) -> io::Result<()>;

    /// Cuts the file back to `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl RecordFile for File {
    fn committed_len(&mut self) -> io::Result<u64> {
        const CHUNK: u64 = 4096;
        let mut end = self.metadata()?.len();
        while end > 0 {
            let start = end.saturating_sub(CHUNK);
            let mut window = vec![0_u8; usize::try_from(end - start).map_err(io::Error::other)?];
            self.seek(SeekFrom::Start(start))?;
            self.read_exact(&mut window)?;
            if let Some(position) = window.iter().rposition(|byte| *byte == b'\n') {
                return Ok(start + u64::try_from(position).map_err(io::Error::other)? + 1);
            }
            end = start;
        }
        Ok(0)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

fn append_record(file: &mut impl RecordFile, line: &[u8]) -> io::Result<()> {
    let committed = file.committed_len()?;
    file.truncate(committed)?;
    let written = file.write_all(line).and_then(|()| file.sync());
    if written.is_err() {
        if let Err(error) = file.truncate(committed) {
            warn!(target: AUDIT_TARGET, %error, "failed to roll back partial audit line");
        }
    }
    written
}

fn parse_lines(path: &Path, contents: &str) -> Result<Vec<AuditEntry>, AuditError> {
    contents
        .split_inclusive('\n')
        .enumerate()
        .filter(|(_, line)| line.ends_with('\n') && !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line.trim_end()).map_err(|source| AuditError::Corrupt {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })
        })
        .collect()
}
