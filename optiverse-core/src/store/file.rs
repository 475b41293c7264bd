#[cfg(test)]
#[path = "../../tests/unit/store/file_test.rs"]
mod file_test;

use super::*;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A store which keeps one run in its own directory as a journal of JSON lines.
///
/// Every record is written as a single line with one `write_all` call followed by `sync_data`.
/// A line without the trailing newline is a torn write: it is skipped on read and cut off when
/// the store is opened again, so appends never glue to a broken line.
pub struct FileStore {
    directory: PathBuf,
    journal: PathBuf,
    file: Mutex<File>,
}

impl FileStore {
    /// A journal file name inside the run directory.
    pub const JOURNAL: &'static str = "journal.jsonl";

    /// Opens (or creates) a store in the given run directory.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self, StoreError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;

        let journal = directory.join(Self::JOURNAL);
        let file = OpenOptions::new().create(true).read(true).append(true).open(&journal)?;

        let content = fs::read(&journal)?;
        let complete_len = complete_prefix_len(content.as_slice());
        if complete_len < content.len() {
            file.set_len(complete_len as u64)?;
            file.sync_all()?;
        }

        Ok(Self { directory, journal, file: Mutex::new(file) })
    }

    /// Returns the run directory.
    pub fn directory(&self) -> &Path {
        self.directory.as_path()
    }

    /// Returns a path to the journal file.
    pub fn journal(&self) -> &Path {
        self.journal.as_path()
    }
}

impl Store for FileStore {
    fn append_record(&self, record: &Record) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record).map_err(|err| StoreError::Serialization(err.to_string()))?;
        line.push(b'\n');

        let mut file = self.file.lock().map_err(|_| StoreError::Io("journal lock is poisoned".to_string()))?;
        file.write_all(line.as_slice())?;
        file.sync_data()?;

        Ok(())
    }

    fn read_records(&self) -> Result<Vec<Record>, StoreError> {
        let content = fs::read(&self.journal)?;
        let complete = &content[..complete_prefix_len(content.as_slice())];

        complete
            .split(|byte| *byte == b'\n')
            .enumerate()
            .filter(|(_, line)| !line.iter().all(u8::is_ascii_whitespace))
            .map(|(idx, line)| {
                serde_json::from_slice::<Record>(line)
                    .map_err(|err| StoreError::Corrupted(format!("cannot read journal line {}: {err}", idx + 1)))
            })
            .collect()
    }
}

/// Returns length of the content which ends with the last newline.
fn complete_prefix_len(content: &[u8]) -> usize {
    content.iter().rposition(|byte| *byte == b'\n').map_or(0, |idx| idx + 1)
}
