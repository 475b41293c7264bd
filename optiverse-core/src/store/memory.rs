use super::*;
use std::sync::Mutex;

/// A store which keeps records in memory. Useful for tests and runs which do not need resume.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
}

impl MemoryStore {
    /// Creates a store prefilled with records, e.g. to emulate resume.
    pub fn with_records(records: Vec<Record>) -> Self {
        Self { records: Mutex::new(records) }
    }

    /// Returns a copy of stored records.
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }
}

impl Store for MemoryStore {
    fn append_record(&self, record: &Record) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Io("memory store lock is poisoned".to_string()))?;
        records.push(record.clone());

        Ok(())
    }

    fn read_records(&self) -> Result<Vec<Record>, StoreError> {
        self.records
            .lock()
            .map(|records| records.clone())
            .map_err(|_| StoreError::Io("memory store lock is poisoned".to_string()))
    }
}
