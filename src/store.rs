use crate::error::{Result, SalesError};
use crate::schema::SalesRecord;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use std::sync::RwLock;

/// Persistence boundary for transaction records.
///
/// Stores are constructed by the caller and handed to whatever needs them;
/// the analytics and commission code never touches a store directly.
pub trait RecordStore: Send + Sync {
    fn insert(&self, records: &[SalesRecord]) -> Result<()>;

    /// Every stored record, newest issue date first.
    fn fetch_all(&self) -> Result<Vec<SalesRecord>>;

    fn delete_all(&self) -> Result<()>;
}

fn newest_first(records: &mut [SalesRecord]) {
    records.sort_by(|a, b| b.date().cmp(&a.date()));
}

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<SalesRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, records: &[SalesRecord]) -> Result<()> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| SalesError::Store("record store lock poisoned".to_string()))?;
        stored.extend_from_slice(records);
        debug!("Inserted {} records ({} stored)", records.len(), stored.len());
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<SalesRecord>> {
        let stored = self
            .records
            .read()
            .map_err(|_| SalesError::Store("record store lock poisoned".to_string()))?;
        let mut records = stored.clone();
        newest_first(&mut records);
        Ok(records)
    }

    fn delete_all(&self) -> Result<()> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| SalesError::Store("record store lock poisoned".to_string()))?;
        info!("Deleting {} stored records", stored.len());
        stored.clear();
        Ok(())
    }
}

/// Keeps records as a JSON array on disk, using the upload column names.
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    fn read_file(&self) -> Result<Vec<SalesRecord>> {
        match File::open(&self.path) {
            Ok(file) => Ok(serde_json::from_reader(BufReader::new(file))?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Writes next to the store file and renames over it, so a failed write
    /// leaves the previous contents in place.
    fn write_file(&self, records: &[SalesRecord]) -> Result<()> {
        let staging = self.staging_path();
        let file = File::create(&staging)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush()?;
        drop(writer);
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl RecordStore for JsonFileRecordStore {
    fn insert(&self, records: &[SalesRecord]) -> Result<()> {
        let _guard = self
            .lock
            .write()
            .map_err(|_| SalesError::Store("record file lock poisoned".to_string()))?;
        let mut stored = self.read_file()?;
        stored.extend_from_slice(records);
        self.write_file(&stored)?;
        info!(
            "Wrote {} records to {} ({} total)",
            records.len(),
            self.path.display(),
            stored.len()
        );
        Ok(())
    }

    fn fetch_all(&self) -> Result<Vec<SalesRecord>> {
        let _guard = self
            .lock
            .read()
            .map_err(|_| SalesError::Store("record file lock poisoned".to_string()))?;
        let mut records = self.read_file()?;
        newest_first(&mut records);
        Ok(records)
    }

    fn delete_all(&self) -> Result<()> {
        let _guard = self
            .lock
            .write()
            .map_err(|_| SalesError::Store("record file lock poisoned".to_string()))?;
        self.write_file(&[])?;
        info!("Cleared record file {}", self.path.display());
        Ok(())
    }
}
