//! Run record I/O off the async executor.
//!
//! [`BackgroundRecordFile`] shares one [`RecordFile`] behind a mutex and runs
//! every operation on tokio's blocking pool, so async callers never block a
//! worker thread on file I/O. Operations on one handle run one at a time;
//! there is no cancellation or timeout.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::sync::{Arc, Mutex};

use crate::record::file::RecordFile;
use crate::FlfError;

/// A [`RecordFile`] driven from async code.
pub struct BackgroundRecordFile<R, S = File> {
    inner: Arc<Mutex<RecordFile<R, S>>>,
}

impl<R, S> Clone for BackgroundRecordFile<R, S> {
    fn clone(&self) -> Self {
        BackgroundRecordFile {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, S> BackgroundRecordFile<R, S>
where
    R: Default + Send + 'static,
    S: Read + Write + Seek + Send + 'static,
{
    pub fn new(file: RecordFile<R, S>) -> Self {
        BackgroundRecordFile {
            inner: Arc::new(Mutex::new(file)),
        }
    }

    /// Run `f` with exclusive access to the file on the blocking pool.
    pub async fn with<T, F>(&self, f: F) -> Result<T, FlfError>
    where
        T: Send + 'static,
        F: FnOnce(&mut RecordFile<R, S>) -> Result<T, FlfError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut file = inner
                .lock()
                .map_err(|_| FlfError::Io("Record file handle poisoned".to_string()))?;
            f(&mut file)
        })
        .await
        .map_err(|e| FlfError::Io(format!("Background record task failed: {}", e)))?
    }

    pub async fn read_record(&self, index: u64) -> Result<R, FlfError> {
        self.with(move |file| file.read_record(index)).await
    }

    pub async fn write_record_at(&self, index: u64, record: R) -> Result<(), FlfError> {
        self.with(move |file| file.write_record_at(index, &record)).await
    }

    /// Append `record` and return its index.
    pub async fn append(&self, record: R) -> Result<u64, FlfError> {
        self.with(move |file| file.append(&record)).await
    }

    pub async fn record_count(&self) -> Result<u64, FlfError> {
        self.with(|file| file.record_count()).await
    }

    pub async fn flush(&self) -> Result<(), FlfError> {
        self.with(|file| file.flush()).await
    }

    /// Take back the file if this is the last handle.
    pub fn into_inner(self) -> Result<RecordFile<R, S>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())),
            Err(inner) => Err(BackgroundRecordFile { inner }),
        }
    }
}
