//! Serialized writer for export records
//!
//! All workers share one [`Sink`]. Each record is encoded into a single line,
//! written and flushed while holding the sink's lock, so records from different
//! workers may interleave in any order but are never split or merged.

use crate::error::{Error, Result};
use crate::types::ExportRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Field separator (U+001E RECORD SEPARATOR); never needs escaping in message text
pub const FIELD_DELIMITER: char = '\u{1E}';

/// Record terminator
pub const RECORD_TERMINATOR: char = '\n';

/// Thread-safe, flush-on-write record sink
pub struct Sink {
    writer: Mutex<Box<dyn Write + Send>>,
    records: AtomicU64,
}

impl Sink {
    /// Create (or truncate) the output file and write the header row
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Self::from_writer(Box::new(file))
    }

    /// Wrap an arbitrary writer and write the header row
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Result<Self> {
        let sink = Self {
            writer: Mutex::new(writer),
            records: AtomicU64::new(0),
        };
        sink.write_line(&ExportRecord::header())?;
        Ok(sink)
    }

    /// Append one record and flush it to the underlying stream
    ///
    /// A failure here means the output is unusable; callers must treat the
    /// returned [`Error::Sink`] as fatal for the whole export.
    pub fn write(&self, record: &ExportRecord) -> Result<()> {
        self.write_line(record)?;
        self.records.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Append a page of records from the blocking thread pool
    ///
    /// Each record is written and flushed on its own, exactly as with
    /// [`Sink::write`], so records from other workers may land between them.
    /// Returns the number of records written.
    pub async fn write_batch(self: Arc<Self>, records: Vec<ExportRecord>) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        // Keep flush-per-record file IO off the async workers
        tokio::task::spawn_blocking(move || -> Result<u64> {
            for record in &records {
                self.write(record)?;
            }
            Ok(records.len() as u64)
        })
        .await
        .unwrap_or_else(|e| Err(Error::Worker(format!("sink writer task failed: {e}"))))
    }

    /// Number of message records written, excluding the header
    pub fn records_written(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    /// Flush the underlying stream; the stream is closed when the sink is dropped
    pub fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()?;
        Ok(())
    }

    fn write_line(&self, record: &ExportRecord) -> Result<()> {
        let line = encode(record);
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|source| Error::Sink {
                record: record.clone(),
                source,
            })
    }
}

/// Encode a record as one delimited line; fields are written verbatim
pub fn encode(record: &ExportRecord) -> String {
    let mut line =
        String::with_capacity(record.author.len() + record.content.len() + record.id.len() + 3);
    line.push_str(&record.author);
    line.push(FIELD_DELIMITER);
    line.push_str(&record.content);
    line.push(FIELD_DELIMITER);
    line.push_str(&record.id);
    line.push(RECORD_TERMINATOR);
    line
}
