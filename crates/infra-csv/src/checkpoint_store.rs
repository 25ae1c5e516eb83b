// CSV CheckpointStore Implementation

use crate::columns::{format_row, ColumnIndex, CHECKPOINT_HEADER};
use async_trait::async_trait;
use cnfsweep_core::domain::ResultTable;
use cnfsweep_core::error::{AppError, Result};
use cnfsweep_core::port::CheckpointStore;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info};

// Helper to convert csv::Error to AppError, keeping IO failures distinct
fn map_csv_error(path: &Path, err: csv::Error) -> AppError {
    let position = err.position().map(|p| p.line());
    let detail = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io_err) => AppError::checkpoint_io(path, io_err),
        _ => match position {
            Some(line) => AppError::CheckpointFormat(format!(
                "{} (line {}): {}",
                path.display(),
                line,
                detail
            )),
            None => AppError::CheckpointFormat(format!("{}: {}", path.display(), detail)),
        },
    }
}

/// Checkpoint stored as a CSV file with header
/// `filename,seconds,sat,nof_vars,nof_clauses`
///
/// Saves are atomic: the merged table is written to a temporary file next to
/// the checkpoint and renamed over it.
pub struct CsvCheckpointStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read a checkpoint file; a missing file is an empty table
fn read_table(path: &Path) -> Result<ResultTable> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No checkpoint yet");
            return Ok(ResultTable::new());
        }
        Err(e) => return Err(AppError::checkpoint_io(path, e)),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| map_csv_error(path, e))?
        .clone();
    if headers.is_empty() {
        return Ok(ResultTable::new());
    }
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut table = ResultTable::new();
    for row in reader.records() {
        let row = row.map_err(|e| map_csv_error(path, e))?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let (id, record) = columns.parse_row(&row).map_err(|msg| {
            AppError::CheckpointFormat(format!("{} (line {}): {}", path.display(), line, msg))
        })?;
        // Later rows for the same identifier supersede earlier ones
        table.upsert(id, record);
    }

    Ok(table)
}

/// Write `table` atomically to `path`
fn write_table(path: &Path, table: &ResultTable) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| AppError::checkpoint_io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| AppError::checkpoint_io(dir, e))?;
    {
        let mut writer = csv::Writer::from_writer(BufWriter::new(tmp.as_file_mut()));
        writer
            .write_record(CHECKPOINT_HEADER)
            .map_err(|e| map_csv_error(path, e))?;
        for (id, record) in table {
            writer
                .write_record(&format_row(id, record))
                .map_err(|e| map_csv_error(path, e))?;
        }
        let mut inner = writer
            .into_inner()
            .map_err(|e| AppError::checkpoint_io(path, e.into_error()))?;
        inner.flush().map_err(|e| AppError::checkpoint_io(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| AppError::checkpoint_io(path, e))?;
    tmp.persist(path)
        .map_err(|e| AppError::checkpoint_io(path, e.error))?;

    Ok(())
}

#[async_trait]
impl CheckpointStore for CsvCheckpointStore {
    async fn load(&self) -> Result<ResultTable> {
        let path = self.path.clone();
        let table = tokio::task::spawn_blocking(move || read_table(&path))
            .await
            .map_err(|e| AppError::Internal(format!("checkpoint load task failed: {}", e)))??;

        info!(
            path = %self.path.display(),
            records = table.len(),
            "Checkpoint loaded"
        );
        Ok(table)
    }

    async fn save(&self, existing: &ResultTable, new: &ResultTable) -> Result<ResultTable> {
        let merged = existing.merged_with(new);

        // One writer at a time; the rename is atomic but ordering is not
        let _guard = self.write_lock.lock().await;

        let path = self.path.clone();
        let to_write = merged.clone();
        tokio::task::spawn_blocking(move || write_table(&path, &to_write))
            .await
            .map_err(|e| AppError::Internal(format!("checkpoint save task failed: {}", e)))??;

        debug!(
            path = %self.path.display(),
            records = merged.len(),
            "Checkpoint written"
        );
        Ok(merged)
    }
}
