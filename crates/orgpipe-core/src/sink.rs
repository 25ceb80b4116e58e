//! Partitioned Parquet output

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use arrow::array::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

/// Destination for transformed batches.
///
/// `write` persists one batch as `<file_name>` inside the partition
/// directory `context=<context>/_extraction_date=<YYYY-MM-DD>`, creating
/// the directory when needed. No row-index metadata is written.
pub trait PartitionSink {
    fn write(
        &mut self,
        batch: &RecordBatch,
        context: &str,
        partition_date: NaiveDate,
        file_name: &str,
    ) -> io::Result<()>;
}

/// Writes batches as zstd-compressed Parquet with atomic tmp→rename
#[derive(Debug)]
pub struct ParquetDirSink {
    root: PathBuf,
    zstd_level: i32,
}

impl ParquetDirSink {
    pub fn new(root: impl Into<PathBuf>, zstd_level: i32) -> Self {
        Self {
            root: root.into(),
            zstd_level,
        }
    }

    /// Partition directory for a context/date pair
    pub fn partition_dir(&self, context: &str, date: NaiveDate) -> PathBuf {
        self.root
            .join(format!("context={context}"))
            .join(format!("_extraction_date={}", date.format("%Y-%m-%d")))
    }
}

impl PartitionSink for ParquetDirSink {
    fn write(
        &mut self,
        batch: &RecordBatch,
        context: &str,
        partition_date: NaiveDate,
        file_name: &str,
    ) -> io::Result<()> {
        let dir = self.partition_dir(context, partition_date);
        fs::create_dir_all(&dir)?;

        let final_path = dir.join(file_name);
        let tmp_path = dir.join(format!("{file_name}.tmp"));

        // Clean up stale tmp file from an aborted run
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let file = File::create(&tmp_path)?;
        let level = ZstdLevel::try_new(self.zstd_level)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(level))
            .build();

        let mut writer =
            ArrowWriter::try_new(file, batch.schema(), Some(props)).map_err(io::Error::other)?;
        writer.write(batch).map_err(io::Error::other)?;
        writer.close().map_err(io::Error::other)?;
        fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }
}

/// Check that a completed parquet file exists and has a valid footer
pub fn is_valid_parquet(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    let Ok(file) = File::open(path) else {
        return false;
    };
    parquet::file::reader::SerializedFileReader::new(file).is_ok()
}
