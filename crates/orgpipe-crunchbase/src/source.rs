//! `EtlSource` implementation binding extractor, flattener, and sink

use anyhow::Context;
use arrow::array::{RecordBatch, StringArray};
use chrono::NaiveDate;

use orgpipe_core::{EtlSource, PartitionSink, RawPage};

use crate::api::OrgExtractor;
use crate::transform::{self, OrgAccumulator, OrgEntity};

/// Context string for the partition path
const CONTEXT: &str = "org";

/// The organization search endpoint as a pipeline source.
pub struct OrgSource<S> {
    extractor: OrgExtractor,
    sink: S,
    partition_date: NaiveDate,
    page_size: usize,
}

impl<S: PartitionSink> OrgSource<S> {
    pub fn new(
        extractor: OrgExtractor,
        sink: S,
        partition_date: NaiveDate,
        page_size: usize,
    ) -> Self {
        Self {
            extractor,
            sink,
            partition_date,
            page_size,
        }
    }
}

impl<S: PartitionSink> EtlSource for OrgSource<S> {
    type Raw = OrgEntity;

    fn extract(&mut self, cursor: Option<&str>) -> anyhow::Result<RawPage<OrgEntity>> {
        let page = self.extractor.fetch_page(cursor)?;
        Ok(RawPage {
            total: page.count,
            records: page.entities,
        })
    }

    fn transform(&self, records: Vec<OrgEntity>) -> anyhow::Result<RecordBatch> {
        let rows = transform::flatten(records)?;
        let mut acc = OrgAccumulator::new();
        for row in rows {
            acc.push(row);
        }
        Ok(acc.take_batch())
    }

    fn load(&mut self, batch: &RecordBatch, offset: usize) -> anyhow::Result<()> {
        let file_name = format!("org_{offset}.parquet");
        self.sink
            .write(batch, CONTEXT, self.partition_date, &file_name)
            .with_context(|| format!("failed to write {file_name}"))?;
        Ok(())
    }

    fn next_cursor(&self, batch: &RecordBatch) -> anyhow::Result<String> {
        anyhow::ensure!(
            batch.num_rows() > 0,
            "cannot derive a cursor from an empty page"
        );
        let uuid = batch
            .column_by_name("uuid")
            .context("batch has no uuid column")?
            .as_any()
            .downcast_ref::<StringArray>()
            .context("uuid column is not Utf8")?;
        Ok(uuid.value(batch.num_rows() - 1).to_string())
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}
