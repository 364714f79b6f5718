pub mod cleaner;
pub mod parser;

use arrow::record_batch::RecordBatch;
use common::config::FieldSpec;
use common::Result;
use tracing::info;

/// Bronze archive -> silver table.
pub struct SilverProcessor {
    field_specs: Vec<FieldSpec>,
}

impl SilverProcessor {
    pub fn new(field_specs: Vec<FieldSpec>) -> Self {
        Self { field_specs }
    }

    pub fn process_archive(&self, archive_bytes: &[u8]) -> Result<RecordBatch> {
        let raw = parser::parse_archive(archive_bytes, &self.field_specs)?;
        let cleaned = cleaner::clean(&raw)?;
        info!(rows = cleaned.num_rows(), "Silver: archive parsed and cleaned");
        Ok(cleaned)
    }
}
