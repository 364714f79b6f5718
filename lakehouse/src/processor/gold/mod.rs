pub mod enrich;
pub mod types;

pub use types::{DataQualityWarning, EnrichedRecord, EnrichmentOutcome, WarningKind};

use crate::reference::ReferenceData;
use arrow::record_batch::RecordBatch;
use common::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Silver table -> gold table.
pub struct GoldProcessor {
    reference: Arc<ReferenceData>,
    materiality_threshold: usize,
}

impl GoldProcessor {
    pub fn new(reference: Arc<ReferenceData>, materiality_threshold: usize) -> Self {
        Self {
            reference,
            materiality_threshold,
        }
    }

    /// Enriches one silver table, logging its data-quality warnings.
    pub fn process_table(
        &self,
        silver: &RecordBatch,
        file_id: &str,
    ) -> Result<(RecordBatch, Vec<DataQualityWarning>)> {
        let outcome = enrich::enrich(silver, &self.reference, file_id, self.materiality_threshold)?;

        for warning in &outcome.warnings {
            warn!(
                kind = warning.kind.as_str(),
                count = warning.count,
                known_out_of_scope = warning.known_out_of_scope,
                "Data quality: {}",
                warning
            );
        }

        info!(
            input_rows = silver.num_rows(),
            output_rows = outcome.records.len(),
            dropped_brand_rows = outcome.dropped_brand_rows,
            dropped_city_rows = outcome.dropped_city_rows,
            "Gold: table enriched"
        );

        let batch = enrich::records_to_batch(&outcome.records)?;
        Ok((batch, outcome.warnings))
    }
}
