use crate::processor::storage::{TableLineage, read_parquet, write_parquet};
use crate::processor::{ExtensionMap, GoldProcessor, SilverProcessor, scan_missing};
use crate::reference::ReferenceData;
use crate::utils::paths::year_month;
use common::config::{FieldSpec, Settings};
use common::storage::{LocalStorage, ObjectStorage};
use common::Result;
use etl::DownloadReport;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Silver,
    Gold,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }

    fn extensions(&self) -> ExtensionMap {
        match self {
            Self::Silver => ExtensionMap::BRONZE_TO_SILVER,
            Self::Gold => ExtensionMap::SILVER_TO_GOLD,
        }
    }
}

#[derive(Debug)]
struct FileOutcome {
    target: String,
    rows: usize,
    warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub discovered: usize,
    pub processed: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub warnings: usize,
}

impl StageReport {
    fn new(stage: Stage, discovered: usize) -> Self {
        Self {
            stage,
            discovered,
            processed: Vec::new(),
            failed: Vec::new(),
            warnings: 0,
        }
    }

    fn record_outcome(&mut self, source: &str, result: Result<FileOutcome>) {
        match result {
            Ok(outcome) => {
                info!(
                    stage = self.stage.as_str(),
                    source,
                    target = %outcome.target,
                    rows = outcome.rows,
                    "Saved table"
                );
                self.warnings += outcome.warnings;
                self.processed.push(outcome.target);
            }
            Err(e) => {
                error!(
                    stage = self.stage.as_str(),
                    source,
                    error = %e,
                    "Failed to process file, skipping it"
                );
                self.failed.push((source.to_string(), e.to_string()));
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub download: Option<DownloadReport>,
    pub silver: StageReport,
    pub gold: StageReport,
}

impl PipelineReport {
    pub fn is_clean(&self) -> bool {
        self.silver.is_clean()
            && self.gold.is_clean()
            && self.download.as_ref().is_none_or(|d| d.failed.is_empty())
    }
}

/// Bronze -> silver -> gold over three tier stores.
pub struct Pipeline {
    bronze: Arc<dyn ObjectStorage>,
    silver: Arc<dyn ObjectStorage>,
    gold: Arc<dyn ObjectStorage>,
    silver_processor: SilverProcessor,
    gold_processor: GoldProcessor,
}

impl Pipeline {
    pub fn new(
        bronze: Arc<dyn ObjectStorage>,
        silver: Arc<dyn ObjectStorage>,
        gold: Arc<dyn ObjectStorage>,
        field_specs: Vec<FieldSpec>,
        reference: Arc<ReferenceData>,
        materiality_threshold: usize,
    ) -> Self {
        Self {
            bronze,
            silver,
            gold,
            silver_processor: SilverProcessor::new(field_specs),
            gold_processor: GoldProcessor::new(reference, materiality_threshold),
        }
    }

    pub fn from_settings(settings: &Settings, reference: Arc<ReferenceData>) -> Self {
        Self::new(
            Arc::new(LocalStorage::new(&settings.storage.bronze_path)),
            Arc::new(LocalStorage::new(&settings.storage.silver_path)),
            Arc::new(LocalStorage::new(&settings.storage.gold_path)),
            settings.schema.fields.clone(),
            reference,
            settings.quality.materiality_threshold,
        )
    }

    pub async fn run_silver_stage(&self) -> Result<StageReport> {
        self.run_stage(Stage::Silver).await
    }

    pub async fn run_gold_stage(&self) -> Result<StageReport> {
        self.run_stage(Stage::Gold).await
    }

    fn tiers(&self, stage: Stage) -> (&dyn ObjectStorage, &dyn ObjectStorage) {
        match stage {
            Stage::Silver => (self.bronze.as_ref(), self.silver.as_ref()),
            Stage::Gold => (self.silver.as_ref(), self.gold.as_ref()),
        }
    }

    /// Processes every source file of `stage` that has no target yet.
    ///
    /// Listing errors and storage-access errors are returned; other per-file
    /// failures land in the report.
    async fn run_stage(&self, stage: Stage) -> Result<StageReport> {
        let (source, target) = self.tiers(stage);
        let missing = scan_missing(source, target, &stage.extensions()).await?;
        let mut report = StageReport::new(stage, missing.len());

        if missing.is_empty() {
            info!(stage = stage.as_str(), "All files are processed. No need for updates");
            return Ok(report);
        }

        info!(stage = stage.as_str(), count = missing.len(), "Found unprocessed files");
        for name in missing {
            let (year, month) = year_month(&name).unwrap_or_default();
            let span = info_span!("file", stage = stage.as_str(), file = %name, year, month);
            let result = self.process_file(stage, &name).instrument(span).await;
            match result {
                Err(e) if e.is_fatal_for_run() => {
                    error!(
                        stage = stage.as_str(),
                        file = %name,
                        error = %e,
                        "Tier is not accessible, aborting stage"
                    );
                    return Err(e);
                }
                result => report.record_outcome(&name, result),
            }
        }

        info!(
            stage = stage.as_str(),
            processed = report.processed.len(),
            failed = report.failed.len(),
            warnings = report.warnings,
            "Stage complete"
        );
        Ok(report)
    }

    async fn process_file(&self, stage: Stage, name: &str) -> Result<FileOutcome> {
        let (source, target) = self.tiers(stage);
        let target_name = stage.extensions().target_name(name);
        let input = source.get_object(name).await?;

        let (table, warnings) = match stage {
            Stage::Silver => (self.silver_processor.process_archive(&input)?, 0),
            Stage::Gold => {
                let silver_table = read_parquet(input)?;
                let (gold_table, warnings) =
                    self.gold_processor.process_table(&silver_table, name)?;
                (gold_table, warnings.len())
            }
        };

        let data = write_parquet(&table, &TableLineage::new(stage.as_str(), name))?;
        target.put_object(&target_name, &data).await?;

        Ok(FileOutcome {
            target: target_name,
            rows: table.num_rows(),
            warnings,
        })
    }
}

/// Whole run: optional bronze download, then silver and gold.
pub async fn run_pipeline(settings: &Settings) -> Result<PipelineReport> {
    let reference = Arc::new(ReferenceData::load(&settings.reference)?);

    let download = if settings.source.links.is_empty() {
        info!("No source links configured, skipping bronze download");
        None
    } else {
        Some(etl::run_download(settings).await?)
    };

    let pipeline = Pipeline::from_settings(settings, reference);
    let silver = pipeline.run_silver_stage().await?;
    let gold = pipeline.run_gold_stage().await?;

    Ok(PipelineReport {
        download,
        silver,
        gold,
    })
}
