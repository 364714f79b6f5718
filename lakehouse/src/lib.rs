pub mod processor;
pub mod reference;
pub mod schema;
pub mod services;
pub mod utils;

use common::config::Settings;
use common::Result;
use services::PipelineReport;

pub use services::pipeline::run_pipeline;

/// Runs the complete lakehouse pipeline once.
pub async fn run_lakehouse_pipeline(config_path: &str) -> Result<PipelineReport> {
    let settings = Settings::new(config_path)?;
    run_pipeline(&settings).await
}
