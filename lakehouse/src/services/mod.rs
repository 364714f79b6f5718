pub mod pipeline;

pub use pipeline::{Pipeline, PipelineReport, Stage, StageReport};
