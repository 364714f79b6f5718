use config::{Config, ConfigError};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub storage: StorageSettings,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Filesystem roots of the three tiers.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub bronze_path: PathBuf,
    pub silver_path: PathBuf,
    pub gold_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourceConfig {
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReferenceConfig {
    pub brands_path: PathBuf,
    pub cities_path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub cities_delimiter: String,
    #[serde(default)]
    pub out_of_scope_cities: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QualityConfig {
    #[serde(default = "default_materiality_threshold")]
    pub materiality_threshold: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            materiality_threshold: default_materiality_threshold(),
        }
    }
}

/// Byte range `[start, end)` of a fixed-width line and the column it feeds.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub start: usize,
    pub end: usize,
    pub name: String,
}

impl FieldSpec {
    pub fn new(start: usize, end: usize, name: &str) -> Self {
        Self {
            start,
            end,
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchemaConfig {
    #[serde(default = "default_field_specs")]
    pub fields: Vec<FieldSpec>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            fields: default_field_specs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_retries() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_materiality_threshold() -> usize {
    100
}

pub fn default_field_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(0, 8, "fecha_matriculacion"),
        FieldSpec::new(17, 47, "marca"),
        FieldSpec::new(47, 69, "modelo"),
        FieldSpec::new(94, 99, "cilindrada"),
        FieldSpec::new(197, 228, "localidad"),
    ]
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;

        debug!(
            fields = settings.schema.fields.len(),
            links = settings.source.links.len(),
            "Loaded pipeline settings"
        );

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.schema.fields.is_empty() {
            return Err(ConfigError::Message(
                "schema.fields must declare at least one field".to_string(),
            ));
        }
        if self.reference.cities_delimiter.len() != 1 {
            return Err(ConfigError::Message(format!(
                "reference.cities_delimiter must be a single byte, got '{}'",
                self.reference.cities_delimiter
            )));
        }
        for field in &self.schema.fields {
            if field.start >= field.end {
                return Err(ConfigError::Message(format!(
                    "field '{}' has an empty or inverted range {}..{}",
                    field.name, field.start, field.end
                )));
            }
        }
        Ok(())
    }
}
