use async_trait::async_trait;
use common::config::SourceConfig;
use common::{Error, Result};
use url::Url;

/// Supplies the archive URLs currently published by the source site.
#[async_trait]
pub trait LinkSource: Send + Sync {
    async fn links(&self) -> Result<Vec<String>>;
}

/// Links listed directly in the configuration.
pub struct StaticLinks {
    links: Vec<String>,
}

impl StaticLinks {
    pub fn new(links: Vec<String>) -> Self {
        Self { links }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.links.clone())
    }
}

#[async_trait]
impl LinkSource for StaticLinks {
    async fn links(&self) -> Result<Vec<String>> {
        Ok(self.links.clone())
    }
}

/// Name a downloaded archive is stored under: the last path segment of its URL.
pub fn archive_name(link: &str) -> Result<String> {
    let url = Url::parse(link)?;
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .ok_or_else(|| Error::InvalidInput(format!("URL '{}' has no file name", link)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_name() {
        let name = archive_name(
            "https://www.dgt.es/microdatos/salida/2024/3/vehiculos/matriculaciones/export_mensual_mat_202403.zip",
        )
        .unwrap();
        assert_eq!(name, "export_mensual_mat_202403.zip");
    }

    #[test]
    fn test_archive_name_ignores_query() {
        let name = archive_name("https://example.org/files/export_mensual_mat_202401.zip?v=2").unwrap();
        assert_eq!(name, "export_mensual_mat_202401.zip");
    }

    #[test]
    fn test_archive_name_rejects_bare_host() {
        assert!(archive_name("https://example.org/").is_err());
        assert!(archive_name("not a url").is_err());
    }
}
