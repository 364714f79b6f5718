pub mod fetch;
pub mod links;
pub mod utils;

use common::config::Settings;
use common::storage::{LocalStorage, ObjectStorage};
use common::Result;
use fetch::{Fetcher, HttpFetcher};
use links::{LinkSource, StaticLinks, archive_name};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

pub const ARCHIVE_EXTENSION: &str = "zip";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub published: usize,
    pub downloaded: Vec<String>,
    pub failed: Vec<String>,
}

fn is_archive(name: &str) -> bool {
    name.to_ascii_lowercase()
        .ends_with(&format!(".{}", ARCHIVE_EXTENSION))
}

/// Archive links whose file name is not yet present in the bronze listing.
pub fn missing_links(links: &[String], bronze_files: &[String]) -> Vec<(String, String)> {
    let existing: HashSet<&str> = bronze_files.iter().map(String::as_str).collect();

    links
        .iter()
        .filter_map(|link| match archive_name(link) {
            Ok(name) if !is_archive(&name) => {
                debug!(link = %link, "Skipping link that is not a zip archive");
                None
            }
            Ok(name) if !existing.contains(name.as_str()) => Some((link.clone(), name)),
            Ok(_) => None,
            Err(e) => {
                warn!(link = %link, error = %e, "Skipping link without an archive name");
                None
            }
        })
        .collect()
}

/// Downloads every published archive that bronze does not have yet.
pub async fn download_to_bronze(
    source: &dyn LinkSource,
    fetcher: &dyn Fetcher,
    bronze: &dyn ObjectStorage,
) -> Result<DownloadReport> {
    let links = source.links().await?;
    info!(count = links.len(), "Found published archives");

    let bronze_files: Vec<String> = bronze
        .list_objects()
        .await?
        .into_iter()
        .filter(|name| is_archive(name))
        .collect();
    info!(count = bronze_files.len(), tier = %bronze.location(), "Found bronze archives");

    let missing = missing_links(&links, &bronze_files);
    let mut report = DownloadReport {
        published: links.len(),
        ..Default::default()
    };

    if missing.is_empty() {
        info!("All archives downloaded, no need for updates");
        return Ok(report);
    }

    info!(count = missing.len(), "Downloading new archives");
    for (link, name) in missing {
        match fetcher.fetch(&link).await {
            Ok(bytes) => match bronze.put_object(&name, &bytes).await {
                Ok(()) => {
                    info!(file = %name, bytes = bytes.len(), "Saved archive to bronze");
                    report.downloaded.push(name);
                }
                Err(e) if e.is_fatal_for_run() => return Err(e),
                Err(e) => {
                    error!(file = %name, error = %e, "Could not store archive, skipping it");
                    report.failed.push(name);
                }
            },
            Err(e) => {
                error!(file = %name, url = %link, error = %e, "Download failed, skipping archive");
                report.failed.push(name);
            }
        }
    }

    Ok(report)
}

/// Runs only the bronze download stage.
pub async fn run_etl_pipeline(config_path: &str) -> Result<DownloadReport> {
    let settings = Settings::new(config_path)?;
    run_download(&settings).await
}

pub async fn run_download(settings: &Settings) -> Result<DownloadReport> {
    let source = StaticLinks::from_config(&settings.source);
    let fetcher = HttpFetcher::new(&settings.fetch)?;
    let bronze = LocalStorage::new(&settings.storage.bronze_path);

    download_to_bronze(&source, &fetcher, &bronze).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    struct FakeFetcher {
        fail_on: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Bytes> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.fail_on.as_deref() == Some(url) {
                return Err(common::Error::MaxRetriesExceeded);
            }
            Ok(Bytes::from(format!("zip bytes of {}", url)))
        }
    }

    fn link(month: &str) -> String {
        format!("https://example.org/mat/export_mensual_mat_{}.zip", month)
    }

    #[test]
    fn test_missing_links() {
        let links = vec![link("202401"), link("202402")];
        let bronze = vec!["export_mensual_mat_202401.zip".to_string()];

        let missing = missing_links(&links, &bronze);
        assert_eq!(
            missing,
            vec![(link("202402"), "export_mensual_mat_202402.zip".to_string())]
        );
    }

    #[tokio::test]
    async fn test_download_skips_existing_archives() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("export_mensual_mat_202401.zip"), b"old").unwrap();
        let bronze = LocalStorage::new(dir.path());
        let source = StaticLinks::new(vec![link("202401"), link("202402")]);
        let fetcher = FakeFetcher {
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        };

        let report = download_to_bronze(&source, &fetcher, &bronze).await.unwrap();

        assert_eq!(report.downloaded, vec!["export_mensual_mat_202402.zip"]);
        assert_eq!(*fetcher.calls.lock().unwrap(), vec![link("202402")]);
        assert_eq!(
            bronze.get_object("export_mensual_mat_202401.zip").await.unwrap(),
            b"old"
        );
    }

    #[tokio::test]
    async fn test_failed_download_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let bronze = LocalStorage::new(dir.path());
        let source = StaticLinks::new(vec![link("202401"), link("202402")]);
        let fetcher = FakeFetcher {
            fail_on: Some(link("202401")),
            calls: Mutex::new(Vec::new()),
        };

        let report = download_to_bronze(&source, &fetcher, &bronze).await.unwrap();

        assert_eq!(report.failed, vec!["export_mensual_mat_202401.zip"]);
        assert_eq!(report.downloaded, vec!["export_mensual_mat_202402.zip"]);
        assert!(!bronze.check_file_exists("export_mensual_mat_202401.zip").await.unwrap());
    }

    #[test]
    fn test_missing_links_only_zip_archives() {
        let links = vec![
            "https://example.org/mat/listado.html".to_string(),
            "https://example.org/mat/export_mensual_mat_202403.ZIP".to_string(),
        ];

        let missing = missing_links(&links, &[]);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].1, "export_mensual_mat_202403.ZIP");
    }

    #[tokio::test]
    async fn test_unstorable_archive_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let bronze = LocalStorage::new(dir.path());
        let hidden = "https://example.org/mat/.export_mensual_mat_202401.zip".to_string();
        let source = StaticLinks::new(vec![hidden, link("202402")]);
        let fetcher = FakeFetcher {
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        };

        let report = download_to_bronze(&source, &fetcher, &bronze).await.unwrap();

        assert_eq!(report.failed, vec![".export_mensual_mat_202401.zip"]);
        assert_eq!(report.downloaded, vec!["export_mensual_mat_202402.zip"]);
        assert!(bronze.check_file_exists("export_mensual_mat_202402.zip").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_bronze_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bronze = LocalStorage::new(dir.path().join("missing"));
        let source = StaticLinks::new(vec![link("202401")]);
        let fetcher = FakeFetcher {
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        };

        let err = download_to_bronze(&source, &fetcher, &bronze).await.unwrap_err();
        assert!(matches!(err, common::Error::StorageAccess(_)));
    }
}
