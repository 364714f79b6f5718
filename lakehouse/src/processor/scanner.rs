use crate::utils::paths::{file_stem, has_extension, with_extension};
use common::storage::ObjectStorage;
use common::Result;
use std::collections::HashSet;
use tracing::info;

/// Extension change between a source tier and its target tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionMap {
    pub source: &'static str,
    pub target: &'static str,
}

impl ExtensionMap {
    pub const BRONZE_TO_SILVER: ExtensionMap = ExtensionMap {
        source: "zip",
        target: "parquet",
    };

    pub const SILVER_TO_GOLD: ExtensionMap = ExtensionMap {
        source: "parquet",
        target: "parquet",
    };

    pub fn target_name(&self, source_name: &str) -> String {
        with_extension(source_name, self.target)
    }
}

/// Files with `extension` in one tier, sorted by name.
pub async fn list_tier(storage: &dyn ObjectStorage, extension: &str) -> Result<Vec<String>> {
    let files: Vec<String> = storage
        .list_objects()
        .await?
        .into_iter()
        .filter(|name| has_extension(name, extension))
        .collect();

    info!(tier = %storage.location(), extension, count = files.len(), "Listed tier");
    Ok(files)
}

/// Source files that have no artifact of the same stem in the target listing.
///
/// Presence by name is the only completeness signal; target contents are not inspected.
pub fn find_missing(source: &[String], target: &[String], extensions: &ExtensionMap) -> Vec<String> {
    let produced: HashSet<&str> = target
        .iter()
        .filter(|name| has_extension(name, extensions.target))
        .map(|name| file_stem(name))
        .collect();

    let mut missing: Vec<String> = source
        .iter()
        .filter(|name| has_extension(name, extensions.source))
        .filter(|name| !produced.contains(file_stem(name)))
        .cloned()
        .collect();

    missing.sort();
    missing
}

/// Lists both tiers and diffs them.
pub async fn scan_missing(
    source: &dyn ObjectStorage,
    target: &dyn ObjectStorage,
    extensions: &ExtensionMap,
) -> Result<Vec<String>> {
    let source_files = list_tier(source, extensions.source).await?;
    let target_files = list_tier(target, extensions.target).await?;
    Ok(find_missing(&source_files, &target_files, extensions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::LocalStorage;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_missing_bronze_to_silver() {
        let bronze = names(&[
            "export_mensual_mat_202402.zip",
            "export_mensual_mat_202401.zip",
            "export_mensual_mat_202403.zip",
        ]);
        let silver = names(&["export_mensual_mat_202401.parquet"]);

        let missing = find_missing(&bronze, &silver, &ExtensionMap::BRONZE_TO_SILVER);
        assert_eq!(
            missing,
            names(&["export_mensual_mat_202402.zip", "export_mensual_mat_202403.zip"])
        );
    }

    #[test]
    fn test_find_missing_ignores_other_extensions() {
        let bronze = names(&["notes.txt", "export_mensual_mat_202401.zip"]);
        let silver = names(&["export_mensual_mat_202401.csv"]);

        let missing = find_missing(&bronze, &silver, &ExtensionMap::BRONZE_TO_SILVER);
        assert_eq!(missing, names(&["export_mensual_mat_202401.zip"]));
    }

    #[test]
    fn test_find_missing_nothing_to_do() {
        let silver = names(&["a.parquet", "b.parquet"]);
        let gold = names(&["b.parquet", "a.parquet"]);

        assert!(find_missing(&silver, &gold, &ExtensionMap::SILVER_TO_GOLD).is_empty());
        assert_eq!(ExtensionMap::BRONZE_TO_SILVER.target_name("a.zip"), "a.parquet");
    }

    #[tokio::test]
    async fn test_scan_missing_requires_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.zip"), b"zip").unwrap();
        let bronze = LocalStorage::new(dir.path());
        let silver = LocalStorage::new(dir.path().join("silver"));

        let err = scan_missing(&bronze, &silver, &ExtensionMap::BRONZE_TO_SILVER)
            .await
            .unwrap_err();
        assert!(matches!(err, common::Error::StorageAccess(_)));

        std::fs::create_dir(dir.path().join("silver")).unwrap();
        let missing = scan_missing(&bronze, &silver, &ExtensionMap::BRONZE_TO_SILVER)
            .await
            .unwrap();
        assert_eq!(missing, names(&["a.zip"]));
    }
}
