//! CSV import and CSV/Excel/JSON export against the deliveries file.

use std::path::Path;

use chrono::Utc;
use tracing::{error, info, warn};

use delivery_tracker_admin::config::AdminConfig;
use delivery_tracker_admin::db::DeliveryRepository;
use delivery_tracker_admin::services::export::{parse_csv, to_csv, to_json, to_xlsx};

pub use delivery_tracker_admin::services::export::{ExportOptions, ImportOptions};

use super::CommandError;

/// Import deliveries from a CSV file.
///
/// By default a single bad row aborts the import before anything is written.
/// With `skip_invalid` the valid rows are imported and the failures logged.
///
/// # Errors
///
/// Returns `CommandError::Invalid` for a rejected strict import, or an error
/// if either file cannot be read or written.
pub async fn import(
    config: &AdminConfig,
    path: &Path,
    options: ImportOptions,
    skip_invalid: bool,
) -> Result<usize, CommandError> {
    info!(path = %path.display(), "Importing deliveries");

    let bytes = tokio::fs::read(path).await?;
    let outcome = parse_csv(&bytes, &options);

    for message in &outcome.errors {
        error!("  - {message}");
    }
    if !outcome.is_clean() && !skip_invalid {
        return Err(CommandError::Invalid(outcome.errors.len()));
    }
    if !outcome.is_clean() {
        warn!(skipped = outcome.errors.len(), "Importing valid rows only");
    }

    let repo = DeliveryRepository::new(config.deliveries_file());
    let created = repo.create_many(outcome.data, Utc::now()).await?;

    info!("Import complete: {} deliveries", created.len());
    Ok(created.len())
}

/// Export every delivery to `path`. The extension picks the format.
///
/// # Errors
///
/// Returns `CommandError::UnsupportedFormat` for an unknown extension, or an
/// error if encoding fails or either file cannot be read or written.
pub async fn export(
    config: &AdminConfig,
    path: &Path,
    options: &ExportOptions,
) -> Result<usize, CommandError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let repo = DeliveryRepository::new(config.deliveries_file());
    let deliveries = repo.list().await?;

    let bytes = match extension.as_str() {
        "csv" | "tsv" | "txt" => to_csv(&deliveries, options)?,
        "xlsx" => to_xlsx(&deliveries)?,
        "json" => to_json(&deliveries)?,
        other => return Err(CommandError::UnsupportedFormat(other.to_owned())),
    };
    tokio::fs::write(path, bytes).await?;

    info!(path = %path.display(), "Exported {} deliveries", deliveries.len());
    Ok(deliveries.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CSV: &str = "名前,住所,ステータス,配送日\r\n\
        山田太郎,東京都千代田区1-1,配送待ち,2024-02-20\r\n\
        佐藤花子,大阪府大阪市2-2,配送中,2024-02-21\r\n\
        鈴木一郎,愛知県名古屋市3-3,紛失,2024-02-22\r\n";

    async fn setup() -> (tempfile::TempDir, AdminConfig, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let config = AdminConfig::local(dir.path());
        let file = dir.path().join("in.csv");
        tokio::fs::write(&file, CSV).await.unwrap();
        (dir, config, file)
    }

    #[tokio::test]
    async fn test_strict_import_writes_nothing() {
        let (_dir, config, file) = setup().await;

        let result = import(&config, &file, ImportOptions::default(), false).await;
        assert!(matches!(result, Err(CommandError::Invalid(1))));

        let repo = DeliveryRepository::new(config.deliveries_file());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skip_invalid_then_export() {
        let (dir, config, file) = setup().await;

        let imported = import(&config, &file, ImportOptions::default(), true)
            .await
            .unwrap();
        assert_eq!(imported, 2);

        let out = dir.path().join("out.csv");
        let exported = export(&config, &out, &ExportOptions::default()).await.unwrap();
        assert_eq!(exported, 2);
        let text = tokio::fs::read_to_string(&out).await.unwrap();
        assert!(text.contains("山田太郎"));

        let result = export(&config, &dir.path().join("out.pdf"), &ExportOptions::default()).await;
        assert!(matches!(result, Err(CommandError::UnsupportedFormat(_))));
    }
}
