//! Seed the deliveries file from YAML.
//!
//! ```yaml
//! deliveries:
//!   - name: 山田太郎
//!     address: 東京都千代田区1-1
//!     status: pending
//!     deliveryDate: 2024-02-20
//! ```
//!
//! Statuses and dates are checked while parsing; blank names or addresses are
//! reported per entry. Nothing is written unless every entry is valid.

use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use delivery_tracker_admin::config::AdminConfig;
use delivery_tracker_admin::db::DeliveryRepository;
use delivery_tracker_core::NewDelivery;

use super::CommandError;

#[derive(Debug, Deserialize)]
struct SeedFile {
    deliveries: Vec<NewDelivery>,
}

/// Parse and validate a seed document.
///
/// # Errors
///
/// Returns `CommandError::Yaml` for malformed YAML, an unknown status or an
/// invalid date, and `CommandError::Invalid` for blank fields.
pub fn parse(content: &str) -> Result<Vec<NewDelivery>, CommandError> {
    let file: SeedFile = serde_yaml::from_str(content)?;

    let mut invalid = 0;
    for (index, delivery) in file.deliveries.iter().enumerate() {
        if let Err(e) = delivery.validate() {
            error!("  - deliveries[{index}]: {e}");
            invalid += 1;
        }
    }

    if invalid > 0 {
        return Err(CommandError::Invalid(invalid));
    }
    Ok(file.deliveries)
}

/// Load deliveries from `file` into the data directory.
///
/// With `replace`, existing deliveries are dropped first.
///
/// # Errors
///
/// Returns an error if the file cannot be read, fails validation, or the
/// deliveries file cannot be written.
pub async fn deliveries(
    config: &AdminConfig,
    file: &Path,
    replace: bool,
) -> Result<(), CommandError> {
    info!(path = %file.display(), "Loading deliveries from file");

    let content = tokio::fs::read_to_string(file).await?;
    let batch = parse(&content)?;

    let repo = DeliveryRepository::new(config.deliveries_file());
    if replace {
        repo.replace_all(&[]).await?;
        info!("Existing deliveries cleared");
    }

    let created = repo.create_many(batch, Utc::now()).await?;

    info!("Seeding complete!");
    info!("  Deliveries created: {}", created.len());
    Ok(())
}
