//! Delivery store backed by a single JSON file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::instrument;

use delivery_tracker_core::{Delivery, DeliveryId, DeliveryPatch, DeliveryStatus, NewDelivery};

use super::{RepositoryError, read_json, write_json};

/// Result of a single-record update.
#[derive(Debug, Clone)]
pub struct Updated {
    /// The record as it was before the update.
    pub previous: Delivery,
    /// The record as persisted.
    pub current: Delivery,
}

/// Repository for delivery records.
///
/// Every call reads the whole file. Mutations hold `write_lock` across their
/// read-modify-write cycle, so concurrent requests in this process never lose
/// each other's changes. Other processes writing the same file still race
/// with last-write-wins.
#[derive(Debug)]
pub struct DeliveryRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl DeliveryRepository {
    /// Create a repository for the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List every delivery in file order.
    ///
    /// Creates an empty file on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the file cannot be read or created,
    /// or `RepositoryError::DataCorruption` if it is not a delivery array.
    pub async fn list(&self) -> Result<Vec<Delivery>, RepositoryError> {
        if let Some(deliveries) = read_json(&self.path).await? {
            return Ok(deliveries);
        }

        let _guard = self.write_lock.lock().await;
        // Another writer may have created it while we waited.
        if let Some(deliveries) = read_json(&self.path).await? {
            return Ok(deliveries);
        }
        tracing::info!(path = %self.path.display(), "Creating empty deliveries file");
        write_json(&self.path, &Vec::<Delivery>::new()).await?;
        Ok(Vec::new())
    }

    /// Get a delivery by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no delivery has that id.
    pub async fn get(&self, id: &DeliveryId) -> Result<Delivery, RepositoryError> {
        self.list()
            .await?
            .into_iter()
            .find(|d| &d.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    /// Check that the file is readable.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if listing fails.
    pub async fn readiness(&self) -> Result<(), RepositoryError> {
        self.list().await.map(|_| ())
    }

    /// Create a delivery with an id derived from `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    #[instrument(skip(self, new), fields(path = %self.path.display()))]
    pub async fn create(
        &self,
        new: NewDelivery,
        now: DateTime<Utc>,
    ) -> Result<Delivery, RepositoryError> {
        let mut created = self.create_many(vec![new], now).await?;
        created.pop().ok_or(RepositoryError::NotFound)
    }

    /// Create several deliveries in one write.
    ///
    /// Ids start at `now` in milliseconds and are bumped past any id already
    /// taken, so a batch never collides with itself or existing records.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    #[instrument(skip(self, batch), fields(count = batch.len()))]
    pub async fn create_many(
        &self,
        batch: Vec<NewDelivery>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Delivery>, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut deliveries = self.load().await?;

        let mut taken: HashSet<String> = deliveries.iter().map(|d| d.id.to_string()).collect();
        let mut millis = now.timestamp_millis();
        let mut created = Vec::with_capacity(batch.len());

        for new in batch {
            let id = loop {
                let candidate = DeliveryId::from_timestamp(millis);
                millis += 1;
                if taken.insert(candidate.to_string()) {
                    break candidate;
                }
            };
            created.push(Delivery::from_new(id, new));
        }

        deliveries.extend(created.iter().cloned());
        write_json(&self.path, &deliveries).await?;

        tracing::info!(count = created.len(), "Deliveries created");
        Ok(created)
    }

    /// Apply a patch to one delivery.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no delivery has that id.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: &DeliveryId,
        patch: DeliveryPatch,
    ) -> Result<Updated, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut deliveries = self.load().await?;

        let delivery = deliveries
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or(RepositoryError::NotFound)?;
        let previous = delivery.clone();
        delivery.apply(patch);
        let current = delivery.clone();

        write_json(&self.path, &deliveries).await?;
        Ok(Updated { previous, current })
    }

    /// Delete one delivery and return it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no delivery has that id.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &DeliveryId) -> Result<Delivery, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut deliveries = self.load().await?;

        let index = deliveries
            .iter()
            .position(|d| &d.id == id)
            .ok_or(RepositoryError::NotFound)?;
        let removed = deliveries.remove(index);

        write_json(&self.path, &deliveries).await?;
        Ok(removed)
    }

    /// Delete every delivery whose id is in `ids`; returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn delete_many(&self, ids: &[DeliveryId]) -> Result<usize, RepositoryError> {
        let wanted: HashSet<&DeliveryId> = ids.iter().collect();
        let _guard = self.write_lock.lock().await;
        let mut deliveries = self.load().await?;

        let before = deliveries.len();
        deliveries.retain(|d| !wanted.contains(&d.id));
        let removed = before - deliveries.len();

        if removed > 0 {
            write_json(&self.path, &deliveries).await?;
        }
        Ok(removed)
    }

    /// Set the status of every delivery whose id is in `ids`; returns how many matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn set_status_many(
        &self,
        ids: &[DeliveryId],
        status: DeliveryStatus,
    ) -> Result<usize, RepositoryError> {
        let wanted: HashSet<&DeliveryId> = ids.iter().collect();
        let _guard = self.write_lock.lock().await;
        let mut deliveries = self.load().await?;

        let mut matched = 0;
        for delivery in deliveries.iter_mut().filter(|d| wanted.contains(&d.id)) {
            delivery.status = status;
            matched += 1;
        }

        if matched > 0 {
            write_json(&self.path, &deliveries).await?;
        }
        Ok(matched)
    }

    /// Replace the whole collection, e.g. on restore.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if two records share an id, or an
    /// I/O error if the file cannot be written.
    #[instrument(skip(self, deliveries), fields(count = deliveries.len()))]
    pub async fn replace_all(&self, deliveries: &[Delivery]) -> Result<(), RepositoryError> {
        let mut seen = HashSet::new();
        if let Some(dup) = deliveries.iter().find(|d| !seen.insert(&d.id)) {
            return Err(RepositoryError::Conflict(format!("duplicate id {}", dup.id)));
        }

        let _guard = self.write_lock.lock().await;
        write_json(&self.path, deliveries).await
    }

    /// Read the file without creating it; callers hold `write_lock`.
    async fn load(&self) -> Result<Vec<Delivery>, RepositoryError> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use delivery_tracker_core::DeliveryDate;

    use super::*;

    fn new_delivery(name: &str) -> NewDelivery {
        NewDelivery {
            name: name.to_string(),
            address: "大阪府大阪市北区1-2-3".to_string(),
            status: DeliveryStatus::Pending,
            delivery_date: DeliveryDate::parse("2024-02-20").unwrap(),
        }
    }

    fn at_millis(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[tokio::test]
    async fn test_list_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DeliveryRepository::new(dir.path().join("sub/deliveries.json"));

        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.path().exists());
    }

    #[tokio::test]
    async fn test_create_generates_timestamp_id() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DeliveryRepository::new(dir.path().join("deliveries.json"));

        let created = repo.create(new_delivery("A"), at_millis(1_000)).await.unwrap();
        assert_eq!(created.id.as_str(), "DEL1000");
        assert_eq!(repo.list().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_create_many_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DeliveryRepository::new(dir.path().join("deliveries.json"));

        repo.create(new_delivery("A"), at_millis(5)).await.unwrap();
        let batch = repo
            .create_many(vec![new_delivery("B"), new_delivery("C")], at_millis(5))
            .await
            .unwrap();

        let ids: Vec<_> = batch.iter().map(|d| d.id.to_string()).collect();
        assert_eq!(ids, vec!["DEL6", "DEL7"]);
    }

    #[tokio::test]
    async fn test_update_returns_previous_and_current() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DeliveryRepository::new(dir.path().join("deliveries.json"));
        let created = repo.create(new_delivery("A"), at_millis(1)).await.unwrap();

        let updated = repo
            .update(&created.id, DeliveryPatch::status_only(DeliveryStatus::Completed))
            .await
            .unwrap();

        assert_eq!(updated.previous.status, DeliveryStatus::Pending);
        assert_eq!(updated.current.status, DeliveryStatus::Completed);
        assert_eq!(repo.get(&created.id).await.unwrap().status, DeliveryStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_id() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DeliveryRepository::new(dir.path().join("deliveries.json"));
        let missing = DeliveryId::new("DEL404");

        assert!(matches!(
            repo.update(&missing, DeliveryPatch::default()).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(repo.delete(&missing).await, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_bulk_operations() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DeliveryRepository::new(dir.path().join("deliveries.json"));
        let created = repo
            .create_many(
                vec![new_delivery("A"), new_delivery("B"), new_delivery("C")],
                at_millis(10),
            )
            .await
            .unwrap();

        let ids = vec![created[0].id.clone(), created[1].id.clone(), DeliveryId::new("nope")];
        assert_eq!(repo.set_status_many(&ids, DeliveryStatus::InTransit).await.unwrap(), 2);
        assert_eq!(repo.delete_many(&ids).await.unwrap(), 2);

        let remaining = repo.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "C");
    }

    #[tokio::test]
    async fn test_replace_all_rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repo = DeliveryRepository::new(dir.path().join("deliveries.json"));
        let a = Delivery::from_new(DeliveryId::new("X"), new_delivery("A"));
        let b = Delivery::from_new(DeliveryId::new("X"), new_delivery("B"));

        assert!(matches!(
            repo.replace_all(&[a, b]).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(DeliveryRepository::new(dir.path().join("deliveries.json")));

        let mut handles = Vec::new();
        for i in 0..10 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.create(new_delivery(&format!("N{i}")), at_millis(100))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(repo.list().await.unwrap().len(), 10);
    }
}
