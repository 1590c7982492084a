//! Catalog management (`medicines` collection).
//!
//! Images go to the blob store first; the record only changes once the upload
//! has succeeded.

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use devgon_core::{MedicineId, Price};

use crate::backend::{
    BlobError, BlobStore, Direction, DocumentStore, Query, Record, StoreError, decode_listing,
    to_record,
};
use crate::models::collections::MEDICINES;
use crate::models::medicine::fields;
use crate::models::{Medicine, MedicineRecord};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("medicine name is required")]
    MissingName,

    #[error("price must be greater than zero")]
    InvalidPrice,

    #[error("medicine {0} not found")]
    NotFound(MedicineId),

    #[error("image upload failed: {0}")]
    Upload(#[from] BlobError),

    #[error("catalog unavailable: {0}")]
    Backend(#[from] StoreError),
}

/// Editable catalog fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineInput {
    pub name: String,
    pub description: String,
    pub price: Price,
}

impl MedicineInput {
    fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::MissingName);
        }
        if !self.price.is_positive() {
            return Err(CatalogError::InvalidPrice);
        }
        Ok(())
    }
}

/// An uploaded image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// What to do with a medicine's image on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReplacement {
    /// Leave the stored image URL untouched.
    Keep,
    /// Upload a new image and point the record at it.
    Replace(Upload),
}

/// Blob path for an uploaded image: `medicines/{epoch_millis}_{file name}`.
fn image_path(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let mut clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if clean.trim_matches('.').is_empty() {
        clean = "image".to_owned();
    }
    format!("medicines/{}_{clean}", Utc::now().timestamp_millis())
}

/// Catalog service.
pub struct CatalogService<'a> {
    store: &'a dyn DocumentStore,
    blobs: &'a dyn BlobStore,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, blobs: &'a dyn BlobStore) -> Self {
        Self { store, blobs }
    }

    /// All medicines ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Medicine>, CatalogError> {
        let query = Query::new().order_by(fields::NAME, Direction::Ascending);
        let docs = self.store.query(MEDICINES, &query).await?;

        Ok(decode_listing(&docs, |doc| {
            Ok(Medicine {
                id: MedicineId::new(doc.id.clone()),
                record: doc.decode()?,
            })
        }))
    }

    /// Number of catalog entries.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Backend` if the query fails.
    pub async fn count(&self) -> Result<usize, CatalogError> {
        Ok(self.store.query(MEDICINES, &Query::new()).await?.len())
    }

    /// A single medicine.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Backend` if the read fails.
    pub async fn get(&self, id: &MedicineId) -> Result<Option<Medicine>, CatalogError> {
        let Some(doc) = self.store.get(MEDICINES, id.as_str()).await? else {
            return Ok(None);
        };
        Ok(Some(Medicine {
            id: id.clone(),
            record: doc.decode()?,
        }))
    }

    /// Add a medicine, uploading its image first when one is given.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `CatalogError::Upload` if the image
    /// cannot be stored, or `CatalogError::Backend` if the write fails.
    #[instrument(skip(self, input, image), fields(name = %input.name))]
    pub async fn add(
        &self,
        input: MedicineInput,
        image: Option<Upload>,
    ) -> Result<Medicine, CatalogError> {
        input.validate()?;

        let image_url = match image {
            Some(upload) => Some(self.upload(upload).await?),
            None => None,
        };

        let record = MedicineRecord {
            name: input.name.trim().to_owned(),
            description: input.description.trim().to_owned(),
            price: input.price,
            image_url,
        };
        let doc = self.store.create(MEDICINES, to_record(&record)?).await?;

        tracing::info!(medicine_id = %doc.id, "Medicine added");
        Ok(Medicine {
            id: MedicineId::new(doc.id),
            record,
        })
    }

    /// Update a medicine's fields and, optionally, its image.
    ///
    /// With [`ImageReplacement::Keep`] the stored `imageUrl` is not part of
    /// the write at all.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `CatalogError::NotFound` if the medicine
    /// does not exist, `CatalogError::Upload` or `CatalogError::Backend`.
    #[instrument(skip(self, input, image))]
    pub async fn update(
        &self,
        id: &MedicineId,
        input: MedicineInput,
        image: ImageReplacement,
    ) -> Result<Medicine, CatalogError> {
        input.validate()?;

        let mut current = self
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        current.record.name = input.name.trim().to_owned();
        current.record.description = input.description.trim().to_owned();
        current.record.price = input.price;

        let mut changes = to_record(&current.record)?;
        match image {
            ImageReplacement::Keep => {
                changes.remove(fields::IMAGE_URL);
            }
            ImageReplacement::Replace(upload) => {
                let url = self.upload(upload).await?;
                changes.insert(fields::IMAGE_URL.to_owned(), Value::from(url.as_str()));
                current.record.image_url = Some(url);
            }
        }

        self.write(id, changes).await?;
        tracing::info!("Medicine updated");
        Ok(current)
    }

    /// Remove a medicine. Its image is left in the blob store.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the medicine does not exist, or
    /// `CatalogError::Backend` if a store call fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &MedicineId) -> Result<(), CatalogError> {
        if self.store.get(MEDICINES, id.as_str()).await?.is_none() {
            return Err(CatalogError::NotFound(id.clone()));
        }
        self.store.delete(MEDICINES, id.as_str()).await?;
        tracing::info!("Medicine deleted");
        Ok(())
    }

    async fn upload(&self, upload: Upload) -> Result<String, CatalogError> {
        let path = image_path(&upload.file_name);
        Ok(self.blobs.upload(&path, upload.bytes).await?)
    }

    async fn write(&self, id: &MedicineId, changes: Record) -> Result<(), CatalogError> {
        self.store
            .update(MEDICINES, id.as_str(), changes, None)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => CatalogError::NotFound(id.clone()),
                other => CatalogError::Backend(other),
            })?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::blob::MemoryBlobStore;
    use crate::backend::memory::MemoryDocumentStore;

    fn input(name: &str, rupees: i64) -> MedicineInput {
        MedicineInput {
            name: name.to_owned(),
            description: format!("{name} tablets"),
            price: Price::from_rupees(rupees),
        }
    }

    fn upload(name: &str) -> Upload {
        Upload {
            file_name: name.to_owned(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    #[test]
    fn test_image_path() {
        let path = image_path("C:\\Users\\me\\Neem leaf (1).png");
        assert!(path.starts_with("medicines/"));
        assert!(path.ends_with("_Neem_leaf__1_.png"));

        assert!(image_path("../..").ends_with("_image"));
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_name() {
        let store = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let catalog = CatalogService::new(&store, &blobs);

        for (name, price) in [("Triphala", 150), ("Ashwagandha", 300), ("Neem", 80)] {
            catalog.add(input(name, price), None).await.unwrap();
        }

        let names: Vec<String> = catalog
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.record.name)
            .collect();
        assert_eq!(names, vec!["Ashwagandha", "Neem", "Triphala"]);
        assert_eq!(catalog.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_skips_undecodable_medicine() {
        let store = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let catalog = CatalogService::new(&store, &blobs);
        catalog.add(input("Neem", 80), None).await.unwrap();
        let no_price = serde_json::json!({ "name": "Brahmi" });
        store
            .put(MEDICINES, "m-broken", no_price.as_object().unwrap().clone())
            .await
            .unwrap();

        let listed = catalog.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].record.name, "Neem");
    }

    #[tokio::test]
    async fn test_add_validates() {
        let store = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let catalog = CatalogService::new(&store, &blobs);

        assert!(matches!(
            catalog.add(input("  ", 10), None).await,
            Err(CatalogError::MissingName)
        ));
        assert!(matches!(
            catalog.add(input("Neem", 0), Some(upload("neem.png"))).await,
            Err(CatalogError::InvalidPrice)
        ));
        assert_eq!(blobs.count().await, 0);
        assert_eq!(store.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_add_with_image() {
        let store = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let catalog = CatalogService::new(&store, &blobs);

        let medicine = catalog
            .add(input("Tulsi", 95), Some(upload("tulsi.png")))
            .await
            .unwrap();

        let url = medicine.record.image_url.clone().unwrap();
        assert!(url.starts_with("memory://blobs/medicines/"));
        assert!(url.ends_with("_tulsi.png"));
        assert_eq!(blobs.count().await, 1);
    }

    #[tokio::test]
    async fn test_update_keep_preserves_image() {
        let store = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let catalog = CatalogService::new(&store, &blobs);

        let original = catalog
            .add(input("Tulsi", 95), Some(upload("tulsi.png")))
            .await
            .unwrap();

        let updated = catalog
            .update(&original.id, input("Tulsi Drops", 120), ImageReplacement::Keep)
            .await
            .unwrap();

        assert_eq!(updated.record.image_url, original.record.image_url);
        let stored = catalog.get(&original.id).await.unwrap().unwrap();
        assert_eq!(stored.record.name, "Tulsi Drops");
        assert_eq!(stored.record.price, Price::from_rupees(120));
        assert_eq!(stored.record.image_url, original.record.image_url);
        assert_eq!(blobs.count().await, 1);
    }

    #[tokio::test]
    async fn test_update_replace_uploads_new_image() {
        let store = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let catalog = CatalogService::new(&store, &blobs);

        let original = catalog.add(input("Amla", 60), None).await.unwrap();
        let updated = catalog
            .update(
                &original.id,
                input("Amla", 60),
                ImageReplacement::Replace(upload("amla.jpg")),
            )
            .await
            .unwrap();

        let stored = catalog.get(&original.id).await.unwrap().unwrap();
        assert!(stored.record.image_url.is_some());
        assert_eq!(stored.record.image_url, updated.record.image_url);
    }

    #[tokio::test]
    async fn test_unavailable_store_skips_upload() {
        let store = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let catalog = CatalogService::new(&store, &blobs);

        let original = catalog.add(input("Amla", 60), None).await.unwrap();

        store.set_unavailable(true);
        let err = catalog
            .update(
                &original.id,
                input("Amla", 70),
                ImageReplacement::Replace(upload("amla.jpg")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Backend(StoreError::Unavailable(_))));
        store.set_unavailable(false);

        let stored = catalog.get(&original.id).await.unwrap().unwrap();
        assert_eq!(stored.record.price, Price::from_rupees(60));
        assert_eq!(blobs.count().await, 0);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let store = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let catalog = CatalogService::new(&store, &blobs);
        let ghost = MedicineId::new("ghost");

        assert!(matches!(
            catalog
                .update(&ghost, input("X", 1), ImageReplacement::Keep)
                .await,
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog.delete(&ghost).await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryDocumentStore::new();
        let blobs = MemoryBlobStore::new();
        let catalog = CatalogService::new(&store, &blobs);

        let medicine = catalog.add(input("Neem", 80), None).await.unwrap();
        catalog.delete(&medicine.id).await.unwrap();
        assert!(catalog.get(&medicine.id).await.unwrap().is_none());
    }
}
