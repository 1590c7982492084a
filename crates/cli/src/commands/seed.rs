//! Catalog seeding from YAML.
//!
//! ```yaml
//! medicines:
//!   - name: Ashwagandha Churna
//!     description: Stress and sleep support
//!     price: 249
//!     image_url: https://cdn.devgon.in/ashwagandha.png
//!   - name: Triphala Tablets
//!     price: 180.50
//! ```
//!
//! Medicines whose name is already in the catalog (case-insensitive) are
//! skipped, so the same file can be applied repeatedly.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use devgon_core::Price;
use devgon_storefront::backend::blob::MemoryBlobStore;
use devgon_storefront::backend::postgres::PostgresDocumentStore;
use devgon_storefront::backend::{DocumentStore, to_record};
use devgon_storefront::models::collections::MEDICINES;
use devgon_storefront::models::{Medicine, MedicineRecord};
use devgon_storefront::services::catalog::CatalogService;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub medicines: Vec<SeedMedicine>,
}

/// One medicine in the seed file.
#[derive(Debug, Deserialize)]
pub struct SeedMedicine {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Check every entry, returning one message per problem.
fn validate(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (index, medicine) in seed.medicines.iter().enumerate() {
        let name = medicine.name.trim();
        if name.is_empty() {
            errors.push(format!("entry {}: name is required", index + 1));
        } else if !seen.insert(name.to_lowercase()) {
            errors.push(format!("entry {}: duplicate name {name}", index + 1));
        }
        if medicine.price <= Decimal::ZERO {
            errors.push(format!("entry {}: price must be greater than zero", index + 1));
        }
    }
    errors
}

/// Records to insert: seed entries whose name is not yet in the catalog.
fn plan(existing: &[Medicine], seed: CatalogSeed) -> Vec<MedicineRecord> {
    let present: HashSet<String> = existing
        .iter()
        .map(|m| m.record.name.trim().to_lowercase())
        .collect();

    seed.medicines
        .into_iter()
        .filter(|m| !present.contains(&m.name.trim().to_lowercase()))
        .map(|m| MedicineRecord {
            name: m.name.trim().to_owned(),
            description: m.description.trim().to_owned(),
            price: Price::new(m.price),
            image_url: m.image_url.filter(|url| !url.trim().is_empty()),
        })
        .collect()
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a store call fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }
    info!(medicines = seed.medicines.len(), "Catalog validated");

    let pool = super::connect().await?;
    let store = PostgresDocumentStore::new(pool);

    // Seed entries carry image URLs, never uploads.
    let blobs = MemoryBlobStore::new();
    let existing = CatalogService::new(&store, &blobs).list().await?;

    let total = seed.medicines.len();
    let records = plan(&existing, seed);
    let inserted = records.len();
    for record in records {
        store.create(MEDICINES, to_record(&record)?).await?;
    }

    info!("Seeding complete!");
    info!("  Medicines inserted: {inserted}");
    info!("  Medicines skipped (already exist): {}", total - inserted);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use devgon_core::MedicineId;

    use super::*;

    const SEED: &str = "
medicines:
  - name: Ashwagandha Churna
    description: Stress and sleep support
    price: 249
    image_url: https://cdn.devgon.in/ashwagandha.png
  - name: Triphala Tablets
    price: 180.50
";

    #[test]
    fn test_parse_and_validate() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();
        assert_eq!(seed.medicines.len(), 2);
        assert_eq!(seed.medicines[1].description, "");
        assert!(validate(&seed).is_empty());
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let seed: CatalogSeed = serde_yaml::from_str(
            "
medicines:
  - name: ' '
    price: 10
  - name: Neem
    price: 0
  - name: neem
    price: 5
",
        )
        .unwrap();
        let errors = validate(&seed);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("name is required"));
        assert!(errors[1].contains("price"));
        assert!(errors[2].contains("duplicate"));
    }

    #[test]
    fn test_plan_skips_existing_names() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();
        let existing = vec![Medicine {
            id: MedicineId::new("m1"),
            record: MedicineRecord {
                name: "triphala tablets".to_owned(),
                description: String::new(),
                price: Price::from_rupees(150),
                image_url: None,
            },
        }];

        let records = plan(&existing, seed);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Ashwagandha Churna");
        assert_eq!(records[0].price, Price::from_rupees(249));
        assert!(records[0].image_url.is_some());
    }
}
