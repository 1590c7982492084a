//! Catalog records (`medicines` collection).

use serde::{Deserialize, Serialize};

use devgon_core::{CartProduct, MedicineId, Price};

/// The persisted body of a catalog item.
///
/// A medicine without an image is stored with `imageUrl: ""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default, with = "blank_as_none")]
    pub image_url: Option<String>,
}

/// Persisted field names.
pub mod fields {
    pub const NAME: &str = "name";
    pub const IMAGE_URL: &str = "imageUrl";
}

/// A stored catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medicine {
    pub id: MedicineId,
    #[serde(flatten)]
    pub record: MedicineRecord,
}

impl Medicine {
    /// The fields a cart entry snapshots.
    #[must_use]
    pub fn to_cart_product(&self) -> CartProduct {
        CartProduct {
            id: self.id.clone(),
            name: self.record.name.clone(),
            unit_price: self.record.price,
            image_url: self.record.image_url.clone(),
        }
    }
}

/// `None` ⇄ `""` (or `null` on read).
mod blank_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or_default())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.filter(|url| !url.trim().is_empty()))
    }
}
