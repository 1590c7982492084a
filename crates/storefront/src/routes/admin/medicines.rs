//! Admin catalog handlers.
//!
//! Create and update take `multipart/form-data` with the text fields `name`,
//! `description` and `price` and an optional file field `image`.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use tracing::instrument;

use devgon_core::{MedicineId, Price};

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::Medicine;
use crate::routes::Listing;
use crate::services::catalog::{ImageReplacement, MedicineInput, Upload};
use crate::state::AppState;

/// A parsed medicine form.
#[derive(Debug)]
struct MedicineForm {
    input: MedicineInput,
    image: Option<Upload>,
}

fn bad_multipart(e: &axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

fn parse_price(raw: &str) -> Result<Price, AppError> {
    raw.trim()
        .parse::<Decimal>()
        .map(Price::new)
        .map_err(|_| AppError::BadRequest("Price must be a number".to_string()))
}

async fn read_form(mut multipart: Multipart) -> Result<MedicineForm, AppError> {
    let mut name = String::new();
    let mut description = String::new();
    let mut price = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| bad_multipart(&e))? {
        let field_name = field.name().unwrap_or_default().to_owned();
        match field_name.as_str() {
            "name" => name = field.text().await.map_err(|e| bad_multipart(&e))?,
            "description" => description = field.text().await.map_err(|e| bad_multipart(&e))?,
            "price" => {
                let raw = field.text().await.map_err(|e| bad_multipart(&e))?;
                price = Some(parse_price(&raw)?);
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(|e| bad_multipart(&e))?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() && !bytes.is_empty() {
                    image = Some(Upload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let price = price.ok_or_else(|| AppError::BadRequest("Price is required".to_string()))?;
    Ok(MedicineForm {
        input: MedicineInput {
            name,
            description,
            price,
        },
        image,
    })
}

/// The catalog as the back office sees it.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<Listing<Medicine>> {
    Json(Listing::from_read("medicines", state.catalog().list().await))
}

/// Add a medicine.
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Medicine>), AppError> {
    let form = read_form(multipart).await?;
    let medicine = state.catalog().add(form.input, form.image).await?;
    Ok((StatusCode::CREATED, Json(medicine)))
}

/// Update a medicine. Without a new image the stored one is kept.
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<MedicineId>,
    multipart: Multipart,
) -> Result<Json<Medicine>, AppError> {
    let form = read_form(multipart).await?;
    let image = form
        .image
        .map_or(ImageReplacement::Keep, ImageReplacement::Replace);
    Ok(Json(state.catalog().update(&id, form.input, image).await?))
}

/// Delete a medicine.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<MedicineId>,
) -> Result<StatusCode, AppError> {
    state.catalog().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
