use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};
use uuid::Uuid;

use storefront_db::models::SaleItemRow;
use storefront_types::api::{SaleItemListResponse, SaleItemResponse};
use storefront_types::models::SaleItem;
use storefront_types::validation::{ImageRejection, check_image, check_sale_item, image_extension};

use crate::auth::AppState;
use crate::blob::PutOptions;
use crate::error::{ApiError, blocking};
use crate::middleware::CurrentUser;
use crate::multipart::{FormData, UploadedFile};
use crate::views;

const CREATE_FAILED: &str = "Failed to create sale item. Please try again later.";
const LOAD_FAILED: &str = "Failed to load sale items. Please try again later.";

/// Text fields of the sale item form, as submitted.
#[derive(Debug, Clone, Default)]
pub struct NewSaleItem {
    pub name: String,
    pub original_price: String,
    pub sale_price: String,
    /// 0 when missing or unparseable, which the rating rule rejects.
    pub rating: u8,
}

impl NewSaleItem {
    fn from_form(form: &FormData) -> Self {
        Self {
            name: form.text("name").to_string(),
            original_price: form.text("originalPrice").to_string(),
            sale_price: form.text("salePrice").to_string(),
            rating: form.text("rating").trim().parse().unwrap_or(0),
        }
    }
}

pub fn sale_item_path(item_id: Uuid, millis: i64, file_name: Option<&str>) -> String {
    format!("sale-items/item_{}_{}.{}", item_id, millis, image_extension(file_name))
}

/// Editor-or-above only. All checks run before the image is stored.
pub async fn create_sale_item(
    state: &AppState,
    user: &CurrentUser,
    item: NewSaleItem,
    image: Option<UploadedFile>,
) -> Result<SaleItem, ApiError> {
    if !user.role.can_manage_sale_items() {
        warn!("{} tried to create a sale item as {}", user.username, user.role);
        return Err(ApiError::Permission("You don't have permission to manage sale items"));
    }

    let (original_price_cents, sale_price_cents) =
        check_sale_item(&item.name, &item.original_price, &item.sale_price, item.rating)?;

    let image = match image {
        Some(image) if image.size() > 0 => image,
        _ => return Err(ImageRejection::Missing("product").into()),
    };
    check_image("product", image.size(), image.content_type.as_deref())?;

    let item_id = Uuid::new_v4();
    let path = sale_item_path(item_id, chrono::Utc::now().timestamp_millis(), image.file_name.as_deref());
    let stored = state
        .blobs
        .put(&path, image.bytes, PutOptions::public(image.content_type.as_deref()))
        .await
        .map_err(ApiError::storage("Failed to upload product image"))?;
    if stored.url.is_empty() {
        return Err(ApiError::Upstream("Failed to get URL from blob storage"));
    }

    let row = SaleItemRow {
        id: item_id.to_string(),
        name: item.name.trim().to_string(),
        original_price_cents,
        sale_price_cents,
        image_url: stored.url,
        rating: i64::from(item.rating),
        created_by: user.id.to_string(),
        created_at: storefront_db::now_timestamp(),
    };

    let db = state.clone();
    let row = blocking(move || {
        db.db.insert_sale_item(&row).map_err(ApiError::database(CREATE_FAILED))?;
        Ok(row)
    })
    .await?;

    info!("Sale item {} created by {}", item_id, user.username);
    views::sale_item(row).map_err(ApiError::database(CREATE_FAILED))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = FormData::read(&mut multipart).await?;
    let item = NewSaleItem::from_form(&form);
    let image = form.take_file("image");

    let item = create_sale_item(&state, &user, item, image).await?;
    Ok((StatusCode::CREATED, Json(SaleItemResponse { success: true, item })))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.get_sale_items().map_err(ApiError::database(LOAD_FAILED))).await?;

    let items = rows
        .into_iter()
        .map(views::sale_item)
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(ApiError::database(LOAD_FAILED))?;
    Ok(Json(SaleItemListResponse { success: true, items }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_path_shape() {
        let id = Uuid::nil();
        assert_eq!(
            sale_item_path(id, 42, Some("shoe.WEBP")),
            "sale-items/item_00000000-0000-0000-0000-000000000000_42.webp"
        );
    }

    #[test]
    fn bad_rating_text_becomes_zero() {
        let item = NewSaleItem::from_form(&FormData::default());
        assert_eq!(item.rating, 0);
        assert_eq!(item.name, "");
    }
}
