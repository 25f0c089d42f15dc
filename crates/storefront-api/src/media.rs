use axum::{
    Extension, Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use storefront_db::Database;
use storefront_types::api::{MediaUploadResponse, SuccessResponse};
use storefront_types::models::MediaKind;
use storefront_types::validation::{ImageRejection, check_profile_image, image_extension};

use crate::auth::AppState;
use crate::blob::PutOptions;
use crate::error::{ApiError, blocking};
use crate::middleware::CurrentUser;
use crate::multipart::{FormData, UploadedFile};

const MISSING_URL: &str = "Failed to get URL from blob storage";

fn upload_failed(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Avatar => "Failed to upload avatar",
        MediaKind::Background => "Failed to upload background",
    }
}

fn update_failed(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Avatar => "Failed to update avatar",
        MediaKind::Background => "Failed to update background",
    }
}

/// `avatars/user_<id>_<millis>.<ext>` and the backgrounds equivalent.
pub fn media_path(kind: MediaKind, user: &CurrentUser, millis: i64, file_name: Option<&str>) -> String {
    format!(
        "{}/user_{}_{}.{}",
        kind.directory(),
        user.id,
        millis,
        image_extension(file_name)
    )
}

/// Validates, stores the image and records its URL on the user. Nothing is
/// sent to the blob store unless the file passes every check.
pub async fn upload_media(
    state: &AppState,
    user: &CurrentUser,
    kind: MediaKind,
    file: Option<UploadedFile>,
) -> Result<String, ApiError> {
    let file = match file {
        Some(file) if file.size() > 0 => file,
        _ => return Err(ImageRejection::Missing(kind.field_name()).into()),
    };
    check_profile_image(kind, file.size(), file.content_type.as_deref())?;

    let path = media_path(
        kind,
        user,
        chrono::Utc::now().timestamp_millis(),
        file.file_name.as_deref(),
    );
    let stored = state
        .blobs
        .put(&path, file.bytes, PutOptions::public(file.content_type.as_deref()))
        .await
        .map_err(ApiError::storage(upload_failed(kind)))?;
    if stored.url.is_empty() {
        return Err(ApiError::Upstream(MISSING_URL));
    }

    let db = state.clone();
    let user_id = user.id.to_string();
    let url = stored.url.clone();
    let updated = blocking(move || {
        db.db
            .set_media_url(&user_id, kind, Some(&url))
            .map_err(ApiError::database(update_failed(kind)))
    })
    .await?;
    if !updated {
        return Err(ApiError::unauthenticated());
    }

    info!("{} {} stored at {}", user.username, kind, stored.pathname);
    Ok(stored.url)
}

/// Clears the slot. Clearing an empty slot succeeds.
pub fn delete_media(db: &Database, user: &CurrentUser, kind: MediaKind) -> Result<(), ApiError> {
    let updated = db
        .set_media_url(&user.id.to_string(), kind, None)
        .map_err(ApiError::database(update_failed(kind)))?;
    if !updated {
        return Err(ApiError::unauthenticated());
    }
    info!("{} removed their {}", user.username, kind);
    Ok(())
}

async fn upload(
    state: AppState,
    user: CurrentUser,
    kind: MediaKind,
    mut multipart: Multipart,
) -> Result<Json<MediaUploadResponse>, ApiError> {
    let mut form = FormData::read(&mut multipart).await?;
    let file = form.take_file(kind.field_name());
    let url = upload_media(&state, &user, kind, file).await?;
    Ok(Json(MediaUploadResponse::for_kind(kind, url)))
}

async fn delete(state: AppState, user: CurrentUser, kind: MediaKind) -> Result<Json<SuccessResponse>, ApiError> {
    blocking(move || delete_media(&state.db, &user, kind)).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    upload(state, user, MediaKind::Avatar, multipart).await
}

pub async fn upload_background(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    upload(state, user, MediaKind::Background, multipart).await
}

pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    delete(state, user, MediaKind::Avatar).await
}

pub async fn delete_background(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    delete(state, user, MediaKind::Background).await
}
