use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use axum_extra::typed_header::TypedHeaderRejection;
use tracing::debug;
use uuid::Uuid;

use storefront_types::models::UserRole;

use crate::auth::{AppState, decode_token};
use crate::error::{ApiError, blocking};
use crate::views;

/// The authenticated caller, as stored in the database right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
}

/// Validates the bearer token and resolves it to a live user record.
/// The database role wins over whatever the token was issued with.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| ApiError::unauthenticated())?;

    let claims = decode_token(&state.jwt_secret, bearer.token()).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::unauthenticated()
    })?;

    let db = state.clone();
    let id = claims.sub.to_string();
    let row = blocking(move || db.db.get_user_by_id(&id).map_err(ApiError::database("Failed to verify session")))
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    let role = views::role(&row.role).map_err(ApiError::database("Failed to verify session"))?;

    req.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        username: row.username,
        role,
    });
    Ok(next.run(req).await)
}
