use std::path::Path;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{Method, header::{AUTHORIZATION, CONTENT_TYPE}},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use storefront_types::api::SuccessResponse;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{media, messages, navigation, sale_items};

/// Request bodies may exceed the image cap so oversized uploads reach the
/// validator and get its message instead of a bare 413.
pub const BODY_LIMIT: usize = 16 * 1024 * 1024;

async fn health() -> Json<SuccessResponse> {
    Json(SuccessResponse::ok())
}

/// Full HTTP surface. `media_dir` is served under `/media` when the local
/// blob store is in use.
pub fn build_router(state: AppState, media_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/sale-items", get(sale_items::list))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/navigation", get(navigation::navigation))
        .route("/messages", get(messages::list_mine).post(messages::send))
        .route("/messages/{id}/read", post(messages::read))
        .route("/admin/messages", get(messages::admin_list))
        .route("/admin/messages/{id}/reply", post(messages::admin_reply))
        .route("/profile/avatar", post(media::upload_avatar).delete(media::delete_avatar))
        .route(
            "/profile/background",
            post(media::upload_background).delete(media::delete_background),
        )
        .route("/sale-items", post(sale_items::create))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let mut app = Router::new().merge(public_routes).merge(protected_routes);
    if let Some(dir) = media_dir {
        app = app.nest_service("/media", ServeDir::new(dir));
    }

    app.layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
