use axum::{Extension, Json};

use storefront_types::api::NavigationResponse;
use storefront_types::navigation::{customer_sidebar, dashboard_url, routing_hub};

use crate::middleware::CurrentUser;

/// Dashboard target, sidebar and (super-admins only) routing hub for the caller.
pub async fn navigation(Extension(user): Extension<CurrentUser>) -> Json<NavigationResponse> {
    Json(NavigationResponse {
        success: true,
        dashboard_url: dashboard_url(user.role).to_string(),
        links: customer_sidebar(),
        hub: routing_hub(user.role),
    })
}
