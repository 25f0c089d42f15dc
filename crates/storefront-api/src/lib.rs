//! HTTP layer: handlers, auth, blob storage and the router that ties them
//! together.

pub mod auth;
pub mod blob;
pub mod error;
pub mod media;
pub mod messages;
pub mod middleware;
pub mod multipart;
pub mod navigation;
pub mod router;
pub mod sale_items;
mod views;

pub use auth::{AppState, AppStateInner};
pub use router::build_router;
