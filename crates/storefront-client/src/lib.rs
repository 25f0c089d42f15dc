//! Client side of the storefront panels: a typed HTTP client, the session
//! mirror and the controllers driving each panel.

pub mod client;
pub mod panels;
pub mod session;

pub use client::{ClientError, ImageFile, SaleItemFields, StorefrontClient};
pub use session::SessionStore;
