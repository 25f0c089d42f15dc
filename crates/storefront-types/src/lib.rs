//! Types shared by the storefront server and its clients.
//!
//! Wire DTOs live in [`api`], domain models in [`models`]. Input rules that
//! both sides enforce (message lengths, image constraints, prices) live in
//! [`validation`] so a client can reject bad input before a round-trip.

pub mod api;
pub mod models;
pub mod navigation;
pub mod validation;
