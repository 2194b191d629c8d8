//! Miau League backend
//!
//! Validates league, registration and announcement payloads and keeps them
//! in a document store behind a small JSON API.

pub mod api;
pub mod config;
pub mod error;
pub mod schema;
pub mod store;
