//! bucket-gateway: a small HTTP front for one object bucket.
//!
//! `GET` lists, `POST` uploads, renames and deletes behind a shared-secret
//! header. Storage is reached only through the injected
//! [`services::storage_service::ObjectStore`].

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
