//! Data models for the bucket gateway.
//!
//! `object` holds what the storage backend persists and what the API returns
//! per object; `request` holds the query, body and response shapes of the
//! request router.

pub mod object;
pub mod request;
