//! Elasticsearch API client and authentication.
//!
//! This module provides the [`ElasticsearchClient`] used by the load step,
//! along with the [`Auth`] credentials type.

mod auth;
mod elasticsearch;

pub use auth::Auth;
pub use elasticsearch::ElasticsearchClient;
