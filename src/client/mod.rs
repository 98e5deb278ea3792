//! Elasticsearch client, authentication and the search seam.
//!
//! This module provides the [`ElasticsearchClient`] for talking to a cluster,
//! the [`SearchBackend`] trait the extraction core issues searches through,
//! and the [`Auth`] credentials it sends.

mod auth;
mod elasticsearch;
mod search;

pub use auth::Auth;
pub use elasticsearch::ElasticsearchClient;
pub use search::{
    Hits, SearchBackend, SearchResponse, SearchResponseBody, ShardFailure, ShardStats, TotalHits,
};
