pub mod web;

use crate::config::RenderInstructions;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// A single page request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub render: RenderInstructions,
    /// Bound on the whole fetch, rendering included
    pub timeout: Duration,
}

/// Raw page content as returned by a fetcher
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub requested_url: String,
    /// URL after redirects
    pub final_url: String,
    pub content: String,
}

/// Reasons a candidate page could not be used; all of them skip to the next candidate
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("timed out after {secs}s fetching {url}")]
    Timeout { url: String, secs: u64 },

    #[error("failed to navigate to {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("failed to read page source for {url}: {message}")]
    Source { url: String, message: String },

    #[error("http status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("blocked by security challenge at {url} (marker {marker:?})")]
    Blocked { url: String, marker: String },

    #[error("expected content marker {marker:?} missing from {url}")]
    MissingMarker { url: String, marker: String },

    #[error("fetcher unavailable: {0}")]
    Unavailable(String),
}

/// Retrieves raw page content for the pipeline
pub trait PageFetcher {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}
