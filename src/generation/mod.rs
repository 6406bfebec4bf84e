//! Listing generation engine: prompt in, structured listing out.

pub mod client;
pub mod prompt;

use async_trait::async_trait;
use thiserror::Error;

use crate::listing::{CsvRow, ListingError, ListingOutput};

pub use client::LlmListingGenerator;

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("generation engine not configured: {0}")]
    NotConfigured(&'static str),
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited by generation engine")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    InvalidListing(#[from] ListingError),
}

/// Result of one successful generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedListing {
    pub listing: ListingOutput,
    pub tokens_used: u32,
}

#[async_trait]
pub trait ListingGenerator: Send + Sync {
    async fn generate(&self, row: &CsvRow) -> Result<GeneratedListing, GenerationError>;
}
