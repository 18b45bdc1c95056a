//! ChickMate batch monitoring client for Rust
//!
//! This crate covers the batch page of the ChickMate dashboard: fetching
//! batches and item catalogues from the backend, recording feed, inventory,
//! mortality and harvest entries, and the values derived from them.

pub mod client;
pub mod derived;
pub mod ledger;
pub mod models;
pub mod view;

use thiserror::Error;

pub use client::BatchClient;
pub use derived::{age_in_days, age_in_days_from_date, total_mortality, BatchSummary};
pub use ledger::{
    EntryKind, EntryLedger, EntryPayload, FeedMedicineInput, HarvestInput, InventoryUsageInput,
    MortalityInput, RecordedEntry,
};
pub use models::*;
pub use view::{DashboardView, MonitoringPage, Panel, Tab};

/// Sent as `X-Client-Info` on every request
pub const CLIENT_INFO: &str = concat!("chickmate-rust/", env!("CARGO_PKG_VERSION"));

/// Shown when a connection could not be made at all
pub const CONNECTION_FAILED_MESSAGE: &str = "Failed to connect to the server. Please try again.";

/// Error type
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl BatchError {
    /// Text for the blocking alert or banner
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkError(_) => CONNECTION_FAILED_MESSAGE.to_string(),
            Self::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;
