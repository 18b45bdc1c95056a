//! Error handling for the ChickMate Rust client

use std::fmt;
use thiserror::Error;

use chickmate_auth::AuthError;
use chickmate_batch::BatchError;

/// Unified error type for the ChickMate Rust client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Login, OTP, registration and session errors
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Batch monitoring errors
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Non-success response from the backend
    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },
}

impl Error {
    /// Create a new API error
    pub fn api<T: fmt::Display>(status: u16, msg: T) -> Self {
        Error::Api {
            status,
            message: msg.to_string(),
        }
    }

    /// Text for the blocking alert or banner
    pub fn user_message(&self) -> String {
        match self {
            Error::Http(_) => chickmate_auth::CONNECTION_FAILED_MESSAGE.to_string(),
            Error::Auth(err) => err.user_message(),
            Error::Batch(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
