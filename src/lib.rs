//! ChickMate Rust Client Library
//!
//! A Rust client for the ChickMate poultry farm dashboard backend, providing
//! login and registration, the stored session, and batch monitoring.

pub mod config;
pub mod error;
pub mod fetch;

use std::path::PathBuf;

use chrono::Utc;
use log::info;
use reqwest::Client;

pub use chickmate_auth as auth;
pub use chickmate_batch as batch;

use crate::auth::{
    AuthClient, FileSessionStore, GateDecision, Guarded, Route, Session, SessionGate,
    SessionManager, SessionStore,
};
use crate::batch::{Batch, BatchClient, BatchSummary, DashboardView};
use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;

/// Session file used when none is configured
pub const DEFAULT_SESSION_FILE: &str = ".chickmate/session.json";

/// The main entry point for the ChickMate Rust client
pub struct Chickmate {
    /// The base URL of the ChickMate backend
    pub url: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    auth: AuthClient,
    batches: BatchClient,
}

/// Batch page contents for a signed-in user
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub session: Session,
    pub batches: Vec<Batch>,
    pub view: DashboardView,
}

impl Dashboard {
    /// Summary of the selected batch, without any recorded mortality
    pub fn selected_summary(&self) -> Option<BatchSummary> {
        let selected = self.view.selected_batch()?;
        self.batches
            .iter()
            .find(|batch| batch.id == selected)
            .map(|batch| BatchSummary::compute(batch, &[], Utc::now()))
    }
}

impl Chickmate {
    /// Create a new ChickMate client
    ///
    /// # Example
    ///
    /// ```
    /// use chickmate::Chickmate;
    ///
    /// let client = Chickmate::new("http://localhost:8080").unwrap();
    /// ```
    pub fn new(url: &str) -> Result<Self, Error> {
        Self::new_with_options(url, ClientOptions::default())
    }

    /// Create a new ChickMate client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use chickmate::{Chickmate, config::ClientOptions};
    ///
    /// let options = ClientOptions::default().with_request_timeout(Some(Duration::from_secs(5)));
    /// let client = Chickmate::new_with_options("http://localhost:8080", options).unwrap();
    /// ```
    pub fn new_with_options(url: &str, options: ClientOptions) -> Result<Self, Error> {
        url::Url::parse(url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            url: url.to_string(),
            auth: AuthClient::new(url, http_client.clone()),
            batches: BatchClient::new(url, http_client.clone()),
            http_client,
            options,
        })
    }

    /// Create a client from `CHICKMATE_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        let (url, options) = ClientOptions::from_env();
        Self::new_with_options(&url, options)
    }

    /// Login, OTP and registration endpoints
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Batch and item endpoints
    pub fn batches(&self) -> &BatchClient {
        &self.batches
    }

    /// File-backed session store at the configured path
    pub fn session_store(&self) -> FileSessionStore {
        let path = self
            .options
            .session_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
        FileSessionStore::new(path)
    }

    /// Checks that the backend answers on its root path
    pub async fn health(&self) -> Result<String, Error> {
        Fetch::get(&self.http_client, &self.url)
            .header("X-Client-Info", &self.options.client_info)
            .execute_text()
            .await
    }

    /// Loads the batch page, or the route to go to when nobody is signed in
    pub async fn load_dashboard<S: SessionStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Guarded<Dashboard>, Error> {
        if let GateDecision::Redirect(route) = SessionGate::check(store)? {
            return Ok(Guarded::Redirected(route));
        }

        let session = match SessionManager::new(store).current()? {
            Some(session) => session,
            None => return Ok(Guarded::Redirected(Route::Login)),
        };

        let batches = self.batches.list_batches().await?;
        let ids: Vec<String> = batches.iter().map(|batch| batch.id.clone()).collect();

        let mut view = DashboardView::new();
        view.select_default_batch(&ids);
        info!("Loaded {} batches for {}", batches.len(), session.username);

        Ok(Guarded::Rendered(Dashboard {
            session,
            batches,
            view,
        }))
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{
        AuthClient, AuthError, FileSessionStore, LoginCredentials, MemorySessionStore, Role,
        Route, Session, SessionGate, SessionManager, SessionStore, SignUpForm,
    };
    pub use crate::batch::{BatchClient, BatchError, DashboardView, EntryLedger, Tab};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::{Chickmate, Dashboard};
}
