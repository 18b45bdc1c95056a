//! ChickMate auth client for Rust
//!
//! This crate provides the account side of the ChickMate farm dashboard:
//! login, OTP verification, user registration, form validation and the
//! session kept between views.

pub mod otp;
pub mod session;
pub mod types;
pub mod validation;

use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use thiserror::Error;
use url::Url;

pub use otp::OtpResendTimer;
pub use session::{
    keys, FileSessionStore, GateDecision, Guarded, MemorySessionStore, Role, Route, Session,
    SessionGate, SessionManager, SessionStore, PLACEHOLDER_TOKEN,
};
pub use types::{LoginCredentials, LoginResponse, ProfilePicture, SignUpForm};
pub use validation::{validate_sign_up, ValidationErrors};

/// Sent as `X-Client-Info` on every request
pub const CLIENT_INFO: &str = concat!("chickmate-rust/", env!("CARGO_PKG_VERSION"));

/// Shown when a connection could not be made at all
pub const CONNECTION_FAILED_MESSAGE: &str = "Failed to connect to the server. Please try again.";

const DEFAULT_LOGIN_ERROR: &str = "Invalid username or password";
const DEFAULT_OTP_ERROR: &str = "OTP verification failed.";
const DEFAULT_RESEND_ERROR: &str = "Failed to resend OTP.";

/// Error type
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session store lock poisoned")]
    StorePoisoned,

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Missing session")]
    MissingSession,
}

impl AuthError {
    /// Text for the banner above the form
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkError(_) => CONNECTION_FAILED_MESSAGE.to_string(),
            Self::AuthenticationError(message) | Self::InvalidInput(message) => message.clone(),
            Self::ApiError { message, .. } => message.clone(),
            Self::Validation(errors) => errors.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// Auth client
#[derive(Debug, Clone)]
pub struct AuthClient {
    base_url: String,
    http_client: Client,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, http_client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, segment: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| AuthError::UrlError(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// `POST /login`; a non-2xx answer becomes [`AuthError::AuthenticationError`]
    /// carrying the server's text
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse> {
        let url = self.endpoint("login")?;
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(url)
            .header("X-Client-Info", CLIENT_INFO)
            .json(credentials)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_text(response, DEFAULT_LOGIN_ERROR).await;
            warn!("Login rejected with status {}: {}", status, message);
            return Err(AuthError::AuthenticationError(message));
        }

        Ok(response.json::<LoginResponse>().await?)
    }

    /// Validates the credentials, logs in and starts a session in `store`
    pub async fn sign_in<S: SessionStore + ?Sized>(
        &self,
        store: &S,
        credentials: &LoginCredentials,
    ) -> Result<Session> {
        validation::validate_login(&credentials.email, &credentials.password)
            .map_err(AuthError::InvalidInput)?;

        let login = self.login(credentials).await?;
        SessionManager::new(store).init(&login)
    }

    /// Clears the session; the returned route is where the UI goes next
    pub fn sign_out<S: SessionStore + ?Sized>(&self, store: &S) -> Result<Route> {
        SessionManager::new(store).teardown()
    }

    /// The session stored in `store`, or [`AuthError::MissingSession`]
    pub fn require_session<S: SessionStore + ?Sized>(&self, store: &S) -> Result<Session> {
        SessionManager::new(store)
            .current()?
            .ok_or(AuthError::MissingSession)
    }

    /// `POST /sendotp`
    pub async fn send_otp(&self, email: &str) -> Result<()> {
        let url = self.endpoint("sendotp")?;
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(url)
            .header("X-Client-Info", CLIENT_INFO)
            .json(&types::SendOtpRequest { email })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = error_text(response, DEFAULT_RESEND_ERROR).await;
            return Err(AuthError::ApiError { status, message });
        }

        info!("OTP sent to {}", email);
        Ok(())
    }

    /// `POST /verifyotp`; the code must be six digits before anything is sent
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<()> {
        validation::validate_otp(code).map_err(AuthError::InvalidInput)?;

        let url = self.endpoint("verifyotp")?;
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(url)
            .header("X-Client-Info", CLIENT_INFO)
            .json(&types::VerifyOtpRequest { email, otp: code })
            .send()
            .await?;

        if !response.status().is_success() {
            let message = error_text(response, DEFAULT_OTP_ERROR).await;
            return Err(AuthError::AuthenticationError(message));
        }

        Ok(())
    }

    /// Registers a user with `POST /adduser` as multipart form data
    ///
    /// The form is validated first; on any field error no request is made.
    pub async fn add_user(&self, form: &SignUpForm) -> Result<String> {
        let errors = validate_sign_up(form);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }
        // validate_sign_up guarantees both are set
        let (role, picture) = match (form.role, form.profile_pic.as_ref()) {
            (Some(role), Some(picture)) => (role, picture),
            _ => return Err(AuthError::InvalidInput("Incomplete sign-up form".to_string())),
        };

        let mut part = Part::bytes(picture.bytes.clone()).file_name(picture.file_name.clone());
        if let Some(mime) = &picture.mime_type {
            part = part.mime_str(mime)?;
        }

        let multipart = Form::new()
            .text("username", form.username.clone())
            .text("firstName", form.first_name.clone())
            .text("lastName", form.last_name.clone())
            .text("suffix", form.suffix.clone())
            .text("email", form.email.clone())
            .text("phoneNumber", form.phone_number.clone())
            .text("password", form.password.clone())
            .text("role", role.as_str())
            .part("profilePic", part);

        let url = self.endpoint("adduser")?;
        debug!("POST {} (multipart)", url);

        let response = self
            .http_client
            .post(url)
            .header("X-Client-Info", CLIENT_INFO)
            .multipart(multipart)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = error_text(response, "Failed to create account").await;
            return Err(AuthError::ApiError { status, message });
        }

        let body = response.text().await?;
        info!("Registered user {} as {}", form.username, role);
        Ok(body.trim().to_string())
    }
}

/// Response body as an error message, or `fallback` when it is blank
async fn error_text(response: Response, fallback: &str) -> String {
    let text = response.text().await.unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_handles_trailing_slash() {
        let client = AuthClient::new("http://localhost:8080/", Client::new());
        assert_eq!(
            client.endpoint("login").unwrap().as_str(),
            "http://localhost:8080/login"
        );

        let client = AuthClient::new("http://localhost:8080/api", Client::new());
        assert_eq!(
            client.endpoint("sendotp").unwrap().as_str(),
            "http://localhost:8080/api/sendotp"
        );
    }

    #[test]
    fn user_message_passes_server_text_through() {
        let err = AuthError::InvalidInput("Enter your email and password".to_string());
        assert_eq!(err.user_message(), "Enter your email and password");
        let err = AuthError::AuthenticationError("Invalid email or password".to_string());
        assert_eq!(err.user_message(), "Invalid email or password");
    }
}
