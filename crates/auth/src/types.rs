//! Request and response types for the ChickMate auth endpoints

use serde::{Deserialize, Deserializer, Serialize};

use crate::session::Role;

/// Credentials sent to `POST /login`
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginCredentials {
    /// The login form labels this "email"; the backend looks users up by it
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Payload returned by a successful `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Stored upload file name; the backend sends `""` when none was uploaded
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub profile_pic: Option<String>,
}

/// Body of `POST /sendotp`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SendOtpRequest<'a> {
    pub email: &'a str,
}

/// Body of `POST /verifyotp`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct VerifyOtpRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

/// Profile image attached to a sign-up
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePicture {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ProfilePicture {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Sign-up form state, one field per input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignUpForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Free-form suffix ("Jr.", "III", ...); optional
    pub suffix: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub role: Option<Role>,
    pub profile_pic: Option<ProfilePicture>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
