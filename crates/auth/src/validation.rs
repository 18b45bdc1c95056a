//! Field validators for the sign-up, login and OTP forms
//!
//! Every check is pure: it takes the raw input and either accepts it or
//! returns the message shown next to the offending field.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::types::SignUpForm;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());
static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+$").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
// ASCII digits only; `\d` would also accept other Unicode digits
static LOCAL_PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^09[0-9]{9}$").unwrap());
static INTL_PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+639[0-9]{9}$").unwrap());

/// Symbols accepted as the "special character" of a password
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*";
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 255;
pub const OTP_LENGTH: usize = 6;

/// Per-field validation messages of the sign-up form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub profile_pic: Option<String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// `(field, message)` pairs for every failing field, in form order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("username", &self.username),
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("phoneNumber", &self.phone_number),
            ("password", &self.password),
            ("role", &self.role),
            ("profilePic", &self.profile_pic),
        ]
        .into_iter()
        .filter_map(|(field, message)| message.as_deref().map(|m| (field, m)))
    }

    /// Message for a field by its wire name
    pub fn get(&self, field: &str) -> Option<&str> {
        self.iter().find(|(name, _)| *name == field).map(|(_, m)| m)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }
    if !USERNAME_RE.is_match(username) {
        return Err("Username may only contain letters, numbers and underscores".to_string());
    }
    Ok(())
}

/// First and last names: letters only
pub fn validate_name(label: &str, name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{} is required", label));
    }
    if !NAME_RE.is_match(name) {
        return Err(format!("{} may only contain letters", label));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if !EMAIL_RE.is_match(email) {
        return Err("Enter a valid email address".to_string());
    }
    Ok(())
}

/// Philippine mobile numbers, local `09XXXXXXXXX` or international `+639XXXXXXXXX`
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.is_empty() {
        return Err("Phone number is required".to_string());
    }
    if !LOCAL_PHONE_RE.is_match(phone) && !INTL_PHONE_RE.is_match(phone) {
        return Err("Phone number must look like 09XXXXXXXXX or +639XXXXXXXXX".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(format!(
            "Password must be between {} and {} characters",
            PASSWORD_MIN_LEN, PASSWORD_MAX_LEN
        ));
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if !(has_lower && has_upper && has_digit && has_symbol) {
        return Err(format!(
            "Password needs a lowercase letter, an uppercase letter, a number and one of {}",
            PASSWORD_SYMBOLS
        ));
    }
    Ok(())
}

/// Checks every sign-up field and collects the failures
pub fn validate_sign_up(form: &SignUpForm) -> ValidationErrors {
    ValidationErrors {
        username: validate_username(&form.username).err(),
        first_name: validate_name("First name", &form.first_name).err(),
        last_name: validate_name("Last name", &form.last_name).err(),
        email: validate_email(&form.email).err(),
        phone_number: validate_phone(&form.phone_number).err(),
        password: validate_password(&form.password).err(),
        role: form
            .role
            .is_none()
            .then(|| "Select a role".to_string()),
        profile_pic: match &form.profile_pic {
            Some(pic) if !pic.bytes.is_empty() => None,
            _ => Some("A profile picture is required".to_string()),
        },
    }
}

/// Login only requires both fields to be filled in
pub fn validate_login(email: &str, password: &str) -> Result<(), String> {
    if email.trim().is_empty() || password.is_empty() {
        return Err("Enter your email and password".to_string());
    }
    Ok(())
}

pub fn validate_otp(code: &str) -> Result<(), String> {
    if code.len() != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err("Please enter the full 6-digit OTP.".to_string());
    }
    Ok(())
}
