//! Session state of the signed-in user
//!
//! The dashboard keeps five string keys in a key-value store (browser local
//! storage in the web build, a JSON file for the CLI). [`SessionManager`] owns
//! the login/logout lifecycle of those keys and [`SessionGate`] decides whether
//! a protected view may render.

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use crate::types::LoginResponse;
use crate::{AuthError, Result};

/// Key-value store key names
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const USERNAME: &str = "username";
    pub const EMAIL: &str = "email";
    pub const PROFILE_PIC: &str = "profilePic";
    pub const ROLE: &str = "role";

    pub const ALL: [&str; 5] = [AUTH_TOKEN, USERNAME, EMAIL, PROFILE_PIC, ROLE];
}

/// Value written under `authToken` on login. It only flags presence and is
/// never verified.
pub const PLACEHOLDER_TOKEN: &str = "dummy-token";

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }

    /// Admins and superadmins may edit the item catalogue
    pub fn can_edit_items(&self) -> bool {
        matches!(self, Self::Admin | Self::Superadmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    // The sign-up form sends "User"/"Admin", the backend echoes whatever was stored
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            other => Err(AuthError::InvalidRole(other.to_string())),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The currently authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile_pic: Option<String>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role.can_edit_items()
    }
}

/// Views the dashboard can navigate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Inventory,
    Batch,
    Sales,
    Suppliers,
    Control,
    Login,
    SignUp,
}

impl Route {
    /// Sidebar entries, in display order
    pub const NAVIGATION: [Route; 6] = [
        Route::Home,
        Route::Inventory,
        Route::Batch,
        Route::Sales,
        Route::Suppliers,
        Route::Control,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Inventory => "/inventory",
            Self::Batch => "/batch",
            Self::Sales => "/sales",
            Self::Suppliers => "/suppliers",
            Self::Control => "/control",
            Self::Login => "/login",
            Self::SignUp => "/signup",
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Self::Login | Self::SignUp)
    }
}

/// String key-value storage backing a session
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| AuthError::StorePoisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| AuthError::StorePoisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| AuthError::StorePoisoned)?;
        values.remove(key);
        Ok(())
    }
}

/// Store persisted as a flat JSON object on disk
///
/// Each write rewrites the whole file. A missing file reads as empty.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(AuthError::Io(e)),
        }
    }

    fn save(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(values)?;
        fs::write(&self.path, bytes)?;
        debug!("Session file written: {}", self.path.display());
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(|_| AuthError::StorePoisoned)?;
        let mut values = self.load()?;
        f(&mut values);
        self.save(&values)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| AuthError::StorePoisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

/// Login/logout lifecycle over a [`SessionStore`]
pub struct SessionManager<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes all five session keys from a login response
    pub fn init(&self, login: &LoginResponse) -> Result<Session> {
        let session = Session {
            token: PLACEHOLDER_TOKEN.to_string(),
            username: login.username.clone(),
            email: login.email.clone(),
            role: login.role,
            profile_pic: login.profile_pic.clone(),
        };

        self.store.set(keys::AUTH_TOKEN, &session.token)?;
        self.store.set(keys::USERNAME, &session.username)?;
        self.store.set(keys::EMAIL, &session.email)?;
        self.store
            .set(keys::PROFILE_PIC, session.profile_pic.as_deref().unwrap_or(""))?;
        self.store.set(keys::ROLE, session.role.as_str())?;

        info!("Session started for {} ({})", session.username, session.role);
        Ok(session)
    }

    /// Reads the stored session; `None` when no token is present
    pub fn current(&self) -> Result<Option<Session>> {
        let token = match self.store.get(keys::AUTH_TOKEN)? {
            Some(token) => token,
            None => return Ok(None),
        };

        let role = match self.store.get(keys::ROLE)? {
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => role,
                Err(e) => {
                    warn!("Ignoring stored session: {}", e);
                    return Ok(None);
                }
            },
            None => {
                warn!("Ignoring stored session without a role");
                return Ok(None);
            }
        };

        Ok(Some(Session {
            token,
            username: self.store.get(keys::USERNAME)?.unwrap_or_default(),
            email: self.store.get(keys::EMAIL)?.unwrap_or_default(),
            role,
            profile_pic: self
                .store
                .get(keys::PROFILE_PIC)?
                .filter(|pic| !pic.is_empty()),
        }))
    }

    /// Removes all five session keys; the caller navigates to the returned route
    pub fn teardown(&self) -> Result<Route> {
        for key in keys::ALL {
            self.store.remove(key)?;
        }
        info!("Session cleared");
        Ok(Route::Login)
    }
}

/// Outcome of a gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Render,
    Redirect(Route),
}

/// Result of running a view through the gate
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<T> {
    Rendered(T),
    Redirected(Route),
}

impl<T> Guarded<T> {
    pub fn rendered(self) -> Option<T> {
        match self {
            Self::Rendered(value) => Some(value),
            Self::Redirected(_) => None,
        }
    }
}

/// Presence check on the auth token key, run when a protected view mounts
pub struct SessionGate;

impl SessionGate {
    pub fn check<S: SessionStore + ?Sized>(store: &S) -> Result<GateDecision> {
        if store.contains(keys::AUTH_TOKEN)? {
            Ok(GateDecision::Render)
        } else {
            debug!("No auth token, redirecting to {}", Route::Login.path());
            Ok(GateDecision::Redirect(Route::Login))
        }
    }

    /// Runs `view` only when the gate lets it render
    pub fn guard<S, T, F>(store: &S, view: F) -> Result<Guarded<T>>
    where
        S: SessionStore + ?Sized,
        F: FnOnce() -> T,
    {
        Ok(match Self::check(store)? {
            GateDecision::Render => Guarded::Rendered(view()),
            GateDecision::Redirect(route) => Guarded::Redirected(route),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_response(role: Role) -> LoginResponse {
        LoginResponse {
            message: "Login successful".to_string(),
            username: "juan".to_string(),
            email: "juan@example.com".to_string(),
            role,
            profile_pic: Some("1700000000_juan.png".to_string()),
        }
    }

    #[test]
    fn role_parsing_ignores_case() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("SUPERADMIN".parse::<Role>().unwrap(), Role::Superadmin);
        assert_eq!(" user ".parse::<Role>().unwrap(), Role::User);
        assert!(matches!(
            "owner".parse::<Role>(),
            Err(AuthError::InvalidRole(_))
        ));
    }

    #[test]
    fn only_admins_edit_items() {
        assert!(!Role::User.can_edit_items());
        assert!(Role::Admin.can_edit_items());
        assert!(Role::Superadmin.can_edit_items());
    }

    #[test]
    fn gate_redirects_without_token() {
        let store = MemorySessionStore::new();
        assert_eq!(
            SessionGate::check(&store).unwrap(),
            GateDecision::Redirect(Route::Login)
        );

        let outcome = SessionGate::guard(&store, || "dashboard").unwrap();
        assert_eq!(outcome, Guarded::Redirected(Route::Login));
    }

    #[test]
    fn gate_renders_with_token() {
        let store = MemorySessionStore::new();
        store.set(keys::AUTH_TOKEN, "anything").unwrap();

        assert_eq!(SessionGate::check(&store).unwrap(), GateDecision::Render);
        let outcome = SessionGate::guard(&store, || "dashboard").unwrap();
        assert_eq!(outcome.rendered(), Some("dashboard"));
    }

    #[test]
    fn init_writes_all_keys() {
        let manager = SessionManager::new(MemorySessionStore::new());
        let session = manager.init(&login_response(Role::Admin)).unwrap();

        assert_eq!(session.token, PLACEHOLDER_TOKEN);
        for key in keys::ALL {
            assert!(manager.store().contains(key).unwrap(), "{} missing", key);
        }
        assert_eq!(manager.store().get(keys::ROLE).unwrap().as_deref(), Some("admin"));
        assert_eq!(manager.current().unwrap(), Some(session));
    }

    #[test]
    fn teardown_clears_all_keys_and_redirects() {
        let manager = SessionManager::new(MemorySessionStore::new());
        manager.init(&login_response(Role::User)).unwrap();

        assert_eq!(manager.teardown().unwrap(), Route::Login);
        for key in keys::ALL {
            assert!(!manager.store().contains(key).unwrap(), "{} left behind", key);
        }
        assert_eq!(manager.current().unwrap(), None);
        assert_eq!(
            SessionGate::check(manager.store()).unwrap(),
            GateDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn current_ignores_unknown_role() {
        let store = MemorySessionStore::new();
        store.set(keys::AUTH_TOKEN, PLACEHOLDER_TOKEN).unwrap();
        store.set(keys::ROLE, "farmer").unwrap();

        let manager = SessionManager::new(&store);
        assert_eq!(manager.current().unwrap(), None);
    }

    #[test]
    fn missing_profile_pic_is_stored_blank() {
        let manager = SessionManager::new(MemorySessionStore::new());
        let mut login = login_response(Role::User);
        login.profile_pic = None;
        manager.init(&login).unwrap();

        assert_eq!(
            manager.store().get(keys::PROFILE_PIC).unwrap().as_deref(),
            Some("")
        );
        assert_eq!(manager.current().unwrap().unwrap().profile_pic, None);
    }

    #[test]
    fn protected_routes() {
        assert!(Route::Batch.is_protected());
        assert!(!Route::Login.is_protected());
        assert_eq!(Route::NAVIGATION[0].path(), "/");
        assert_eq!(Route::SignUp.path(), "/signup");
    }
}
