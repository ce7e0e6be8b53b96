//! User accounts stored as `user` records
//!
//! A user record holds `username`, `email`, an Argon2 `password` hash, a
//! `role`, a `status` and optionally an `apikey`. Accounts are created and
//! changed only through a [`UserSaver`], which keeps the password hash and
//! API key out of every audit entry.

use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::debug;
use uuid::Uuid;

use crate::audit::RedactionPolicy;
use crate::config::Settings;
use crate::error::{SaverError, SaverResult};
use crate::models::Record;
use crate::saver::{Saver, SaverHooks};
use crate::storage::RecordStore;

/// Type tag of user records
pub const DOCTYPE_USER: &str = "user";

/// What a user is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Registered, waiting for an admin to enable it
    Pending,
    Enabled,
    Disabled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "enabled" => Some(Self::Enabled),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Saver hooks for user records
#[derive(Debug, Clone)]
pub struct UserKind {
    settings: Settings,
    creating: bool,
}

impl UserKind {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
            creating: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl SaverHooks for UserKind {
    fn doctype(&self) -> &str {
        DOCTYPE_USER
    }

    fn policy(&self) -> RedactionPolicy {
        let mut policy = RedactionPolicy::default()
            .hide_field("password")
            .hide_field("apikey");
        for field in &self.settings.hidden_fields {
            policy = policy.hide_field(field);
        }
        policy
    }

    fn initialize(&mut self, record: &mut Record) -> SaverResult<()> {
        self.creating = true;
        record.set("role", Role::User.as_str())?;
        record.set("status", Status::Pending.as_str())?;
        Ok(())
    }

    fn finalize(&mut self, record: &mut Record, store: &dyn RecordStore) -> SaverResult<()> {
        let username = record
            .get_str("username")
            .ok_or_else(|| SaverError::Validation("Username is required".into()))?
            .to_string();
        let email = record
            .get_str("email")
            .ok_or_else(|| SaverError::Validation("Email is required".into()))?
            .to_string();

        for other in store.list(DOCTYPE_USER)? {
            if other.id == record.id {
                continue;
            }
            if other.get_str("username") == Some(username.as_str()) {
                return Err(duplicate(username));
            }
            if other.get_str("email") == Some(email.as_str()) {
                return Err(duplicate(email));
            }
        }

        let pending = record.get_str("status") == Some(Status::Pending.as_str());
        if self.creating
            && pending
            && (self.settings.user_enable_immediately || self.settings.email_whitelisted(&email))
        {
            debug!(username = %username, "enabling new user immediately");
            record.set("status", Status::Enabled.as_str())?;
        }
        Ok(())
    }
}

/// Saver for user records
pub type UserSaver<'a> = Saver<'a, UserKind>;

impl<'a> Saver<'a, UserKind> {
    /// Set the username; it cannot be changed once set
    pub fn set_username(&mut self, username: &str) -> SaverResult<()> {
        if self.get_str("username").is_some() {
            return Err(SaverError::Validation("Username cannot be changed".into()));
        }
        let username = username.trim().to_lowercase();
        if !valid_username(&username) {
            return Err(SaverError::Validation(format!(
                "Invalid username '{}': must begin with a letter and contain only letters, digits, '_' or '-'",
                username
            )));
        }
        if find_user(self.store(), &username)?.is_some() {
            return Err(duplicate(username));
        }
        self.set("username", username)
    }

    pub fn set_email(&mut self, email: &str) -> SaverResult<()> {
        let email = email.trim().to_lowercase();
        if !valid_email(&email) {
            return Err(SaverError::Validation(format!("Invalid email '{}'", email)));
        }
        if let Some(other) = find_user(self.store(), &email)? {
            if other.id != self.id() {
                return Err(duplicate(email));
            }
        }
        self.set("email", email)
    }

    /// Store the Argon2 hash of `password`
    pub fn set_password(&mut self, password: &str) -> SaverResult<()> {
        let min = self.kind().settings().min_password_length;
        if password.chars().count() < min {
            return Err(SaverError::Validation(format!(
                "Password must be at least {} characters",
                min
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SaverError::Password(e.to_string()))?;
        self.set("password", hash.to_string())
    }

    pub fn set_role(&mut self, role: Role) -> SaverResult<()> {
        self.set("role", role.as_str())
    }

    pub fn set_status(&mut self, status: Status) -> SaverResult<()> {
        self.set("status", status.as_str())
    }

    /// Generate and store a fresh API key, returning it
    pub fn set_apikey(&mut self) -> SaverResult<String> {
        let key = Uuid::new_v4().simple().to_string();
        self.set("apikey", key.clone())?;
        Ok(key)
    }
}

fn duplicate(identifier: String) -> SaverError {
    SaverError::Duplicate {
        entity_type: "User",
        identifier,
    }
}

fn valid_username(username: &str) -> bool {
    let mut chars = username.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}

fn valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn find_user(store: &dyn RecordStore, name_or_email: &str) -> SaverResult<Option<Record>> {
    let key = name_or_email.trim().to_lowercase();
    let field = if key.contains('@') { "email" } else { "username" };
    Ok(store
        .list(DOCTYPE_USER)?
        .into_iter()
        .find(|user| user.get_str(field) == Some(key.as_str())))
}

/// Look up a user by username or e-mail address
pub fn get_user(store: &dyn RecordStore, name_or_email: &str) -> SaverResult<Record> {
    find_user(store, name_or_email)?.ok_or_else(|| SaverError::user_not_found(name_or_email))
}

/// All users, sorted by username
pub fn list_users(store: &dyn RecordStore) -> SaverResult<Vec<Record>> {
    let mut users = store.list(DOCTYPE_USER)?;
    users.sort_by(|a, b| a.get_str("username").cmp(&b.get_str("username")));
    Ok(users)
}

/// Check `password` against the stored hash; false if no password is set
pub fn verify_password(user: &Record, password: &str) -> bool {
    let Some(stored) = user.get_str("password") else {
        return false;
    };
    match PasswordHash::new(stored) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn role_of(user: &Record) -> Option<Role> {
    user.get_str("role").and_then(Role::parse)
}

pub fn status_of(user: &Record) -> Option<Status> {
    user.get_str("status").and_then(Status::parse)
}
