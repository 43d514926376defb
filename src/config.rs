//! Issuer configuration
//!
//! The application id and signing secret are loaded once at startup and
//! handed to the issuer. Either may be missing: the service still starts, and
//! every issuance reports the gap as a [`ConfigurationError`].

use crate::rooms::{RoomPolicy, UnknownPolicy};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub const APP_ID_ENV: &str = "ROOMPASS_APP_ID";
pub const SECRET_ENV: &str = "ROOMPASS_SECRET";
pub const ROOM_POLICY_ENV: &str = "ROOMPASS_ROOM_POLICY";

/// Number of app id characters exposed by the status probe
const APP_ID_PREFIX_LEN: usize = 8;

/// Deployment misconfiguration; never retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("missing application id (ROOMPASS_APP_ID)")]
    MissingAppId,

    #[error("missing signing secret (ROOMPASS_SECRET)")]
    MissingSecret,

    #[error("missing application id and signing secret (ROOMPASS_APP_ID, ROOMPASS_SECRET)")]
    MissingCredentials,
}

/// Shared HMAC key
#[derive(Clone)]
pub struct SigningSecret {
    key: Vec<u8>,
}

impl SigningSecret {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret([REDACTED])")
    }
}

/// Credentials borrowed from a complete configuration
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub app_id: &'a str,
    pub secret: &'a SigningSecret,
}

/// Everything the issuer needs, injected at construction
#[derive(Debug, Clone, Default)]
pub struct IssuerConfig {
    pub app_id: Option<String>,
    pub secret: Option<SigningSecret>,
    pub room_policy: RoomPolicy,
}

impl IssuerConfig {
    /// Build from optional raw values; empty strings count as absent
    pub fn new(app_id: Option<String>, secret: Option<String>) -> Self {
        Self {
            app_id: app_id.filter(|s| !s.is_empty()),
            secret: secret.filter(|s| !s.is_empty()).map(SigningSecret::new),
            room_policy: RoomPolicy::default(),
        }
    }

    /// Read `ROOMPASS_APP_ID`, `ROOMPASS_SECRET` and `ROOMPASS_ROOM_POLICY`
    pub fn from_env() -> Result<Self, UnknownPolicy> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars<F>(var: F) -> Result<Self, UnknownPolicy>
    where
        F: Fn(&str) -> Option<String>,
    {
        let policy = match var(ROOM_POLICY_ENV).filter(|p| !p.is_empty()) {
            Some(p) => p.parse()?,
            None => RoomPolicy::default(),
        };

        Ok(Self::new(var(APP_ID_ENV), var(SECRET_ENV)).with_room_policy(policy))
    }

    pub fn with_room_policy(mut self, policy: RoomPolicy) -> Self {
        self.room_policy = policy;
        self
    }

    /// Both credentials, or which ones are missing
    pub fn credentials(&self) -> Result<Credentials<'_>, ConfigurationError> {
        match (self.app_id.as_deref(), self.secret.as_ref()) {
            (Some(app_id), Some(secret)) => Ok(Credentials { app_id, secret }),
            (None, Some(_)) => Err(ConfigurationError::MissingAppId),
            (Some(_), None) => Err(ConfigurationError::MissingSecret),
            (None, None) => Err(ConfigurationError::MissingCredentials),
        }
    }

    /// Summary safe to expose to operators
    pub fn status(&self, environment: &str) -> ConfigStatus {
        ConfigStatus {
            environment: environment.to_string(),
            has_app_id: self.app_id.is_some(),
            has_secret: self.secret.is_some(),
            app_id_prefix: self
                .app_id
                .as_ref()
                .map(|id| id.chars().take(APP_ID_PREFIX_LEN).collect()),
        }
    }
}

/// Body of the configuration status probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStatus {
    pub environment: String,
    pub has_app_id: bool,
    pub has_secret: bool,
    pub app_id_prefix: Option<String>,
}
