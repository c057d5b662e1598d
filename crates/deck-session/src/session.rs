use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;

use crate::store::AddressStore;

/// Address used when nothing has been stored yet.
pub const DEFAULT_DEVICE_ADDRESS: &str = "192.168.1.100";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_device_address: String,
    /// Single-line file holding the last device address. In-memory when unset.
    pub address_store: Option<PathBuf>,
    pub splash_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_device_address: DEFAULT_DEVICE_ADDRESS.to_string(),
            address_store: None,
            splash_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub device_address: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("{0} is required")]
    Missing(&'static str),
}

impl LoginForm {
    pub fn new(username: impl Into<String>, device_address: impl Into<String>) -> Self {
        Self { username: username.into(), device_address: device_address.into() }
    }

    /// Required-field check only; nothing is verified against the device.
    pub fn into_session(self) -> Result<Session, LoginError> {
        let username = self.username.trim().to_string();
        let device_address = self.device_address.trim().to_string();
        if username.is_empty() {
            return Err(LoginError::Missing("username"));
        }
        if device_address.is_empty() {
            return Err(LoginError::Missing("device address"));
        }
        Ok(Session {
            username,
            device_address,
            started_unix_ms: (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub device_address: String,
    pub started_unix_ms: i64,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        !self.username.is_empty() && !self.device_address.is_empty()
    }
}

/// What panels need to know about the operator and the target device.
/// Built once at login (or restored from the address store) and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    username: Option<String>,
    device_address: String,
}

impl SessionContext {
    pub fn from_session(session: &Session) -> Self {
        Self {
            username: Some(session.username.clone()),
            device_address: session.device_address.clone(),
        }
    }

    /// Context for a process that did not log in: last stored address, or the default.
    pub fn restore(store: &dyn AddressStore, default_address: &str) -> Self {
        let device_address = match store.load() {
            Ok(Some(addr)) => addr,
            Ok(None) => default_address.to_string(),
            Err(e) => {
                warn!("address store unreadable, using default: {:#}", e);
                default_address.to_string()
            }
        };
        Self { username: None, device_address }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn device_address(&self) -> &str {
        &self.device_address
    }
}
