//! Process settings loaded via OrthoConfig.
//!
//! Every field can be set from the command line, a config file, or a
//! `MARKET_`-prefixed environment variable. Accessors apply defaults and
//! parse the raw strings, so a bad value fails startup with a named field.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};
use url::Url;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Which hosted backend the process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process collections; nothing survives a restart.
    Memory,
    /// Firestore and Identity Toolkit over REST.
    Firestore,
}

impl BackendKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Firestore => "firestore",
        }
    }
}

/// A setting that is present but unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: String },
    #[error("{field} is required when {reason}")]
    Missing {
        field: &'static str,
        reason: &'static str,
    },
}

impl SettingsError {
    fn invalid(field: &'static str, message: impl ToString) -> Self {
        Self::Invalid {
            field,
            message: message.to_string(),
        }
    }
}

/// Firestore connection values, present only for the Firestore backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub api_key: Option<String>,
    pub base_url: Option<Url>,
    pub auth_base_url: Option<Url>,
}

/// Marketplace server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKET")]
pub struct MarketSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// `memory` or `firestore`.
    pub backend: Option<String>,
    pub firestore_project_id: Option<String>,
    /// Web API key sent with every Firestore and Identity Toolkit call.
    pub firestore_api_key: Option<String>,
    /// Override for the Firestore REST root, mainly for emulators.
    pub firestore_base_url: Option<String>,
    /// Override for the Identity Toolkit REST root.
    pub auth_base_url: Option<String>,
    /// How often the Firestore adapter re-runs a subscribed query.
    pub poll_interval_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    /// Origins allowed to open the live feed. The environment form is
    /// comma separated.
    #[serde(default, deserialize_with = "origin_list")]
    pub allowed_origins: Vec<String>,
    /// Load demo listings and a demo account into the memory backend.
    #[ortho_config(default = false)]
    pub seed_demo_data: bool,
}

impl MarketSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .trim()
            .parse()
            .map_err(|error| SettingsError::invalid("bind_addr", error))
    }

    pub fn backend(&self) -> Result<BackendKind, SettingsError> {
        match self
            .backend
            .as_deref()
            .map(str::trim)
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            None | Some("") | Some("memory") => Ok(BackendKind::Memory),
            Some("firestore") => Ok(BackendKind::Firestore),
            Some(other) => Err(SettingsError::invalid(
                "backend",
                format!("expected memory or firestore, got {other:?}"),
            )),
        }
    }

    /// Firestore values. The project id is required.
    pub fn firestore(&self) -> Result<FirestoreSettings, SettingsError> {
        let project_id = self
            .firestore_project_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(SettingsError::Missing {
                field: "firestore_project_id",
                reason: "backend is firestore",
            })?
            .to_owned();
        Ok(FirestoreSettings {
            project_id,
            api_key: self
                .firestore_api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_owned),
            base_url: parse_base_url("firestore_base_url", self.firestore_base_url.as_deref())?,
            auth_base_url: parse_base_url("auth_base_url", self.auth_base_url.as_deref())?,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_interval_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Parsed origin allow-list. Empty when unset.
    pub fn allowed_origins(&self) -> Result<Vec<Url>, SettingsError> {
        self.allowed_origins
            .iter()
            .map(|raw| raw.trim())
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                Url::parse(raw)
                    .map_err(|error| SettingsError::invalid("allowed_origins", format!("{raw}: {error}")))
            })
            .collect()
    }
}

/// Accept either a list or a single comma-separated string. The environment
/// layer yields a list only when the value contains a comma.
fn origin_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let entries = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(raw) => raw.split(',').map(str::to_owned).collect(),
        OneOrMany::Many(entries) => entries,
    };
    Ok(entries
        .into_iter()
        .map(|entry| entry.trim().to_owned())
        .filter(|entry| !entry.is_empty())
        .collect())
}

/// Base URLs must end in `/` so relative joins keep the last path segment.
fn parse_base_url(field: &'static str, raw: Option<&str>) -> Result<Option<Url>, SettingsError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    let normalised = if raw.ends_with('/') {
        raw.to_owned()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalised)
        .map(Some)
        .map_err(|error| SettingsError::invalid(field, error))
}
