//! Host session data (`initData`).
//!
//! The embedding chat client hands every Mini App launch a signed, URL-encoded query
//! string describing the user (`query_id=…&user=%7B…%7D&auth_date=…&hash=…`). The
//! backend verifies the signature; this client only needs to know whether the data
//! is present, and decodes the readable parts for the status screen and the logs.
//!
//! Absence is the only fatal condition: without `initData` the client shows
//! [`HOST_WARNING`] and never sends a request. Malformed data is forwarded as-is
//! and left for the backend to reject.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::config::HostConfig;

/// Static notice shown in place of the story when the host check fails.
pub const HOST_WARNING: [&str; 2] = [
    "⚠️ Это приложение работает только внутри Telegram.",
    "Откройте его через меню бота или по ссылке из чата.",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    /// No `initData` from the CLI, the configured environment variable or the config file.
    #[error("host session data is missing (set ${env_var} or host.init_data)")]
    MissingInitData { env_var: String },
}

/// `user` field of `initData`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WebAppUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl WebAppUser {
    pub fn display_name(&self) -> String {
        let full = match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        };
        if !full.trim().is_empty() {
            return full;
        }
        match &self.username {
            Some(u) if !u.is_empty() => format!("@{}", u),
            _ => format!("id{}", self.id),
        }
    }
}

/// Decoded view of `initData`. Unknown keys are kept in `fields`.
#[derive(Debug, Clone, Default)]
pub struct InitData {
    pub query_id: Option<String>,
    pub user: Option<WebAppUser>,
    pub auth_date: Option<DateTime<Utc>>,
    pub hash: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl InitData {
    /// Decode the query string. Pairs that are not valid UTF-8 after percent-decoding
    /// are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut data = InitData::default();
        for pair in raw.trim().split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let (Some(key), Some(value)) = (form_decode(key), form_decode(value)) else {
                continue;
            };
            match key.as_str() {
                "query_id" => data.query_id = Some(value.clone()),
                "user" => data.user = serde_json::from_str(&value).ok(),
                "auth_date" => {
                    data.auth_date = value
                        .parse::<i64>()
                        .ok()
                        .and_then(|secs| DateTime::from_timestamp(secs, 0))
                }
                "hash" => data.hash = Some(value.clone()),
                _ => {}
            }
            data.fields.push((key, value));
        }
        data
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_signed(&self) -> bool {
        self.hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

fn form_decode(s: &str) -> Option<String> {
    let spaced = s.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|c| c.into_owned())
}

/// Host session data as forwarded to the backend.
#[derive(Debug, Clone)]
pub struct HostSession {
    raw: String,
    data: InitData,
}

impl HostSession {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let data = InitData::parse(&raw);
        Self { raw, data }
    }

    /// Resolve `initData` with precedence CLI > environment > config file.
    ///
    /// Blank values count as absent at every level. The chosen value is kept verbatim.
    pub fn resolve(
        cli: Option<&str>,
        env_value: Option<String>,
        config: &HostConfig,
    ) -> Result<Self, HostError> {
        let chosen = cli
            .map(str::to_string)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| env_value.filter(|v| !v.trim().is_empty()))
            .or_else(|| config.init_data.clone().filter(|v| !v.trim().is_empty()));

        match chosen {
            Some(raw) => Ok(Self::new(raw)),
            None => Err(HostError::MissingInitData {
                env_var: config.init_data_env.clone(),
            }),
        }
    }

    /// [`HostSession::resolve`] reading the environment variable named in `config`.
    pub fn from_env(cli: Option<&str>, config: &HostConfig) -> Result<Self, HostError> {
        let env_value = std::env::var(&config.init_data_env).ok();
        Self::resolve(cli, env_value, config)
    }

    /// The verbatim string sent as `initData`.
    pub fn init_data(&self) -> &str {
        &self.raw
    }

    pub fn data(&self) -> &InitData {
        &self.data
    }

    pub fn player_name(&self) -> Option<String> {
        self.data.user.as_ref().map(WebAppUser::display_name)
    }
}
