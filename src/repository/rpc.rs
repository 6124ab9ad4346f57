// src/repository/rpc.rs

//! Wire types for the AUR JSON-RPC interface
//!
//! Field names follow the RPC verbatim (`Name`, `Version`, `URLPath`, ...).
//! Older servers encode every scalar as a string ("NumVotes": "12",
//! "OutOfDate": "0"), newer ones use numbers and `null`, so the numeric
//! fields accept both.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Package metadata as returned by the AUR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMetadata {
    #[serde(rename = "ID", default, deserialize_with = "lenient_u64")]
    pub id: u64,

    #[serde(rename = "Name")]
    pub name: String,

    /// `<version>-<release>`, possibly with an epoch prefix
    #[serde(rename = "Version")]
    pub version_release: String,

    #[serde(rename = "Description", default)]
    pub description: Option<String>,

    #[serde(rename = "CategoryID", default, deserialize_with = "lenient_u64")]
    pub category_id: u64,

    #[serde(rename = "LocationID", default, deserialize_with = "lenient_u64")]
    pub location_id: u64,

    /// Upstream project URL
    #[serde(rename = "URL", default)]
    pub url: Option<String>,

    /// Path of the snapshot tarball relative to the AUR base URL
    #[serde(rename = "URLPath", default)]
    pub download_path: String,

    #[serde(rename = "License", default, deserialize_with = "lenient_list")]
    pub licenses: Vec<String>,

    #[serde(rename = "NumVotes", default, deserialize_with = "lenient_u64")]
    pub vote_count: u64,

    #[serde(rename = "OutOfDate", default, deserialize_with = "lenient_flag")]
    pub out_of_date: bool,
}

impl RemoteMetadata {
    /// Minimal metadata record, mostly useful for tests and fakes
    pub fn new(name: impl Into<String>, version_release: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: 0,
            download_path: format!("/packages/{0}/{0}.tar.gz", name),
            name,
            version_release: version_release.into(),
            description: None,
            category_id: 0,
            location_id: 0,
            url: None,
            licenses: Vec::new(),
            vote_count: 0,
            out_of_date: false,
        }
    }
}

/// RPC response envelope
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub results: RpcResults,

    /// Error message on newer servers; older ones put it in `results`
    #[serde(default)]
    pub error: Option<String>,
}

/// The `results` member, whose shape depends on the request and outcome
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RpcResults {
    Many(Vec<RemoteMetadata>),
    One(Box<RemoteMetadata>),
    Message(String),
    Empty,
}

impl Default for RpcResults {
    fn default() -> Self {
        RpcResults::Many(Vec::new())
    }
}

fn is_no_result(message: &str) -> bool {
    let message = message.trim().to_lowercase();
    message == "no result found" || message == "no results found"
}

impl RpcResponse {
    fn error_message(&self) -> Option<String> {
        if self.kind != "error" {
            return None;
        }
        let message = match (&self.error, &self.results) {
            (Some(message), _) => message.clone(),
            (None, RpcResults::Message(message)) => message.clone(),
            _ => "unknown rpc error".to_string(),
        };
        Some(message)
    }

    /// Interpret the response to an `info` request for `name`
    pub fn into_info(self, name: &str) -> Result<RemoteMetadata> {
        if let Some(message) = self.error_message() {
            if is_no_result(&message) {
                return Err(Error::NotFound(name.to_string()));
            }
            return Err(Error::Rpc(format!("{} {}", name, message.to_lowercase())));
        }

        match self.results {
            RpcResults::One(meta) if meta.name != name => Err(Error::NotFound(name.to_string())),
            RpcResults::One(meta) => Ok(*meta),
            RpcResults::Many(mut list) => {
                // multiinfo-style answers; only an exact name counts
                match list.iter().position(|m| m.name == name) {
                    Some(idx) => Ok(list.swap_remove(idx)),
                    None => Err(Error::NotFound(name.to_string())),
                }
            }
            RpcResults::Message(message) if is_no_result(&message) => {
                Err(Error::NotFound(name.to_string()))
            }
            RpcResults::Message(message) => {
                Err(Error::Rpc(format!("{} {}", name, message.to_lowercase())))
            }
            RpcResults::Empty => Err(Error::NotFound(name.to_string())),
        }
    }

    /// Interpret the response to a `search` request
    pub fn into_search(self) -> Result<Vec<RemoteMetadata>> {
        if let Some(message) = self.error_message() {
            if is_no_result(&message) {
                return Ok(Vec::new());
            }
            return Err(Error::Rpc(message.to_lowercase()));
        }

        match self.results {
            RpcResults::Many(list) => Ok(list),
            RpcResults::One(meta) => Ok(vec![*meta]),
            RpcResults::Message(message) if is_no_result(&message) => Ok(Vec::new()),
            RpcResults::Message(message) => Err(Error::Rpc(message.to_lowercase())),
            RpcResults::Empty => Ok(Vec::new()),
        }
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => Ok(n.as_u64().unwrap_or(0)),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got {:?}", s))),
        other => Err(serde::de::Error::custom(format!(
            "expected an integer, got {}",
            other
        ))),
    }
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0")
        }
        _ => true,
    })
}

fn lenient_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        other => vec![other.to_string()],
    })
}
