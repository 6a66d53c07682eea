//! Company registry lookups.
//!
//! Used when a report needs details about a company identifier (e.g. the
//! employer or a union's registration number). Consolidation never calls it.
//! [`HttpRegistryLookup`] queries a ReceitaWS-compatible endpoint.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Public CNPJ endpoint; the identifier is appended as a path segment.
pub const DEFAULT_REGISTRY_URL: &str = "https://www.receitaws.com.br/v1/cnpj";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response fields copied into [`RegistryProfile::details`] when present.
const DETAIL_FIELDS: &[&str] = &[
    "tipo",
    "porte",
    "natureza_juridica",
    "abertura",
    "capital_social",
    "email",
    "telefone",
    "municipio",
    "uf",
];

/// A registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryProfile {
    /// Digits-only identifier.
    pub id: String,
    /// Legal name.
    pub legal_name: String,
    /// Trade name, when different from the legal name.
    #[serde(default)]
    pub trade_name: Option<String>,
    /// Registration status (e.g. "ATIVA").
    #[serde(default)]
    pub status: Option<String>,
    /// Any other fields the registry returned.
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

/// Looks up an identifier in a company registry.
///
/// Errors are plain messages; a failed lookup is reported, never fatal.
pub trait RegistryLookup {
    /// Looks up one identifier.
    fn lookup(&self, id: &str) -> Result<RegistryProfile, String>;
}

/// Strips punctuation from a registry identifier ("12.345.678/0001-90").
///
/// # Examples
///
/// ```
/// use benefit_engine::external::normalize_registry_id;
///
/// assert_eq!(normalize_registry_id("12.345.678/0001-90"), "12345678000190");
/// ```
pub fn normalize_registry_id(id: &str) -> String {
    id.chars().filter(char::is_ascii_digit).collect()
}

/// Builds a profile from a registry response body.
///
/// The registry answers `"status": "OK"` on success; anything else is an
/// error carrying the registry's `message`.
pub fn profile_from_response(id: &str, body: &Value) -> Result<RegistryProfile, String> {
    let text = |field: &str| {
        body.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    if text("status").as_deref() != Some("OK") {
        return Err(format!(
            "registry rejected {}: {}",
            id,
            text("message").unwrap_or_else(|| "unknown error".to_string())
        ));
    }

    let legal_name = text("nome").ok_or_else(|| format!("registry entry {} has no name", id))?;

    let mut details: BTreeMap<String, String> = DETAIL_FIELDS
        .iter()
        .filter_map(|field| text(field).map(|value| (field.to_string(), value)))
        .collect();
    if let Some(activity) = body
        .pointer("/atividade_principal/0/text")
        .and_then(Value::as_str)
    {
        details.insert("atividade_principal".to_string(), activity.to_string());
    }

    Ok(RegistryProfile {
        id: id.to_string(),
        legal_name,
        trade_name: text("fantasia"),
        status: text("situacao"),
        details,
    })
}

/// Registry lookup over HTTP.
///
/// Uses a blocking client; async callers must run it on a blocking thread.
#[derive(Debug, Clone)]
pub struct HttpRegistryLookup {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRegistryLookup {
    /// Creates a lookup against `base_url`, sending `token` as a query
    /// parameter when given.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }
}

impl RegistryLookup for HttpRegistryLookup {
    fn lookup(&self, id: &str) -> Result<RegistryProfile, String> {
        let url = format!("{}/{}", self.base_url, id);
        let mut request = self.client.get(&url).header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.query(&[("token", token)]);
        }

        let response = request
            .send()
            .map_err(|e| format!("registry request for {} failed: {}", id, e))?;
        let status = response.status();
        let body: Value = response.json().map_err(|e| {
            format!(
                "registry response for {} is not JSON ({}): {}",
                id, status, e
            )
        })?;

        info!(id, status = %status, "Registry lookup completed");
        profile_from_response(id, &body)
    }
}

/// Memoizes a [`RegistryLookup`] by normalized identifier.
///
/// Each distinct identifier reaches the inner lookup at most once per
/// instance, including identifiers whose lookup failed.
#[derive(Debug)]
pub struct CachedRegistryLookup<L> {
    inner: L,
    cache: Mutex<HashMap<String, Result<RegistryProfile, String>>>,
}

impl<L: RegistryLookup> CachedRegistryLookup<L> {
    /// Wraps a lookup.
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct identifiers looked up so far.
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Returns true if nothing was looked up yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L: RegistryLookup> RegistryLookup for CachedRegistryLookup<L> {
    fn lookup(&self, id: &str) -> Result<RegistryProfile, String> {
        let id = normalize_registry_id(id);
        if id.is_empty() {
            return Err("identifier has no digits".to_string());
        }

        let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(cached) = cache.get(&id) {
            debug!(id = %id, "Registry profile served from cache");
            return cached.clone();
        }

        let result = self.inner.lookup(&id);
        cache.insert(id, result.clone());
        result
    }
}
