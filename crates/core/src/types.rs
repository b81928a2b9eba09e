use std::borrow::Cow;
use std::fmt;

use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use url::Url;

use crate::error::ProbeError;

/// Everything the pipeline needs from an HTTP session.
///
/// Implementations keep cookies between calls, so a successful login is
/// visible to every later request on the same value.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<FetchResponse, ProbeError>;

    /// POST `form` as `application/x-www-form-urlencoded`, in the given order.
    async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
    ) -> Result<FetchResponse, ProbeError>;
}

/// Opens a fresh, isolated session for each inbound request.
pub trait SessionFactory: Send + Sync + 'static {
    fn open(&self) -> Result<Box<dyn Transport>, ProbeError>;
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: Url,
    pub final_url: Url,
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The first form of a login page, with its fields classified.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginForm {
    pub action_url: Url,
    /// Declared default value of every named input, in document order.
    pub inputs: Vec<(String, String)>,
    pub user_field: String,
    pub pass_field: String,
}

impl LoginForm {
    /// Form defaults with the credential fields overwritten.
    pub fn payload(&self, credentials: &Credentials) -> Vec<(String, String)> {
        let mut payload = self.inputs.clone();
        set_field(&mut payload, &self.user_field, &credentials.username);
        set_field(&mut payload, &self.pass_field, &credentials.password);
        payload
    }
}

/// Insert-or-replace on an ordered field list.
pub fn set_field(fields: &mut Vec<(String, String)>, name: &str, value: &str) {
    match fields.iter_mut().find(|(k, _)| k == name) {
        Some((_, v)) => *v = value.to_string(),
        None => fields.push((name.to_string(), value.to_string())),
    }
}

/// Balance and token candidates pulled out of one or more bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    pub sodu: Option<String>,
    /// Hex-like candidates in discovery order, duplicates included.
    pub hex_like: Vec<String>,
}

impl Findings {
    pub fn is_empty(&self) -> bool {
        self.sodu.is_none() && self.hex_like.is_empty()
    }

    /// Accumulate across pages: the first balance sticks, tokens pile up.
    pub fn absorb(&mut self, other: Findings) {
        if self.sodu.is_none() {
            self.sodu = other.sodu;
        }
        self.hex_like.extend(other.hex_like);
    }

    /// Take from `other` only the categories this value has nothing for.
    pub fn fill_missing(&mut self, other: Findings) {
        if self.sodu.is_none() {
            self.sodu = other.sodu;
        }
        if self.hex_like.is_empty() {
            self.hex_like = other.hex_like;
        }
    }
}

/// Path to status code, in fetch order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStatuses(Vec<(String, u16)>);

impl PageStatuses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: &str, status: u16) {
        match self.0.iter_mut().find(|(p, _)| p == path) {
            Some((_, s)) => *s = status,
            None => self.0.push((path.to_string(), status)),
        }
    }

    pub fn get(&self, path: &str) -> Option<u16> {
        self.0.iter().find(|(p, _)| p == path).map(|(_, s)| *s)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> {
        self.0.iter().map(|(p, s)| (p.as_str(), *s))
    }
}

impl Serialize for PageStatuses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (path, status) in &self.0 {
            map.serialize_entry(path, status)?;
        }
        map.end()
    }
}

/// Body of a token-login response.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenResponse {
    Structured(Value),
    Raw(String),
}

impl TokenResponse {
    pub fn decode(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => TokenResponse::Structured(value),
            Err(_) => TokenResponse::Raw(String::from_utf8_lossy(body).into_owned()),
        }
    }

    /// Only a JSON object with `"status": "success"` counts.
    pub fn is_success(&self) -> bool {
        match self {
            TokenResponse::Structured(Value::Object(obj)) => {
                obj.get("status").and_then(Value::as_str) == Some("success")
            }
            _ => false,
        }
    }

    /// The `data` object, when present and non-empty.
    pub fn account_data(&self) -> Option<&Map<String, Value>> {
        match self {
            TokenResponse::Structured(Value::Object(obj)) => obj
                .get("data")
                .and_then(Value::as_object)
                .filter(|data| !data.is_empty()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenAttempt {
    pub token: String,
    pub response: TokenResponse,
}

/// The JSON document returned to the caller.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutputSummary {
    pub co_token: bool,
    pub token: Option<String>,
    #[serde(rename = "use")]
    pub username: String,
    #[serde(rename = "mk")]
    pub password: String,
    pub user: Option<String>,
    pub sodu: Option<String>,
    pub pages: PageStatuses,
}

impl OutputSummary {
    pub fn new(credentials: &Credentials, findings: &Findings, pages: PageStatuses) -> Self {
        Self {
            co_token: false,
            token: None,
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            user: None,
            sodu: findings.sodu.clone(),
            pages,
        }
    }

    /// Summary for a request where nothing could be fetched at all.
    pub fn empty(credentials: &Credentials) -> Self {
        Self::new(credentials, &Findings::default(), PageStatuses::new())
    }

    pub fn apply_token(&mut self, attempt: &TokenAttempt) {
        self.co_token = true;
        self.token = Some(attempt.token.clone());
        if let Some(data) = attempt.response.account_data() {
            self.user = data.get("user").and_then(scalar_text);
            self.sodu = data.get("sodu").and_then(scalar_text);
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
