//! In-memory `Transport` for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use tokenprobe_core::config::{AppConfig, TargetConfig};
use tokenprobe_core::{FetchResponse, ProbeError, SiteTargets, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: &'static str,
    pub url: String,
    pub form: Vec<(String, String)>,
}

/// Answers from a table keyed by `(method, url)`; anything unscripted is a
/// network error. Every call is recorded in arrival order.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<(&'static str, String), (u16, String)>,
    token_replies: HashMap<String, String>,
    calls: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(("GET", url.to_string()), (status, body.to_string()));
        self
    }

    pub fn on_post(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(("POST", url.to_string()), (status, body.to_string()));
        self
    }

    /// Reply body for a token-login post carrying this exact token value.
    pub fn on_token(mut self, token: &str, body: &str) -> Self {
        self.token_replies.insert(token.to_string(), body.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn posts_to(&self, url: &str) -> Vec<Recorded> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == "POST" && c.url == url)
            .collect()
    }

    fn answer(
        &self,
        method: &'static str,
        url: &Url,
        form: &[(String, String)],
    ) -> Result<FetchResponse, ProbeError> {
        self.calls.lock().unwrap().push(Recorded {
            method,
            url: url.to_string(),
            form: form.to_vec(),
        });

        let token_reply = form
            .iter()
            .find(|(k, _)| k == "access_token")
            .and_then(|(_, v)| self.token_replies.get(v));

        let (status, body) = match token_reply {
            Some(body) => (200, body.clone()),
            None => self
                .routes
                .get(&(method, url.to_string()))
                .cloned()
                .ok_or_else(|| ProbeError::Network(format!("unscripted {} {}", method, url)))?,
        };

        Ok(FetchResponse {
            url: url.clone(),
            final_url: url.clone(),
            status,
            body: body.into_bytes(),
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<FetchResponse, ProbeError> {
        self.answer("GET", url, &[])
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
    ) -> Result<FetchResponse, ProbeError> {
        self.answer("POST", url, form)
    }
}

pub const BASE: &str = "https://site.test";

/// Targets for `https://site.test` with the stock path lists.
pub fn site() -> SiteTargets {
    AppConfig {
        target: TargetConfig {
            base_url: BASE.into(),
            login_page: "/login".into(),
            login_fallbacks: vec!["/login".into(), "/login.php".into()],
            profile_paths: vec![
                "/profile.php".into(),
                "/profile".into(),
                "/home.php".into(),
                "/dashboard.php".into(),
                "/".into(),
            ],
            token_login: "/logintoken.php".into(),
            token_field: "access_token".into(),
        },
        http: Default::default(),
        probe: Default::default(),
        server: Default::default(),
    }
    .site_targets()
    .unwrap()
}

pub fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}
