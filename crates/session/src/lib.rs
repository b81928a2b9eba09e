use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, warn};
use url::Url;

use tokenprobe_core::config::HttpConfig;
use tokenprobe_core::{FetchResponse, ProbeError, SessionFactory, Transport};

/// One login attempt's worth of HTTP state.
///
/// Wraps a cookie-storing reqwest client so that cookies set by the login
/// response ride along on every later profile and token request.
pub struct HttpSession {
    client: reqwest::Client,
    request_timeout: Duration,
    max_body_size: usize,
}

impl HttpSession {
    pub fn new(config: &HttpConfig) -> Result<Self, ProbeError> {
        let mut headers = HeaderMap::new();
        let ua = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ProbeError::Config(format!("invalid user agent: {}", e)))?;
        headers.insert(USER_AGENT, ua);

        let request_timeout = Duration::from_secs(config.request_timeout_seconds);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            request_timeout,
            max_body_size: config.max_body_size_mb * 1024 * 1024,
        })
    }

    fn classify(&self, url: &Url, err: reqwest::Error) -> ProbeError {
        if err.is_timeout() {
            warn!(url = %url, "request timed out");
            ProbeError::Timeout(self.request_timeout.as_secs())
        } else {
            warn!(url = %url, error = %err, "request failed");
            ProbeError::Network(err.to_string())
        }
    }

    async fn read(
        &self,
        url: &Url,
        resp: reqwest::Response,
        start: Instant,
    ) -> Result<FetchResponse, ProbeError> {
        let status = resp.status().as_u16();
        let final_url = resp.url().clone();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = resp.bytes().await.map_err(|e| self.classify(url, e))?;

        if body.len() > self.max_body_size {
            return Err(ProbeError::BodyTooLarge {
                size: body.len(),
                max: self.max_body_size,
            });
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        debug!(
            url = %url,
            status,
            elapsed_ms,
            content_type = %content_type,
            bytes = body.len(),
            "response received"
        );

        Ok(FetchResponse {
            url: url.clone(),
            final_url,
            status,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl Transport for HttpSession {
    async fn get(&self, url: &Url) -> Result<FetchResponse, ProbeError> {
        let start = Instant::now();
        debug!(url = %url, "GET");

        let resp = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        self.read(url, resp, start).await
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
    ) -> Result<FetchResponse, ProbeError> {
        let start = Instant::now();
        debug!(url = %url, fields = form.len(), "POST form");

        let resp = self
            .client
            .post(url.as_str())
            .form(form)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        self.read(url, resp, start).await
    }
}

/// Builds a brand-new `HttpSession` per call; nothing is shared between them.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    config: HttpConfig,
}

impl HttpSessionFactory {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for HttpSessionFactory {
    fn open(&self) -> Result<Box<dyn Transport>, ProbeError> {
        Ok(Box::new(HttpSession::new(&self.config)?))
    }
}
