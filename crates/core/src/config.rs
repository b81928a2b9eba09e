use serde::Deserialize;
use url::Url;

use crate::error::ProbeError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub target: TargetConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the site lives and which paths the pipeline touches.
/// Relative entries are joined onto `base_url`.
#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    pub base_url: String,
    #[serde(default = "default_login_page")]
    pub login_page: String,
    #[serde(default = "default_login_fallbacks")]
    pub login_fallbacks: Vec<String>,
    #[serde(default = "default_profile_paths")]
    pub profile_paths: Vec<String>,
    #[serde(default = "default_token_login")]
    pub token_login: String,
    #[serde(default = "default_token_field")]
    pub token_field: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_max_body_mb")]
    pub max_body_size_mb: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProbeConfig {
    #[serde(default = "default_max_token_attempts")]
    pub max_token_attempts: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_route")]
    pub route: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_timeout(),
            max_body_size_mb: default_max_body_mb(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_token_attempts: default_max_token_attempts(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            route: default_route(),
        }
    }
}

fn default_login_page() -> String { "/login".into() }
fn default_login_fallbacks() -> Vec<String> { vec!["/login".into(), "/login.php".into()] }
fn default_profile_paths() -> Vec<String> {
    ["/profile.php", "/profile", "/home.php", "/dashboard.php", "/"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}
fn default_token_login() -> String { "/logintoken.php".into() }
fn default_token_field() -> String { "access_token".into() }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Linux; Android 11; Mobile) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36".into()
}
fn default_timeout() -> u64 { 15 }
fn default_max_body_mb() -> usize { 10 }
fn default_max_token_attempts() -> usize { 5 }

/// Accepted range for `probe.max_token_attempts`, from file or env.
pub const TOKEN_ATTEMPTS_RANGE: std::ops::RangeInclusive<usize> = 1..=64;
fn default_listen() -> String { "127.0.0.1:8080".into() }
fn default_route() -> String { "/api/login".into() }

/// A configured profile path together with its absolute URL.
/// `path` is what gets reported back in the `pages` map.
#[derive(Debug, Clone)]
pub struct ProfileTarget {
    pub path: String,
    pub url: Url,
}

/// `TargetConfig` with every URL parsed and resolved.
#[derive(Debug, Clone)]
pub struct SiteTargets {
    pub login_page: Url,
    pub login_fallbacks: Vec<Url>,
    pub profile_paths: Vec<ProfileTarget>,
    pub token_login: Url,
    pub token_field: String,
    pub max_token_attempts: usize,
}

impl AppConfig {
    pub fn site_targets(&self) -> Result<SiteTargets, ProbeError> {
        let base = Url::parse(&self.target.base_url)
            .map_err(|e| ProbeError::InvalidUrl(format!("{}: {}", self.target.base_url, e)))?;

        if self.target.token_field.is_empty() {
            return Err(ProbeError::Config("target.token_field must not be empty".into()));
        }

        if !TOKEN_ATTEMPTS_RANGE.contains(&self.probe.max_token_attempts) {
            return Err(ProbeError::Config(format!(
                "probe.max_token_attempts must be within {}..={}, got {}",
                TOKEN_ATTEMPTS_RANGE.start(),
                TOKEN_ATTEMPTS_RANGE.end(),
                self.probe.max_token_attempts
            )));
        }

        let join = |s: &str| -> Result<Url, ProbeError> {
            base.join(s)
                .map_err(|e| ProbeError::InvalidUrl(format!("{}: {}", s, e)))
        };

        let login_fallbacks = self
            .target
            .login_fallbacks
            .iter()
            .map(|s| join(s.as_str()))
            .collect::<Result<Vec<_>, _>>()?;

        let profile_paths = self
            .target
            .profile_paths
            .iter()
            .map(|p| {
                Ok(ProfileTarget {
                    path: p.clone(),
                    url: join(p.as_str())?,
                })
            })
            .collect::<Result<Vec<_>, ProbeError>>()?;

        Ok(SiteTargets {
            login_page: join(self.target.login_page.as_str())?,
            login_fallbacks,
            profile_paths,
            token_login: join(self.target.token_login.as_str())?,
            token_field: self.target.token_field.clone(),
            max_token_attempts: self.probe.max_token_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [target]
            base_url = "https://site.test"
            "#,
        )
        .unwrap();

        assert_eq!(config.http.request_timeout_seconds, 15);
        assert_eq!(config.probe.max_token_attempts, 5);
        assert_eq!(config.target.token_field, "access_token");
        assert_eq!(config.server.route, "/api/login");

        let targets = config.site_targets().unwrap();
        assert_eq!(targets.login_page.as_str(), "https://site.test/login");
        assert_eq!(targets.login_fallbacks.len(), 2);
        assert_eq!(targets.login_fallbacks[1].as_str(), "https://site.test/login.php");
        assert_eq!(targets.profile_paths[0].path, "/profile.php");
        assert_eq!(targets.profile_paths[4].url.as_str(), "https://site.test/");
        assert_eq!(targets.token_login.as_str(), "https://site.test/logintoken.php");
    }

    #[test]
    fn test_absolute_entries_are_kept() {
        let config: AppConfig = toml::from_str(
            r#"
            [target]
            base_url = "https://site.test"
            login_page = "https://auth.site.test/signin"
            profile_paths = ["/me"]
            "#,
        )
        .unwrap();

        let targets = config.site_targets().unwrap();
        assert_eq!(targets.login_page.as_str(), "https://auth.site.test/signin");
        assert_eq!(targets.profile_paths.len(), 1);
        assert_eq!(targets.profile_paths[0].url.as_str(), "https://site.test/me");
    }

    #[test]
    fn test_bad_base_url_is_rejected() {
        let config: AppConfig = toml::from_str(
            r#"
            [target]
            base_url = "not a url"
            "#,
        )
        .unwrap();

        assert!(matches!(config.site_targets(), Err(ProbeError::InvalidUrl(_))));
    }

    #[test]
    fn test_token_attempts_out_of_range_is_rejected() {
        for attempts in [0, 65] {
            let config: AppConfig = toml::from_str(&format!(
                "[target]\nbase_url = \"https://site.test\"\n\n[probe]\nmax_token_attempts = {}\n",
                attempts
            ))
            .unwrap();

            assert!(matches!(config.site_targets(), Err(ProbeError::Config(_))));
        }

        let config: AppConfig = toml::from_str(
            "[target]\nbase_url = \"https://site.test\"\n\n[probe]\nmax_token_attempts = 64\n",
        )
        .unwrap();
        assert_eq!(config.site_targets().unwrap().max_token_attempts, 64);
    }
}
