mod cli;
mod commands;
mod server;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use tokenprobe_core::config::{AppConfig, TOKEN_ATTEMPTS_RANGE};
use tokenprobe_session::HttpSessionFactory;

use crate::cli::{Cli, Commands};
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config).unwrap_or_else(|_| {
        warn!(path = %cli.config, "config file not found, using defaults");
        include_str!("../config/default.toml").to_string()
    });
    let mut config: AppConfig = toml::from_str(&config_str)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    let site = config.site_targets()?;
    let sessions = Arc::new(HttpSessionFactory::new(config.http.clone()));

    match cli.command {
        Commands::Serve { listen } => {
            let listen = listen.unwrap_or_else(|| config.server.listen.clone());
            info!(
                login_page = %site.login_page,
                profile_paths = site.profile_paths.len(),
                max_token_attempts = site.max_token_attempts,
                "starting server"
            );
            let state = Arc::new(AppState { sessions, site });
            server::start(&listen, &config.server.route, state).await?;
        }
        Commands::Check { username, password } => {
            commands::run_check_once(sessions.as_ref(), &site, username, password).await?;
        }
    }

    Ok(())
}

/// Apply `TOKENPROBE_*` overrides; blank or out-of-range values are ignored.
fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("TOKENPROBE_BASE_URL").filter(|v| !v.is_empty()) {
        config.target.base_url = v;
    }
    if let Some(v) = lookup("TOKENPROBE_LISTEN").filter(|v| !v.is_empty()) {
        config.server.listen = v;
    }
    if let Some(n) = lookup("TOKENPROBE_TIMEOUT")
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|n| (1..=300).contains(n))
    {
        config.http.request_timeout_seconds = n;
        config.http.connect_timeout_seconds = n;
    }
    if let Some(n) = lookup("TOKENPROBE_MAX_TOKENS")
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|n| TOKEN_ATTEMPTS_RANGE.contains(n))
    {
        config.probe.max_token_attempts = n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn defaults() -> AppConfig {
        toml::from_str(include_str!("../config/default.toml")).unwrap()
    }

    fn apply(vars: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = defaults();
        apply_env_overrides(&mut config, |key| env.get(key).cloned());
        config
    }

    #[test]
    fn test_valid_overrides_are_applied() {
        let config = apply(&[
            ("TOKENPROBE_BASE_URL", "https://mirror.test"),
            ("TOKENPROBE_LISTEN", "0.0.0.0:9000"),
            ("TOKENPROBE_TIMEOUT", "30"),
            ("TOKENPROBE_MAX_TOKENS", "8"),
        ]);

        assert_eq!(config.target.base_url, "https://mirror.test");
        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert_eq!(config.http.request_timeout_seconds, 30);
        assert_eq!(config.http.connect_timeout_seconds, 30);
        assert_eq!(config.probe.max_token_attempts, 8);
    }

    #[test]
    fn test_out_of_range_values_are_ignored() {
        let config = apply(&[
            ("TOKENPROBE_TIMEOUT", "0"),
            ("TOKENPROBE_MAX_TOKENS", "65"),
        ]);
        assert_eq!(config.http.request_timeout_seconds, 15);
        assert_eq!(config.probe.max_token_attempts, 5);

        let config = apply(&[
            ("TOKENPROBE_TIMEOUT", "301"),
            ("TOKENPROBE_MAX_TOKENS", "lots"),
        ]);
        assert_eq!(config.http.request_timeout_seconds, 15);
        assert_eq!(config.probe.max_token_attempts, 5);
    }

    #[test]
    fn test_blank_strings_are_ignored() {
        let config = apply(&[("TOKENPROBE_BASE_URL", ""), ("TOKENPROBE_LISTEN", "")]);
        assert_eq!(config.target.base_url, "https://tuongtaccheo.com");
        assert_eq!(config.server.listen, "127.0.0.1:8080");
    }

    #[test]
    fn test_no_variables_leaves_config_untouched() {
        let config = apply(&[]);
        let stock = defaults();
        assert_eq!(config.target.base_url, stock.target.base_url);
        assert_eq!(config.probe.max_token_attempts, stock.probe.max_token_attempts);
    }
}
