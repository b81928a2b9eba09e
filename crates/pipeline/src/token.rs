use std::collections::HashSet;

use tracing::{debug, info};

use tokenprobe_core::{SiteTargets, TokenAttempt, TokenResponse, Transport};

/// Deduplicate, order longest-first (stable), and cap at `max_attempts`.
pub fn rank_candidates(tokens: &[String], max_attempts: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ranked = Vec::new();
    for token in tokens {
        if seen.insert(token.as_str()) {
            ranked.push(token.clone());
        }
    }
    ranked.sort_by(|a, b| b.len().cmp(&a.len()));
    ranked.truncate(max_attempts);
    ranked
}

/// Post candidates to the token-login endpoint until one is accepted.
pub async fn probe_tokens(
    transport: &dyn Transport,
    site: &SiteTargets,
    tokens: &[String],
) -> Option<TokenAttempt> {
    if tokens.is_empty() {
        return None;
    }

    let candidates = rank_candidates(tokens, site.max_token_attempts);
    let mut tried: HashSet<&str> = HashSet::new();

    for token in &candidates {
        if token.is_empty() || !tried.insert(token.as_str()) {
            continue;
        }

        let form = [(site.token_field.clone(), token.clone())];
        let resp = match transport.post_form(&site.token_login, &form).await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(error = %e, "token attempt got no response");
                continue;
            }
        };

        let response = TokenResponse::decode(&resp.body);
        if response.is_success() {
            info!(attempts = tried.len(), "token accepted");
            return Some(TokenAttempt {
                token: token.clone(),
                response,
            });
        }
        debug!(status = resp.status, "token rejected");
    }

    info!(attempts = tried.len(), "no token accepted");
    None
}
