use tracing::{debug, info, warn};

use tokenprobe_core::{Credentials, FetchResponse, SiteTargets, Transport};
use tokenprobe_parser::locate_login_form;

/// Log in with the site's own form, or blind-post to the fallback endpoints.
///
/// When the login page yields a form, its submission response is returned
/// whatever the status. Otherwise each fallback URL is tried in order with
/// `username`/`password` fields and the first one that answers at all wins.
pub async fn submit_login(
    transport: &dyn Transport,
    site: &SiteTargets,
    credentials: &Credentials,
) -> Option<FetchResponse> {
    let page = match transport.get(&site.login_page).await {
        Ok(resp) => Some(resp),
        Err(e) => {
            debug!(url = %site.login_page, error = %e, "login page unavailable");
            None
        }
    };

    let form = page
        .as_ref()
        .and_then(|resp| locate_login_form(&resp.text(), &site.login_page));

    if let Some(form) = form {
        let payload = form.payload(credentials);
        info!(action = %form.action_url, "submitting login form");
        return match transport.post_form(&form.action_url, &payload).await {
            Ok(resp) => Some(resp),
            Err(e) => {
                warn!(action = %form.action_url, error = %e, "login form submission failed");
                None
            }
        };
    }

    info!(
        candidates = site.login_fallbacks.len(),
        "no login form found, trying fallback endpoints"
    );
    let payload = vec![
        ("username".to_string(), credentials.username.clone()),
        ("password".to_string(), credentials.password.clone()),
    ];

    for url in &site.login_fallbacks {
        match transport.post_form(url, &payload).await {
            Ok(resp) => {
                debug!(url = %url, status = resp.status, "fallback login answered");
                return Some(resp);
            }
            Err(e) => debug!(url = %url, error = %e, "fallback login failed"),
        }
    }

    warn!("every login endpoint failed");
    None
}
