pub mod login;
pub mod profile;
pub mod token;

#[cfg(test)]
mod testing;

pub use login::submit_login;
pub use profile::{scan_profiles, ProfileScan};
pub use token::{probe_tokens, rank_candidates};

use tracing::{debug, info};

use tokenprobe_core::{Credentials, Findings, OutputSummary, SiteTargets, Transport};
use tokenprobe_parser::scan_response;

/// Run login, profile scan and token probing in sequence on one session.
///
/// Every step degrades to "nothing found" on transport failure, so this
/// always produces a summary. There is no overall deadline; each call is
/// bounded only by the transport's own timeout.
pub async fn run_check(
    transport: &dyn Transport,
    site: &SiteTargets,
    credentials: &Credentials,
) -> OutputSummary {
    debug!(username = %credentials.username, "starting check");

    let mut found = match submit_login(transport, site, credentials).await {
        Some(resp) => {
            info!(status = resp.status, url = %resp.final_url, "login response received");
            scan_response(&resp)
        }
        None => Findings::default(),
    };

    let ProfileScan { findings, pages } = scan_profiles(transport, site).await;
    found.fill_missing(findings);

    let mut summary = OutputSummary::new(credentials, &found, pages);

    if let Some(attempt) = probe_tokens(transport, site, &found.hex_like).await {
        summary.apply_token(&attempt);
    }

    info!(
        co_token = summary.co_token,
        sodu = summary.sodu.is_some(),
        pages = summary.pages.len(),
        "check finished"
    );
    summary
}
