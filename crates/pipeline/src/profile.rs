use tracing::{debug, info};

use tokenprobe_core::{Findings, PageStatuses, SiteTargets, Transport};
use tokenprobe_parser::scan_response;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileScan {
    pub findings: Findings,
    pub pages: PageStatuses,
}

/// GET each profile path in order with the logged-in session.
///
/// Paths that fail at the transport level are left out of `pages`.
pub async fn scan_profiles(transport: &dyn Transport, site: &SiteTargets) -> ProfileScan {
    let mut scan = ProfileScan::default();

    for target in &site.profile_paths {
        let resp = match transport.get(&target.url).await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(path = %target.path, error = %e, "profile path skipped");
                continue;
            }
        };

        scan.pages.record(&target.path, resp.status);
        scan.findings.absorb(scan_response(&resp));
    }

    info!(
        fetched = scan.pages.len(),
        sodu = scan.findings.sodu.is_some(),
        tokens = scan.findings.hex_like.len(),
        "profile scan finished"
    );

    scan
}
