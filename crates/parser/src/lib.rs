pub mod form;
pub mod patterns;

pub use form::locate_login_form;
pub use patterns::{find_hex_tokens, find_sodu, find_sodu_and_tokens};

use tokenprobe_core::{FetchResponse, Findings};

/// Pattern-scan a fetched body in full.
///
/// The session already rejects bodies over `http.max_body_size_mb`, so
/// everything that reaches this point is scanned.
pub fn scan_response(resp: &FetchResponse) -> Findings {
    find_sodu_and_tokens(&resp.text())
}
