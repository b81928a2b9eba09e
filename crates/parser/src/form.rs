use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use tokenprobe_core::LoginForm;

const DEFAULT_USER_FIELD: &str = "username";
const DEFAULT_PASS_FIELD: &str = "password";

/// Locate the first `<form>` in `html` and classify its inputs.
///
/// The last named `password` input becomes the password field and the first
/// named `text`/`email` input the username field. Every named input has its
/// default value recorded. Missing credential fields fall back to
/// `username`/`password`. Returns `None` when the page has no form.
pub fn locate_login_form(html: &str, base_url: &Url) -> Option<LoginForm> {
    let document = Html::parse_document(html);
    let form = selector("form").and_then(|s| document.select(&s).next())?;

    let action = form.value().attr("action").unwrap_or("");
    let action_url = base_url.join(action).unwrap_or_else(|_| base_url.clone());

    let mut inputs: Vec<(String, String)> = Vec::new();
    let mut user_field: Option<String> = None;
    let mut pass_field: Option<String> = None;

    if let Some(input_sel) = selector("input") {
        for input in form.select(&input_sel) {
            let name = match input.value().attr("name") {
                Some(n) if !n.is_empty() => n,
                _ => continue,
            };
            let input_type = input.value().attr("type").unwrap_or("").to_lowercase();

            match input_type.as_str() {
                "password" => pass_field = Some(name.to_string()),
                "text" | "email" => {
                    if user_field.is_none() {
                        user_field = Some(name.to_string());
                    }
                }
                _ => {}
            }

            let value = input.value().attr("value").unwrap_or("");
            tokenprobe_core::set_field(&mut inputs, name, value);
        }
    }

    debug!(
        action = %action_url,
        inputs = inputs.len(),
        user_field = ?user_field,
        pass_field = ?pass_field,
        "located login form"
    );

    Some(LoginForm {
        action_url,
        inputs,
        user_field: user_field.unwrap_or_else(|| DEFAULT_USER_FIELD.to_string()),
        pass_field: pass_field.unwrap_or_else(|| DEFAULT_PASS_FIELD.to_string()),
    })
}

fn selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}
