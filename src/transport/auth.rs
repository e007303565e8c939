use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderValue;
use url::Url;

/// `Basic base64(user-info)` for a destination carrying user-info.
///
/// The user-info is encoded as it appears in the URL (`user:pass`, or just
/// `user` without a password).
pub fn basic_auth_header(destination: &Url) -> Option<HeaderValue> {
    let user = destination.username();
    let password = destination.password();
    if user.is_empty() && password.is_none() {
        return None;
    }

    let user_info = match password {
        Some(password) => format!("{user}:{password}"),
        None => user.to_string(),
    };
    let mut value = HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(user_info))).ok()?;
    value.set_sensitive(true);
    Some(value)
}

/// The destination without user-info, used as the request URL.
pub fn strip_credentials(destination: &Url) -> Url {
    let mut url = destination.clone();
    // Only fails for URLs that cannot carry credentials, which have none to strip.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url
}

/// Destination rendering for logs and errors: credentials never appear.
pub fn redacted(destination: &Url) -> String {
    strip_credentials(destination).to_string()
}
