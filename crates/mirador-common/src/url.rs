//! Address-bar URL normalization.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::ProtocolError;

fn scheme_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").expect("scheme regex"))
}

/// `host:8080` style input is a host with a port, not a scheme.
fn looks_like_host_port(input: &str) -> bool {
    match input.split_once(':') {
        Some((host, rest)) => {
            let port = rest.split('/').next().unwrap_or("");
            !host.is_empty()
                && !host.contains('/')
                && !port.is_empty()
                && port.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Normalize raw address-bar input into a loadable URL.
///
/// Empty or whitespace-only input is rejected. A bare string lacking a
/// scheme is assumed `https://`, unless it is an `about:` page or an
/// absolute path (which becomes `file://`).
pub fn normalize_url(raw: &str) -> Result<String, ProtocolError> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(ProtocolError::EmptyUrl);
    }
    if input.starts_with("about:") {
        return Ok(input.to_string());
    }
    if input.starts_with('/') {
        return Ok(format!("file://{input}"));
    }
    if looks_like_host_port(input) {
        return Ok(format!("https://{input}"));
    }
    if scheme_re().is_match(input) {
        return Ok(input.to_string());
    }
    Ok(format!("https://{input}"))
}
