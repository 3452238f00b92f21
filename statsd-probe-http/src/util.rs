pub(super) fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}

pub(super) fn host_header_value(parsed: &url::Url) -> Option<String> {
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) if port != 80 => Some(format!("{host}:{port}")),
        _ => Some(host.to_string()),
    }
}

pub(super) fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://h:1", "/login"), "http://h:1/login");
        assert_eq!(join_url("http://h:1/", "/login"), "http://h:1/login");
        assert_eq!(join_url("http://h:1", "login"), "http://h:1/login");
    }
}
