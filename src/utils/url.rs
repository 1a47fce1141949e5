//! Backend address handling.
//!
//! Every request path is joined onto the configured base URL, so trailing
//! slashes on the base and leading slashes on the path are folded away here.

/// Strip trailing slashes from a backend address.
///
/// ```
/// use resilia::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8080/api"), "http://localhost:8080/api");
/// assert_eq!(normalize_base_url("http://localhost:8080/api///"), "http://localhost:8080/api");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join an endpoint path onto the base URL with exactly one separator.
///
/// ```
/// use resilia::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8080/api/", "/auth/login"),
///     "http://localhost:8080/api/auth/login"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}

/// Whether `value` looks like an address reqwest can talk to.
pub fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    ["http://", "https://"]
        .iter()
        .any(|scheme| value.len() > scheme.len() && value.starts_with(scheme))
}
