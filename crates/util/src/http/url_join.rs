/// Joins a controller base URL and a query URI with exactly one `/` between them.
///
/// RESTCONF paths contain `:` (`network-topology:network-topology`), so the URI
/// is appended verbatim instead of going through `Url::join`, which would treat
/// the prefix before the colon as a scheme.
///
/// # Examples
/// ```rust
/// use odl_util::http::join_url;
///
/// assert_eq!(
///     join_url("http://localhost:8181/", "/rests/data/network-topology:network-topology"),
///     "http://localhost:8181/rests/data/network-topology:network-topology"
/// );
/// assert_eq!(join_url("http://localhost:8181", ""), "http://localhost:8181");
/// ```
pub fn join_url(base_url: &str, uri: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = uri.trim().trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{base}/{path}")
}
