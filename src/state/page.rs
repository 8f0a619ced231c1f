//! Page tags derived from the URL path.

/// Page shown for the site root and index documents.
pub const DEFAULT_PAGE: &str = "dashboard";

/// Map a URL path to the tag of the page it shows.
///
/// `/` and `/index.*` map to [`DEFAULT_PAGE`]; anything else yields the last
/// path segment without its extension. An empty segment falls back to the
/// default as well.
pub fn page_name_from_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segment = path.rsplit('/').next().unwrap_or_default();

    let name = match segment.rfind('.') {
        Some(dot) if dot > 0 => &segment[..dot],
        _ => segment,
    };

    if name.is_empty() || name == "index" {
        DEFAULT_PAGE.to_string()
    } else {
        name.to_string()
    }
}
