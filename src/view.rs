//! Physical view-path convention shared with the rendering collaborator.
//!
//! Handlers name logical views; the dispatcher only forwards to the resolved path and
//! never renders anything itself.

/// Directory holding private views.
pub const VIEW_ROOT: &str = "/WEB-INF/jsp/";

/// Extension appended to every view name.
pub const VIEW_SUFFIX: &str = ".jsp";

/// Request attribute holding `//host:port<context>/` for templates.
pub const CONTEXT_BASE_URL_ATTR: &str = "contextBaseUrl";

/// Resolve a logical view name.
///
/// Private views live under [`VIEW_ROOT`]; public views resolve relative to the request.
///
/// ```rust
/// use webframe::view::view_path;
///
/// assert_eq!(view_path("index", false), "/WEB-INF/jsp/index.jsp");
/// assert_eq!(view_path("about", true), "about.jsp");
/// ```
#[must_use]
pub fn view_path(view: &str, public: bool) -> String {
    if public {
        format!("{view}{VIEW_SUFFIX}")
    } else {
        format!("{VIEW_ROOT}{view}{VIEW_SUFFIX}")
    }
}

/// `//host:port<context>/`
#[must_use]
pub fn context_base_url(server_name: &str, port: u16, context_path: &str) -> String {
    format!("//{server_name}:{port}{context_path}/")
}
