//! Router core module - URL template compilation and first-match lookup.

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::DefinitionError;

/// Maximum number of URL captures before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Inline capture storage; names are shared with the compiled route.
pub type CaptureVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Character class a single placeholder accepts.
///
/// Letters, digits and `-_~.';:@&=+%#$`. Slashes never match, so a placeholder spans at
/// most one path segment; `%` lets percent-encoded text through undecoded.
pub const PLACEHOLDER_CLASS: &str = r"[a-zA-Z0-9\-_~.';:@&=+%#$]*";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-zA-Z0-9]*)\}").expect("placeholder regex is valid"));

/// A path template compiled into an anchored matcher.
///
/// `param_index` maps each placeholder name to its 1-based capture group, in
/// declaration order. A name declared twice keeps the index of its last occurrence.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    template: String,
    regex: Regex,
    param_index: HashMap<Arc<str>, usize>,
}

impl CompiledRoute {
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// 1-based capture group of a placeholder.
    #[must_use]
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.param_index.get(name).copied()
    }

    /// Placeholder names and their group indices, ordered by group.
    #[must_use]
    pub fn param_index(&self) -> Vec<(&str, usize)> {
        let mut params: Vec<(&str, usize)> = self
            .param_index
            .iter()
            .map(|(name, index)| (name.as_ref(), *index))
            .collect();
        params.sort_by_key(|(_, index)| *index);
        params
    }

    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and collect the raw (still percent-encoded) captures.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<UrlCaptures> {
        let caps = self.regex.captures(path)?;
        let mut params = CaptureVec::new();
        for (name, index) in self.param_index() {
            let value = caps.get(index).map(|m| m.as_str()).unwrap_or_default();
            let name = self
                .param_index
                .get_key_value(name)
                .map(|(k, _)| Arc::clone(k))
                .unwrap_or_else(|| Arc::from(name));
            params.push((name, value.to_string()));
        }
        Some(UrlCaptures { params })
    }
}

/// Compile a `{name}` path template.
///
/// Literal text is escaped, each placeholder becomes a capture group over
/// [`PLACEHOLDER_CLASS`] and the whole pattern is anchored at both ends.
///
/// # Errors
///
/// [`DefinitionError::InvalidPathTemplate`] when the template does not start with `/`
/// or the resulting pattern fails to compile.
///
/// # Example
///
/// ```rust
/// use webframe::router::compile_route;
///
/// let route = compile_route("/test/{param1}/{param2}").unwrap();
/// let captures = route.captures("/test/hello/world").unwrap();
/// assert_eq!(captures.get("param1"), Some("hello"));
/// assert_eq!(captures.get("param2"), Some("world"));
/// ```
pub fn compile_route(template: &str) -> Result<CompiledRoute, DefinitionError> {
    if !template.starts_with('/') {
        return Err(DefinitionError::InvalidPathTemplate {
            path: template.to_string(),
            reason: "template must start with '/'".to_string(),
        });
    }

    let mut pattern = String::with_capacity(template.len() + 16);
    pattern.push('^');
    let mut param_index: HashMap<Arc<str>, usize> = HashMap::new();
    let mut last_end = 0;

    for (group, caps) in PLACEHOLDER.captures_iter(template).enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        pattern.push_str(&regex::escape(&template[last_end..whole.start()]));
        pattern.push('(');
        pattern.push_str(PLACEHOLDER_CLASS);
        pattern.push(')');
        last_end = whole.end();

        let index = group + 1;
        if param_index.insert(Arc::from(name.as_str()), index).is_some() {
            warn!(
                template = %template,
                param = %name.as_str(),
                group_index = index,
                "Duplicate URL placeholder, last occurrence wins"
            );
        }
        debug!(template = %template, param = %name.as_str(), group_index = index, "URL argument");
    }

    pattern.push_str(&regex::escape(&template[last_end..]));
    pattern.push('$');

    let regex = Regex::new(&pattern).map_err(|e| DefinitionError::InvalidPathTemplate {
        path: template.to_string(),
        reason: e.to_string(),
    })?;

    debug!(template = %template, pattern = %pattern, "Path template compiled");

    Ok(CompiledRoute {
        template: template.to_string(),
        regex,
        param_index,
    })
}

/// Raw URL captures for one request.
///
/// Values are exactly what the matcher saw; callers percent-decode before binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlCaptures {
    params: CaptureVec,
}

impl UrlCaptures {
    /// Get a captured segment by placeholder name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Convert to a HashMap (allocates)
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Result of matching a path against a [`RouteTable`].
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    pub route: &'a CompiledRoute,
    pub target: &'a T,
    pub captures: UrlCaptures,
}

/// Compiled routes in registration order.
///
/// Lookup walks the routes linearly and the first structural match wins; there is no
/// specificity ranking, so overlapping templates resolve to whichever was registered
/// first.
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    routes: Vec<(CompiledRoute, T)>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> RouteTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, route: CompiledRoute, target: T) {
        info!(
            template = %route.template(),
            position = self.routes.len(),
            "Route registered"
        );
        self.routes.push((route, target));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CompiledRoute, &T)> {
        self.routes.iter().map(|(route, target)| (route, target))
    }

    /// Find the first route whose matcher accepts `path`.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<RouteMatch<'_, T>> {
        let match_start = std::time::Instant::now();

        for (route, target) in &self.routes {
            if let Some(captures) = route.captures(path) {
                debug!(
                    path = %path,
                    template = %route.template(),
                    captures = ?captures,
                    duration_us = match_start.elapsed().as_micros(),
                    "Route matched"
                );
                return Some(RouteMatch {
                    route,
                    target,
                    captures,
                });
            }
        }

        debug!(
            path = %path,
            routes_count = self.routes.len(),
            duration_us = match_start.elapsed().as_micros(),
            "No route matched"
        );
        None
    }

    /// Print all registered routes to stdout
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for (route, _) in &self.routes {
            println!("[route] {} -> {}", route.template(), route.regex().as_str());
        }
    }
}
