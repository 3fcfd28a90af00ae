use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use super::session::Session;
use crate::coerce::ParamSource;

/// Inbound request as handed over by the transport adapter.
///
/// Parameters are multi-valued in arrival order, query string first and then any
/// form body. Attributes are request-scoped and double as the view model.
#[derive(Debug, Clone)]
pub struct WebRequest {
    method: String,
    uri: String,
    context_path: String,
    server_name: String,
    server_port: u16,
    headers: HashMap<String, String>,
    params: HashMap<String, Vec<String>>,
    attributes: HashMap<String, Value>,
    session: Session,
}

impl WebRequest {
    /// Build a request from a method and a request target (`/path?query`).
    ///
    /// The query string is parsed into parameters; the URI keeps only the path.
    #[must_use]
    pub fn new(method: &str, target: &str) -> Self {
        let (uri, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        Self {
            method: method.to_ascii_uppercase(),
            uri: uri.to_string(),
            context_path: String::new(),
            server_name: "localhost".to_string(),
            server_port: 80,
            headers: HashMap::new(),
            params: parse_query_params(query),
            attributes: HashMap::new(),
            session: Session::new(),
        }
    }

    /// Convenience for `WebRequest::new("GET", target)`
    #[must_use]
    pub fn get(target: &str) -> Self {
        Self::new("GET", target)
    }

    /// Convenience for `WebRequest::new("POST", target)`
    #[must_use]
    pub fn post(target: &str) -> Self {
        Self::new("POST", target)
    }

    /// Deployment prefix the transport mounted the application under (e.g. `/app`).
    #[must_use]
    pub fn with_context_path(mut self, context_path: &str) -> Self {
        self.set_context_path(context_path);
        self
    }

    #[must_use]
    pub fn with_server(mut self, name: &str, port: u16) -> Self {
        self.server_name = name.to_string();
        self.server_port = port;
        self
    }

    /// Add one header; names are stored lowercase.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Append one parameter value.
    #[must_use]
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.add_param(name, value);
        self
    }

    /// Append every pair of an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn with_form_body(mut self, body: &str) -> Self {
        for (name, value) in url::form_urlencoded::parse(body.as_bytes()) {
            self.add_param(&name, &value);
        }
        self
    }

    /// Share an existing session (e.g. to follow an error redirect).
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn set_context_path(&mut self, context_path: &str) {
        self.context_path = context_path.trim_end_matches('/').to_string();
    }

    pub fn add_param(&mut self, name: &str, value: &str) {
        self.params
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path as received, including the context path.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    #[must_use]
    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn params(&self) -> &HashMap<String, Vec<String>> {
        &self.params
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set_attribute(&mut self, key: &str, value: Value) {
        self.attributes.insert(key.to_string(), value);
    }

    #[must_use]
    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl ParamSource for WebRequest {
    fn parameter(&self, name: &str) -> Option<&str> {
        self.params.parameter(name)
    }

    fn parameter_values(&self, name: &str) -> &[String] {
        self.params.parameter_values(name)
    }
}

/// Parse a query string into multi-valued parameters
///
/// Names and values are URL-decoded (`+` as space). Repeated names keep every value in
/// order.
///
/// # Arguments
///
/// * `query` - The raw query string without the leading `?`
#[must_use]
pub fn parse_query_params(query: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(name.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    if !params.is_empty() {
        debug!(count = params.len(), "Query parameters parsed");
    }
    params
}
