use http::header::LOCATION;
use http::StatusCode;
use std::collections::HashMap;
use tracing::debug;

/// Outbound response filled in by handlers and the dispatcher.
///
/// Once committed (flushed body, redirect or forward) the status and headers are final
/// and further redirects are refused.
#[derive(Debug, Clone)]
pub struct WebResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: String,
    committed: bool,
    forwarded_to: Option<String>,
}

impl Default for WebResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            headers: HashMap::new(),
            body: String::new(),
            committed: false,
            forwarded_to: None,
        }
    }
}

impl WebResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Buffer body text; nothing is committed until [`WebResponse::flush`].
    pub fn write(&mut self, text: &str) {
        self.body.push_str(text);
    }

    /// Mark the buffered output as sent to the client.
    pub fn flush(&mut self) {
        if !self.committed {
            debug!(status = self.status, bytes = self.body.len(), "Response committed");
        }
        self.committed = true;
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// `302 Found` to `location`, committing the response.
    ///
    /// # Errors
    ///
    /// Fails when the response is already committed.
    pub fn send_redirect(&mut self, location: &str) -> anyhow::Result<()> {
        if self.committed {
            anyhow::bail!("cannot redirect to [{location}]: response already committed");
        }
        self.status = StatusCode::FOUND.as_u16();
        self.headers
            .insert(LOCATION.as_str().to_string(), location.to_string());
        self.committed = true;
        debug!(location = %location, "Redirect sent");
        Ok(())
    }

    /// `Location` header of a sent redirect.
    #[must_use]
    pub fn redirect_location(&self) -> Option<&str> {
        self.header(LOCATION.as_str())
    }

    /// Hand the request to the rendering collaborator at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the response is already committed.
    pub fn forward(&mut self, path: &str) -> anyhow::Result<()> {
        if self.committed {
            anyhow::bail!("cannot forward to [{path}]: response already committed");
        }
        self.forwarded_to = Some(path.to_string());
        self.committed = true;
        debug!(path = %path, "Forwarded to view");
        Ok(())
    }

    #[must_use]
    pub fn forwarded_to(&self) -> Option<&str> {
        self.forwarded_to.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_commits() {
        let mut res = WebResponse::new();
        res.send_redirect("/app/error").unwrap();
        assert_eq!(res.status(), 302);
        assert_eq!(res.redirect_location(), Some("/app/error"));
        assert!(res.is_committed());
        assert!(res.send_redirect("/again").is_err());
    }

    #[test]
    fn test_write_without_flush_is_not_committed() {
        let mut res = WebResponse::new();
        res.write("partial");
        assert!(!res.is_committed());
        res.flush();
        assert!(res.is_committed());
        assert!(res.forward("/WEB-INF/jsp/index.jsp").is_err());
        assert_eq!(res.body(), "partial");
    }
}
