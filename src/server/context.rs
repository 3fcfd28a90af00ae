use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tracing::info;

use super::{Session, WebRequest, WebResponse};
use crate::dispatcher::WebApp;
use crate::ids::RequestId;
use crate::view::{view_path, CONTEXT_BASE_URL_ATTR};

/// Per-request state handed to every handler invocation.
///
/// Borrows the request and response for the duration of one dispatch and exposes the
/// operations a controller performs on them: model attributes, session attributes,
/// view forwards and redirects to other controllers.
pub struct RequestContext<'a> {
    request: &'a mut WebRequest,
    response: &'a mut WebResponse,
    app: &'a WebApp,
    request_id: RequestId,
}

impl<'a> RequestContext<'a> {
    pub(crate) fn new(
        request: &'a mut WebRequest,
        response: &'a mut WebResponse,
        app: &'a WebApp,
        request_id: RequestId,
    ) -> Self {
        Self {
            request,
            response,
            app,
            request_id,
        }
    }

    #[must_use]
    pub fn request(&self) -> &WebRequest {
        self.request
    }

    pub fn request_mut(&mut self) -> &mut WebRequest {
        self.request
    }

    #[must_use]
    pub fn response(&self) -> &WebResponse {
        self.response
    }

    pub fn response_mut(&mut self) -> &mut WebResponse {
        self.response
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Publish a value to the view model.
    ///
    /// # Errors
    ///
    /// Fails when `value` cannot be serialized.
    pub fn set_model<T: Serialize>(&mut self, key: &str, value: T) -> anyhow::Result<()> {
        let value = serde_json::to_value(value)?;
        self.request.set_attribute(key, value);
        Ok(())
    }

    #[must_use]
    pub fn model(&self, key: &str) -> Option<&Value> {
        self.request.attribute(key)
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        self.request.session()
    }

    #[must_use]
    pub fn session_attribute<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.request.session().get::<T>(key)
    }

    pub fn set_session_attribute<T: Any + Send + Sync>(&self, key: &str, value: T) {
        self.request.session().set(key, value);
    }

    /// `//host:port<context>/`, set by the dispatcher before the handler runs.
    #[must_use]
    pub fn context_base_url(&self) -> Option<&str> {
        self.request
            .attribute(CONTEXT_BASE_URL_ATTR)
            .and_then(Value::as_str)
    }

    /// Forward to the private view `/WEB-INF/jsp/<name>.jsp`.
    ///
    /// # Errors
    ///
    /// Fails when the response is already committed.
    pub fn view(&mut self, name: &str) -> anyhow::Result<()> {
        let path = view_path(name, false);
        info!(
            view = %path,
            context_base_url = ?self.context_base_url(),
            "Rendering view"
        );
        self.response.forward(&path)
    }

    /// Forward to the public view `<name>.jsp`.
    ///
    /// # Errors
    ///
    /// Fails when the response is already committed.
    pub fn public_view(&mut self, name: &str) -> anyhow::Result<()> {
        self.response.forward(&view_path(name, true))
    }

    /// Redirect to another registered controller's path under the context path.
    ///
    /// # Errors
    ///
    /// Fails when no controller is registered under `controller` or the response is
    /// already committed.
    pub fn redirect_to(&mut self, controller: &str) -> anyhow::Result<()> {
        let Some(path) = self.app.controller_path(controller) else {
            anyhow::bail!("no controller registered as [{controller}]");
        };
        let location = format!("{}{}", self.request.context_path(), path);
        info!(controller = %controller, location = %location, "Redirecting");
        self.response.send_redirect(&location)
    }

    /// Redirect to an arbitrary location.
    ///
    /// # Errors
    ///
    /// Fails when the response is already committed.
    pub fn redirect(&mut self, location: &str) -> anyhow::Result<()> {
        self.response.send_redirect(location)
    }
}
