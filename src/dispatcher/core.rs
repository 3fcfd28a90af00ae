//! Dispatcher core module - request matching, binding and invocation.

use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

use super::binder::bind_arguments;
use super::report::stash;
use crate::coerce::ParamSource;
use crate::descriptor::{ControllerDefinition, ControllerDescriptor, DEFAULT_ACTION};
use crate::error::{panic_message, DefinitionError, DispatchError, ErrorKind};
use crate::ids::RequestId;
use crate::router::RouteTable;
use crate::server::{RequestContext, WebRequest, WebResponse};
use crate::services::ServiceRegistry;
use crate::view::{context_base_url, CONTEXT_BASE_URL_ATTR};

/// Request parameter selecting the action within a method.
pub const ACTION_PARAM: &str = "_action_";

/// Session key holding the [`ErrorKind`] of the last failure.
pub const ERROR_TYPE_KEY: &str = "_WEB_CONTROLLER_ERROR_TYPE_";

/// Session key holding the [`DispatchError`] of the last failure.
pub const EXCEPTION_KEY: &str = "_WEB_CONTROLLER_EXCEPTION_";

/// How a request left the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran to completion
    Handled,
    /// The failure was stored in the session and the client redirected to the error
    /// controller
    ErrorRedirect { kind: ErrorKind, location: String },
    /// The response was already committed; the failure was logged and dropped
    Absorbed { kind: ErrorKind },
}

/// The running application: compiled routes, controllers and live services.
///
/// Built once at start-up and shared immutably by every request thread.
#[derive(Debug)]
pub struct WebApp {
    context_path: String,
    routes: RouteTable<Arc<ControllerDescriptor>>,
    controllers: HashMap<String, Arc<ControllerDescriptor>>,
    error_controller: Option<Arc<ControllerDescriptor>>,
    services: Arc<ServiceRegistry>,
}

impl WebApp {
    #[must_use]
    pub fn new(services: ServiceRegistry) -> Self {
        Self {
            context_path: String::new(),
            routes: RouteTable::new(),
            controllers: HashMap::new(),
            error_controller: None,
            services: Arc::new(services),
        }
    }

    /// Context path applied to requests the transport did not tag with one.
    #[must_use]
    pub fn with_context_path(mut self, context_path: &str) -> Self {
        self.context_path = context_path.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// Validate and route a controller.
    ///
    /// # Errors
    ///
    /// The controller's [`DefinitionError`]; nothing is registered in that case.
    pub fn register_controller(
        &mut self,
        def: &dyn ControllerDefinition,
    ) -> Result<Arc<ControllerDescriptor>, DefinitionError> {
        let descriptor = Arc::new(def.describe()?);
        self.routes
            .push(descriptor.route().clone(), Arc::clone(&descriptor));
        if self
            .controllers
            .insert(descriptor.name().to_string(), Arc::clone(&descriptor))
            .is_some()
        {
            warn!(controller = %descriptor.name(), "Controller name registered twice");
        }
        info!(
            controller = %descriptor.name(),
            path = %descriptor.path(),
            "Controller registered"
        );
        Ok(descriptor)
    }

    /// Route a controller and make it the redirect target for failures.
    ///
    /// # Errors
    ///
    /// The controller's [`DefinitionError`]; the previous error controller is kept.
    pub fn register_error_controller(
        &mut self,
        def: &dyn ControllerDefinition,
    ) -> Result<(), DefinitionError> {
        info!(controller = %def.name(), "Registering error handling controller");
        let descriptor = self.register_controller(def)?;
        if !descriptor.serves(&Method::GET) {
            warn!(
                controller = %descriptor.name(),
                "Error controller has no GET handler, redirected failures will not be served"
            );
        }
        self.error_controller = Some(descriptor);
        Ok(())
    }

    #[must_use]
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable<Arc<ControllerDescriptor>> {
        &self.routes
    }

    #[must_use]
    pub fn controller(&self, name: &str) -> Option<&Arc<ControllerDescriptor>> {
        self.controllers.get(name)
    }

    /// Path template of a registered controller.
    #[must_use]
    pub fn controller_path(&self, name: &str) -> Option<&str> {
        self.controllers.get(name).map(|c| c.path())
    }

    #[must_use]
    pub fn error_controller(&self) -> Option<&Arc<ControllerDescriptor>> {
        self.error_controller.as_ref()
    }

    /// Call every service's shutdown hook once.
    pub fn shutdown(&self) {
        self.services.shutdown_all();
    }

    /// Dispatch one request.
    ///
    /// Failures go through the error protocol. They come back as `Err` only when no
    /// error controller is registered.
    ///
    /// # Errors
    ///
    /// The request's [`DispatchError`] when there is no error controller to redirect to.
    pub fn dispatch(
        &self,
        req: &mut WebRequest,
        res: &mut WebResponse,
    ) -> Result<DispatchOutcome, DispatchError> {
        if req.context_path().is_empty() && !self.context_path.is_empty() {
            req.set_context_path(&self.context_path);
        }
        let request_id = RequestId::for_request(req);
        let span = info_span!(
            "dispatch",
            request_id = %request_id,
            method = %req.method(),
            uri = %req.uri()
        );
        let _guard = span.enter();
        let start = Instant::now();

        match self.process(req, res, request_id) {
            Ok(()) => {
                info!(
                    status = res.status(),
                    latency_us = start.elapsed().as_micros(),
                    "Request handled"
                );
                Ok(DispatchOutcome::Handled)
            }
            Err(error) => {
                warn!(
                    kind = %error.kind(),
                    error = %error,
                    latency_us = start.elapsed().as_micros(),
                    "Request failed"
                );
                self.handle_exception(req, res, error)
            }
        }
    }

    fn process(
        &self,
        req: &mut WebRequest,
        res: &mut WebResponse,
        request_id: RequestId,
    ) -> Result<(), DispatchError> {
        // D1: normalize
        let path = normalize_path(req.uri(), req.context_path()).to_string();
        let action = req
            .parameter(ACTION_PARAM)
            .unwrap_or(DEFAULT_ACTION)
            .to_string();
        let base_url = context_base_url(req.server_name(), req.server_port(), req.context_path());
        req.set_attribute(CONTEXT_BASE_URL_ATTR, Value::String(base_url));
        debug!(path = %path, action = %action, "D1: Path normalized");

        let not_found = || DispatchError::NotFound {
            method: req.method().to_string(),
            path: path.clone(),
            action: action.clone(),
        };

        // D2: match
        let Some(matched) = self.routes.find(&path) else {
            return Err(not_found());
        };
        let descriptor = Arc::clone(matched.target);
        let captures = matched.captures;

        // D3: resolve
        let handler = Method::from_bytes(req.method().as_bytes())
            .ok()
            .and_then(|method| descriptor.handler(&method, &action))
            .map(Arc::clone)
            .ok_or_else(not_found)?;
        debug!(
            controller = %descriptor.name(),
            handler = %handler.handler_name(),
            "D3: Handler resolved"
        );

        // D4: bind
        let arguments = bind_arguments(&*req, &handler, &captures)?;

        // D5 + D6: instantiate and invoke
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut controller = descriptor.instantiate(&self.services);
            let mut ctx = RequestContext::new(req, res, self, request_id);
            handler.invoke(&mut *controller, &mut ctx, &arguments)
        }));
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DispatchError::internal(handler.handler_name(), e)),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    handler = %handler.handler_name(),
                    panic_message = %message,
                    "Handler panicked"
                );
                Err(DispatchError::internal(
                    handler.handler_name(),
                    format!("handler panicked: {message}"),
                ))
            }
        }
    }

    /// Route a failure through the error protocol.
    ///
    /// A committed response is left alone and the failure absorbed. Otherwise the kind
    /// and error are stored in the session and, when an error controller is registered,
    /// exactly one redirect to it is sent.
    ///
    /// # Errors
    ///
    /// Returns `error` itself when there is no error controller to redirect to.
    pub fn handle_exception(
        &self,
        req: &WebRequest,
        res: &mut WebResponse,
        error: DispatchError,
    ) -> Result<DispatchOutcome, DispatchError> {
        let kind = error.kind();
        if res.is_committed() {
            warn!(kind = %kind, error = %error, "Response already committed, failure absorbed");
            return Ok(DispatchOutcome::Absorbed { kind });
        }

        stash(req.session(), &error);

        let Some(target) = self.error_controller.as_ref() else {
            debug!(kind = %kind, "No error controller, returning failure to transport");
            return Err(error);
        };

        let location = format!("{}{}", req.context_path(), target.path());
        if let Err(e) = res.send_redirect(&location) {
            error!(location = %location, error = %e, "Error redirect failed");
            return Err(error);
        }
        info!(kind = %kind, location = %location, "Redirected to error controller");
        Ok(DispatchOutcome::ErrorRedirect { kind, location })
    }
}

/// Strip the deployment prefix from a request URI.
///
/// Only a leading occurrence ending on a segment boundary is removed; a URI outside
/// the context (including `/application` under `/app`) is returned as is.
#[must_use]
pub fn normalize_path<'a>(uri: &'a str, context_path: &str) -> &'a str {
    if context_path.is_empty() {
        return uri;
    }
    match uri.strip_prefix(context_path) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => uri,
    }
}
