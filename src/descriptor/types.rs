use http::Method;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::coerce::{ParamType, ScalarType};
use crate::dispatcher::Arguments;
use crate::router::CompiledRoute;
use crate::server::RequestContext;
use crate::services::{Dependency, ServiceRegistry};

/// Action selected when a request carries no `_action_` parameter.
pub const DEFAULT_ACTION: &str = "_DEFAULT_";

/// Type-erased handler call over a controller instance.
pub type Invoker = Arc<
    dyn Fn(&mut (dyn Any + Send), &mut RequestContext<'_>, &Arguments) -> anyhow::Result<()>
        + Send
        + Sync,
>;

/// Type-erased controller constructor.
pub type InstanceFactory = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Where an argument's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentSource {
    /// A `{name}` segment of the controller's path template
    Url,
    /// Query string or form parameters
    Request,
}

/// One declared handler parameter.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub(crate) name: Option<String>,
    pub(crate) required: bool,
    pub(crate) source: ArgumentSource,
    pub(crate) ty: ParamType,
    pub(crate) element_types: Vec<ParamType>,
}

impl ArgumentSpec {
    /// Optional request parameter `name`.
    #[must_use]
    pub fn request(name: &str, ty: ParamType) -> Self {
        Self::bound(Some(name), ArgumentSource::Request, ty)
    }

    /// Optional URL placeholder `name`.
    #[must_use]
    pub fn url(name: &str, ty: ParamType) -> Self {
        Self::bound(Some(name), ArgumentSource::Url, ty)
    }

    /// A parameter with no request binding at all; rejected at registration.
    #[must_use]
    pub fn unbound(ty: ParamType) -> Self {
        Self::bound(None, ArgumentSource::Request, ty)
    }

    fn bound(name: Option<&str>, source: ArgumentSource, ty: ParamType) -> Self {
        Self {
            name: name.map(str::to_string),
            required: false,
            source,
            ty,
            element_types: Vec::new(),
        }
    }

    /// Absent values fail the request with `BadRequest` instead of binding `None`.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn source(&self) -> ArgumentSource {
        self.source
    }

    #[must_use]
    pub fn param_type(&self) -> &ParamType {
        &self.ty
    }

    /// Element types of a list parameter, filled in at registration.
    #[must_use]
    pub fn element_types(&self) -> &[ParamType] {
        &self.element_types
    }

    /// Scalar element type of a list parameter, if it has one.
    #[must_use]
    pub fn element_scalar(&self) -> Option<ScalarType> {
        self.element_types.first().and_then(ParamType::as_scalar)
    }
}

/// Validated handler ready for dispatch.
#[derive(Clone)]
pub struct HandlerDescriptor {
    pub(crate) method: Method,
    pub(crate) action: String,
    pub(crate) handler_name: String,
    pub(crate) arguments: Vec<ArgumentSpec>,
    pub(crate) invoker: Invoker,
}

impl HandlerDescriptor {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    #[must_use]
    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    pub(crate) fn invoke(
        &self,
        controller: &mut (dyn Any + Send),
        ctx: &mut RequestContext<'_>,
        args: &Arguments,
    ) -> anyhow::Result<()> {
        (self.invoker)(controller, ctx, args)
    }
}

impl Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("method", &self.method)
            .field("action", &self.action)
            .field("handler_name", &self.handler_name)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Action name → handler.
pub type ActionMap = HashMap<String, Arc<HandlerDescriptor>>;

/// Immutable routing record for one controller.
///
/// GET and POST always have an action map, possibly empty.
#[derive(Clone)]
pub struct ControllerDescriptor {
    pub(crate) name: String,
    pub(crate) route: CompiledRoute,
    pub(crate) handlers: HashMap<Method, ActionMap>,
    pub(crate) factory: InstanceFactory,
    pub(crate) injections: Vec<Dependency<dyn Any + Send>>,
}

impl ControllerDescriptor {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path template as declared.
    #[must_use]
    pub fn path(&self) -> &str {
        self.route.template()
    }

    #[must_use]
    pub fn route(&self) -> &CompiledRoute {
        &self.route
    }

    /// 1-based capture group of a URL placeholder.
    #[must_use]
    pub fn url_param_index(&self, name: &str) -> Option<usize> {
        self.route.group_index(name)
    }

    #[must_use]
    pub fn actions(&self, method: &Method) -> Option<&ActionMap> {
        self.handlers.get(method)
    }

    #[must_use]
    pub fn handler(&self, method: &Method, action: &str) -> Option<&Arc<HandlerDescriptor>> {
        self.handlers.get(method)?.get(action)
    }

    /// Whether any handler serves `method`.
    #[must_use]
    pub fn serves(&self, method: &Method) -> bool {
        self.handlers
            .get(method)
            .is_some_and(|actions| !actions.is_empty())
    }

    /// Fresh controller with its injection points resolved from `services`.
    pub(crate) fn instantiate(&self, services: &ServiceRegistry) -> Box<dyn Any + Send> {
        let controller = (self.factory)();
        services.wire_dependencies(&self.name, None, &*controller, &self.injections);
        controller
    }
}

impl Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("name", &self.name)
            .field("path", &self.path())
            .field("handlers", &self.handlers)
            .field("injections", &self.injections)
            .finish_non_exhaustive()
    }
}
