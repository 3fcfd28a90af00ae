use http::Method;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{
    ActionMap, ArgumentSource, ArgumentSpec, ControllerDescriptor, HandlerDescriptor,
    InstanceFactory, Invoker, DEFAULT_ACTION,
};
use crate::coerce::ParamType;
use crate::dispatcher::Arguments;
use crate::error::DefinitionError;
use crate::router::{compile_route, CompiledRoute};
use crate::server::RequestContext;
use crate::services::{Dependency, Inject};

type HandlerFn<C> =
    dyn Fn(&mut C, &mut RequestContext<'_>, &Arguments) -> anyhow::Result<()> + Send + Sync;

/// Declaration of one handler on controller `C`.
pub struct HandlerDef<C> {
    method: String,
    action: Option<String>,
    name: String,
    arguments: Vec<ArgumentSpec>,
    handler: Arc<HandlerFn<C>>,
}

impl<C: Send + 'static> HandlerDef<C> {
    /// Handler for `method` named `name` (the name only appears in logs and errors).
    pub fn new<F>(method: &str, name: &str, handler: F) -> Self
    where
        F: Fn(&mut C, &mut RequestContext<'_>, &Arguments) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self {
            method: method.to_string(),
            action: None,
            name: name.to_string(),
            arguments: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn get<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&mut C, &mut RequestContext<'_>, &Arguments) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self::new("GET", name, handler)
    }

    pub fn post<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&mut C, &mut RequestContext<'_>, &Arguments) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self::new("POST", name, handler)
    }

    pub fn put<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&mut C, &mut RequestContext<'_>, &Arguments) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self::new("PUT", name, handler)
    }

    pub fn delete<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&mut C, &mut RequestContext<'_>, &Arguments) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self::new("DELETE", name, handler)
    }

    pub fn head<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&mut C, &mut RequestContext<'_>, &Arguments) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self::new("HEAD", name, handler)
    }

    /// Serve the named `_action_` instead of the default action.
    #[must_use]
    pub fn action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    /// Append the next declared parameter.
    #[must_use]
    pub fn arg(mut self, spec: ArgumentSpec) -> Self {
        self.arguments.push(spec);
        self
    }
}

/// Declaration of controller `C`: its path, constructor, injection points and handlers.
pub struct ControllerDef<C> {
    name: String,
    path: String,
    factory: Arc<dyn Fn() -> C + Send + Sync>,
    injections: Vec<Dependency<C>>,
    handlers: Vec<HandlerDef<C>>,
}

impl<C: Send + 'static> ControllerDef<C> {
    pub fn new(name: &str, path: &str, factory: impl Fn() -> C + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            factory: Arc::new(factory),
            injections: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Declare a service injection point, resolved on every new instance.
    #[must_use]
    pub fn inject<D: Send + Sync + 'static>(mut self, accessor: fn(&C) -> &Inject<D>) -> Self {
        self.injections.push(Dependency::on(accessor));
        self
    }

    #[must_use]
    pub fn handler(mut self, handler: HandlerDef<C>) -> Self {
        self.handlers.push(handler);
        self
    }
}

/// Type-erased [`ControllerDef`] held by the application catalog.
pub trait ControllerDefinition: Send + Sync {
    fn name(&self) -> &str;
    fn path(&self) -> &str;
    /// Validate the definition into a descriptor.
    fn describe(&self) -> Result<ControllerDescriptor, DefinitionError>;
}

impl<C: Send + 'static> ControllerDefinition for ControllerDef<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn describe(&self) -> Result<ControllerDescriptor, DefinitionError> {
        generate_descriptor(self)
    }
}

/// HTTP methods a handler may serve.
fn parse_method(method: &str) -> Option<Method> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Some(Method::GET),
        "POST" => Some(Method::POST),
        "PUT" => Some(Method::PUT),
        "DELETE" => Some(Method::DELETE),
        "HEAD" => Some(Method::HEAD),
        _ => None,
    }
}

/// Validate one declared parameter and fill in its list element types.
fn validate_argument(
    handler: &str,
    index: usize,
    spec: &ArgumentSpec,
    route: &CompiledRoute,
) -> Result<ArgumentSpec, DefinitionError> {
    let name = spec.name();
    if name.trim().is_empty() {
        return Err(DefinitionError::UnboundParameter {
            handler: handler.to_string(),
            index,
        });
    }

    let mut spec = spec.clone();
    match &spec.ty {
        ParamType::Primitive(type_name) => {
            return Err(DefinitionError::PrimitiveParameter {
                handler: handler.to_string(),
                index,
                type_name: (*type_name).to_string(),
            });
        }
        ParamType::List(generics) => {
            spec.element_types = if generics.len() == 1 {
                generics.clone()
            } else {
                Vec::new()
            };
            if spec.element_types.is_empty() {
                return Err(DefinitionError::AmbiguousListElement {
                    handler: handler.to_string(),
                    index,
                });
            }
        }
        ParamType::Scalar(_) | ParamType::Object(_) | ParamType::Other(_) => {}
    }

    if spec.source == ArgumentSource::Url {
        if spec.ty.as_scalar().is_none() {
            return Err(DefinitionError::UrlParameterNotScalar {
                handler: handler.to_string(),
                index,
            });
        }
        if route.group_index(name).is_none() {
            return Err(DefinitionError::UnknownUrlParameter {
                handler: handler.to_string(),
                index,
                name: name.to_string(),
                path: route.template().to_string(),
            });
        }
    }

    debug!(
        handler = %handler,
        index,
        name = %name,
        source = ?spec.source,
        param_type = %spec.ty.type_name(),
        required = spec.required,
        "Argument validated"
    );
    Ok(spec)
}

fn erase_handler<C: Send + 'static>(handler: &Arc<HandlerFn<C>>) -> Invoker {
    let handler = Arc::clone(handler);
    Arc::new(
        move |controller: &mut (dyn Any + Send),
              ctx: &mut RequestContext<'_>,
              args: &Arguments| {
            match controller.downcast_mut::<C>() {
                Some(controller) => handler(controller, ctx, args),
                None => anyhow::bail!(
                    "controller instance is not a {}",
                    std::any::type_name::<C>()
                ),
            }
        },
    )
}

/// Validate `def` and build its immutable descriptor.
///
/// # Errors
///
/// The first [`DefinitionError`] found: an invalid path template, an unsupported
/// method, or a parameter that breaks the binding contract.
pub fn generate_descriptor<C: Send + 'static>(
    def: &ControllerDef<C>,
) -> Result<ControllerDescriptor, DefinitionError> {
    info!(controller = %def.name, path = %def.path, "Loading controller");
    let route = compile_route(&def.path)?;

    let mut handlers: HashMap<Method, ActionMap> = HashMap::new();
    handlers.insert(Method::GET, ActionMap::new());
    handlers.insert(Method::POST, ActionMap::new());

    for handler in &def.handlers {
        let method =
            parse_method(&handler.method).ok_or_else(|| DefinitionError::UnsupportedMethod {
                handler: handler.name.clone(),
                method: handler.method.clone(),
            })?;

        let arguments = handler
            .arguments
            .iter()
            .enumerate()
            .map(|(index, spec)| validate_argument(&handler.name, index, spec, &route))
            .collect::<Result<Vec<_>, _>>()?;

        let action = handler
            .action
            .clone()
            .unwrap_or_else(|| DEFAULT_ACTION.to_string());

        let descriptor = HandlerDescriptor {
            method: method.clone(),
            action: action.clone(),
            handler_name: handler.name.clone(),
            arguments,
            invoker: erase_handler(&handler.handler),
        };

        let actions = handlers.entry(method.clone()).or_default();
        if let Some(previous) = actions.insert(action.clone(), Arc::new(descriptor)) {
            warn!(
                controller = %def.name,
                method = %method,
                action = %action,
                replaced = %previous.handler_name,
                handler = %handler.name,
                "Duplicate handler for method and action, last one wins"
            );
        }
        debug!(
            controller = %def.name,
            method = %method,
            action = %action,
            handler = %handler.name,
            "Handler registered"
        );
    }

    let factory = Arc::clone(&def.factory);
    let factory: InstanceFactory = Arc::new(move || Box::new(factory()) as Box<dyn Any + Send>);

    Ok(ControllerDescriptor {
        name: def.name.clone(),
        route,
        handlers,
        factory,
        injections: def
            .injections
            .iter()
            .cloned()
            .map(Dependency::erase)
            .collect(),
    })
}
