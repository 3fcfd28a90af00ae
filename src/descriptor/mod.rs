//! # Descriptor Builder
//!
//! Turns explicit controller declarations into the immutable routing records the
//! dispatcher consumes.
//!
//! A [`ControllerDef`] names a controller, its path template, a constructor, its service
//! injection points and a list of [`HandlerDef`]s. Each handler declares its HTTP method,
//! an optional action and its parameters as [`ArgumentSpec`]s. [`generate_descriptor`]
//! validates the whole declaration and produces a [`ControllerDescriptor`].
//!
//! ## Binding contract
//!
//! Registration fails with a [`DefinitionError`](crate::error::DefinitionError) when:
//!
//! - a parameter has no binding name
//! - a parameter is a raw primitive that cannot represent "absent"
//! - a list parameter does not declare exactly one element type
//! - a URL parameter is not a scalar or names no placeholder of the path
//! - a handler uses a method other than GET, POST, PUT, DELETE or HEAD
//!
//! ## Example
//!
//! ```rust
//! use webframe::coerce::ParamType;
//! use webframe::descriptor::{generate_descriptor, ArgumentSpec, ControllerDef, HandlerDef};
//! use webframe::dispatcher::Arguments;
//! use webframe::server::RequestContext;
//!
//! #[derive(Default)]
//! struct TodoController;
//!
//! impl TodoController {
//!     fn index(&mut self, ctx: &mut RequestContext<'_>, args: &Arguments) -> anyhow::Result<()> {
//!         let filter: Option<String> = args.get(0)?;
//!         ctx.set_model("filter", filter)?;
//!         ctx.view("index")
//!     }
//! }
//!
//! let def = ControllerDef::new("TodoController", "/todo/{filter}", TodoController::default)
//!     .handler(
//!         HandlerDef::get("index", TodoController::index)
//!             .arg(ArgumentSpec::url("filter", ParamType::TEXT)),
//!     );
//!
//! let descriptor = generate_descriptor(&def).unwrap();
//! assert_eq!(descriptor.url_param_index("filter"), Some(1));
//! ```

mod build;
mod types;

pub use build::{generate_descriptor, ControllerDef, ControllerDefinition, HandlerDef};
pub use types::{
    ActionMap, ArgumentSource, ArgumentSpec, ControllerDescriptor, HandlerDescriptor,
    InstanceFactory, Invoker, DEFAULT_ACTION,
};
