//! # webframe
//!
//! **webframe** is a small model-view-controller dispatch engine. Applications declare
//! controllers (a URL path template plus handler methods) and singleton services; the
//! engine routes each request to one handler, binds its arguments from the URL and
//! request parameters, injects services and funnels every failure through a single
//! error protocol.
//!
//! The engine is transport-neutral: a host server adapts its request into a
//! [`WebRequest`], calls [`WebApp::dispatch`] and writes the resulting [`WebResponse`]
//! (status, headers, body, redirect location or forwarded view path) back to the wire.
//!
//! ## Architecture
//!
//! - **[`coerce`]** - Text to typed value conversion for scalars, lists and form objects
//! - **[`router`]** - Path template compilation and first-match route lookup
//! - **[`descriptor`]** - Controller and handler declarations, validated into descriptors
//! - **[`services`]** - Singleton service registry with mutual injection
//! - **[`dispatcher`]** - The per-request pipeline and the error protocol
//! - **[`server`]** - Request, response, session and handler context types
//! - **[`app`]** - Catalog of available controllers and services, started from config
//! - **[`config`]** - YAML and environment configuration
//! - **[`logging`]** - `tracing` subscriber set-up
//!
//! ## Example
//!
//! ```rust
//! use webframe::coerce::ParamType;
//! use webframe::descriptor::{ArgumentSpec, ControllerDef, HandlerDef};
//! use webframe::dispatcher::{Arguments, DispatchOutcome, ErrorReport};
//! use webframe::server::{RequestContext, WebRequest, WebResponse};
//! use webframe::{AppConfig, Application};
//!
//! #[derive(Default)]
//! struct Greeting;
//!
//! impl Greeting {
//!     fn hello(&mut self, ctx: &mut RequestContext<'_>, args: &Arguments) -> anyhow::Result<()> {
//!         let name: Option<String> = args.get(0)?;
//!         ctx.set_model("name", name)?;
//!         ctx.view("hello")
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Errors;
//!
//! impl Errors {
//!     fn show(&mut self, ctx: &mut RequestContext<'_>, _args: &Arguments) -> anyhow::Result<()> {
//!         let report = ErrorReport::from_session(ctx.session());
//!         ctx.set_model("error", report)?;
//!         ctx.view("error")
//!     }
//! }
//!
//! let app = Application::new()
//!     .controller(
//!         ControllerDef::new("Greeting", "/hello/{name}", Greeting::default).handler(
//!             HandlerDef::get("hello", Greeting::hello)
//!                 .arg(ArgumentSpec::url("name", ParamType::TEXT)),
//!         ),
//!     )
//!     .controller(
//!         ControllerDef::new("Errors", "/error", Errors::default)
//!             .handler(HandlerDef::get("show", Errors::show)),
//!     )
//!     .start(
//!         &AppConfig::default()
//!             .with_controllers(&["Greeting"])
//!             .with_error_handler("Errors"),
//!     );
//!
//! let mut req = WebRequest::get("/hello/world");
//! let mut res = WebResponse::new();
//! assert_eq!(app.dispatch(&mut req, &mut res).unwrap(), DispatchOutcome::Handled);
//! assert_eq!(res.forwarded_to(), Some("/WEB-INF/jsp/hello.jsp"));
//! assert_eq!(req.attribute("name"), Some(&serde_json::json!("world")));
//!
//! let mut req = WebRequest::get("/nowhere");
//! let mut res = WebResponse::new();
//! let outcome = app.dispatch(&mut req, &mut res).unwrap();
//! assert!(matches!(outcome, DispatchOutcome::ErrorRedirect { .. }));
//! assert_eq!(res.redirect_location(), Some("/error"));
//! ```

// Lets `#[derive(FormObject)]` expand to `::webframe::...` paths inside this crate too.
extern crate self as webframe;

pub mod app;
pub mod coerce;
pub mod config;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod router;
pub mod server;
pub mod services;
pub mod view;

pub use app::Application;
pub use config::AppConfig;
pub use dispatcher::{DispatchOutcome, WebApp};
pub use error::{DefinitionError, DispatchError, ErrorKind};
pub use logging::{init_logging, LogConfig};
pub use server::{RequestContext, WebRequest, WebResponse};
pub use webframe_macros::FormObject;
