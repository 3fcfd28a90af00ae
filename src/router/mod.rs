//! # Router Module
//!
//! Compiles controller path templates into matchers and resolves request paths to the
//! controller that owns them.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Turning `{name}` templates into anchored regular expressions
//! - Recording each placeholder's 1-based capture group
//! - Matching normalized request paths against routes in registration order
//! - Returning the raw captures for the binder to decode
//!
//! ## Architecture
//!
//! 1. **Compilation**: at start-up, templates such as `/test/{param1}/{param2}` are
//!    compiled by [`compile_route`]. Literal text is escaped; each placeholder accepts
//!    letters, digits and a fixed punctuation set.
//!
//! 2. **Matching**: [`RouteTable::find`] tests the path against every route in
//!    registration order. The first structural match is authoritative.
//!
//! ## Example
//!
//! ```rust
//! use webframe::router::{compile_route, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.push(compile_route("/todo/{filter}").unwrap(), "todo");
//! table.push(compile_route("/count/").unwrap(), "counter");
//!
//! let m = table.find("/todo/active").unwrap();
//! assert_eq!(*m.target, "todo");
//! assert_eq!(m.captures.get("filter"), Some("active"));
//! assert!(table.find("/nope").is_none());
//! ```

mod core;

pub use core::{
    compile_route, CaptureVec, CompiledRoute, RouteMatch, RouteTable, UrlCaptures,
    MAX_INLINE_PARAMS, PLACEHOLDER_CLASS,
};
