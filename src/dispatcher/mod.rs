//! # Dispatcher Module
//!
//! The dispatcher turns one [`WebRequest`](crate::server::WebRequest) into one handler
//! invocation, or into exactly one trip through the error protocol.
//!
//! ## Request Flow
//!
//! 1. **Normalize**: strip the context path, read `_action_` (default `_DEFAULT_`) and
//!    publish `contextBaseUrl`
//! 2. **Match**: walk the compiled routes in registration order; the first structural
//!    match is authoritative
//! 3. **Resolve**: look up (method, action) in that controller only
//! 4. **Bind**: URL arguments are percent-decoded then coerced, request arguments go
//!    through the coercion engine; a required argument that binds as absent stops the
//!    request before any controller exists
//! 5. **Instantiate**: build a fresh controller and resolve its service injection points
//! 6. **Invoke**: run the handler; returned errors and panics become
//!    [`DispatchError::Internal`](crate::error::DispatchError::Internal)
//!
//! ## Error Handling
//!
//! All three failure kinds go to [`WebApp::handle_exception`]:
//!
//! - committed response: nothing is written, [`DispatchOutcome::Absorbed`]
//! - otherwise the kind and error are stored in the session under [`ERROR_TYPE_KEY`] and
//!   [`EXCEPTION_KEY`], then one redirect to the error controller is sent
//!   ([`DispatchOutcome::ErrorRedirect`])
//! - without an error controller the error is returned to the transport
//!
//! The error controller reads the stored condition back with [`ErrorReport`].
//!
//! ## Concurrency
//!
//! [`WebApp`] is immutable once built. Dispatch is synchronous on the caller's thread,
//! so one shared `WebApp` serves any number of request threads without locks.

mod binder;
mod core;
mod report;

pub use binder::{bind_arguments, Arguments};
pub use core::{
    normalize_path, DispatchOutcome, WebApp, ACTION_PARAM, ERROR_TYPE_KEY, EXCEPTION_KEY,
};
pub use report::ErrorReport;
