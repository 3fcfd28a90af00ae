//! Request, response and session data types a transport adapter fills in, plus the
//! per-request [`RequestContext`] handlers receive.

pub mod context;
pub mod request;
pub mod response;
pub mod session;

pub use context::RequestContext;
pub use request::{parse_query_params, WebRequest};
pub use response::WebResponse;
pub use session::Session;
