//! Error taxonomy for registration, coercion and dispatch.
//!
//! - [`DefinitionError`] is raised while a controller definition is turned into a
//!   descriptor. It is fatal only to that controller: start-up logs it and moves on.
//! - [`CoercionError`] is raised when raw request text cannot be converted into the
//!   declared type.
//! - [`DispatchError`] is the per-request failure funnelled into the error-redirect
//!   protocol. Each variant maps onto one [`ErrorKind`].

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

use crate::coerce::ScalarType;

/// Shared fault carried by [`DispatchError::Internal`].
pub type Fault = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Failure condition reported to the error controller.
///
/// Stored in the session under [`crate::dispatcher::ERROR_TYPE_KEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InternalServerError,
    BadRequest,
}

impl ErrorKind {
    /// HTTP status code the error controller should render.
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InternalServerError => 500,
            ErrorKind::BadRequest => 400,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "NotFound"),
            ErrorKind::InternalServerError => write!(f, "InternalServerError"),
            ErrorKind::BadRequest => write!(f, "BadRequest"),
        }
    }
}

/// Registration-time contract violation on a controller definition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("handler [{handler}] parameter #{index} has no request binding name")]
    UnboundParameter { handler: String, index: usize },

    #[error(
        "handler [{handler}] parameter #{index} is the raw primitive [{type_name}]; \
         declare a nullable type so an absent value is representable"
    )]
    PrimitiveParameter {
        handler: String,
        index: usize,
        type_name: String,
    },

    #[error("handler [{handler}] parameter #{index} is a list without exactly one element type")]
    AmbiguousListElement { handler: String, index: usize },

    #[error("handler [{handler}] parameter #{index} is bound from the URL but is not a scalar")]
    UrlParameterNotScalar { handler: String, index: usize },

    #[error("handler [{handler}] parameter #{index} names URL placeholder [{name}] missing from [{path}]")]
    UnknownUrlParameter {
        handler: String,
        index: usize,
        name: String,
        path: String,
    },

    #[error("handler [{handler}] uses unsupported HTTP method [{method}]")]
    UnsupportedMethod { handler: String, method: String },

    #[error("invalid path template [{path}]: {reason}")]
    InvalidPathTemplate { path: String, reason: String },
}

/// Raw request text that could not be converted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("cannot convert [{value}] to {target}: {reason}")]
    Malformed {
        value: String,
        target: ScalarType,
        reason: String,
    },

    #[error("cannot percent-decode URL segment [{value}]: {reason}")]
    Undecodable { value: String, reason: String },
}

/// Per-request failure caught at the dispatch boundary.
///
/// Cloning shares the underlying fault, so the same error can be stored in the session
/// for the error controller and handed back to the transport.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("no handler for {method} [{path}] action [{action}]")]
    NotFound {
        method: String,
        path: String,
        action: String,
    },

    #[error("Required HTTP Request Parameter [{argument}]")]
    BadRequest { argument: String },

    #[error("handler [{handler}] failed: {source}")]
    Internal {
        handler: String,
        #[source]
        source: Fault,
    },
}

impl DispatchError {
    /// Condition kind reported through the error protocol.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::NotFound { .. } => ErrorKind::NotFound,
            DispatchError::BadRequest { .. } => ErrorKind::BadRequest,
            DispatchError::Internal { .. } => ErrorKind::InternalServerError,
        }
    }

    pub(crate) fn internal(
        handler: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        DispatchError::Internal {
            handler: handler.to_string(),
            source: Arc::from(source.into()),
        }
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
