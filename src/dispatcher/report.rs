use serde::Serialize;
use std::error::Error;
use std::sync::Arc;

use super::{ERROR_TYPE_KEY, EXCEPTION_KEY};
use crate::error::{DispatchError, ErrorKind};
use crate::server::Session;

/// What an error controller renders for the last failed request of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub http_status_code: u16,
    pub kind: String,
    pub message: String,
    /// The error followed by each of its sources, outermost first
    pub causes: Vec<String>,
    /// `causes` formatted one per line
    pub trace: String,
}

impl ErrorReport {
    /// Read the condition stored by the dispatcher, if any.
    #[must_use]
    pub fn from_session(session: &Session) -> Option<Self> {
        let kind = session.get::<ErrorKind>(ERROR_TYPE_KEY)?;
        let error = session.get::<DispatchError>(EXCEPTION_KEY);
        Some(Self::build(*kind, error.as_deref()))
    }

    fn build(kind: ErrorKind, error: Option<&DispatchError>) -> Self {
        let mut causes = Vec::new();
        let mut current: Option<&(dyn Error + 'static)> =
            error.map(|e| e as &(dyn Error + 'static));
        while let Some(err) = current {
            causes.push(err.to_string());
            current = err.source();
        }

        let message = causes.first().cloned().unwrap_or_else(|| "Null".to_string());
        let trace = causes
            .iter()
            .enumerate()
            .map(|(depth, cause)| {
                if depth == 0 {
                    cause.clone()
                } else {
                    format!("Caused by: {cause}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            http_status_code: kind.status_code(),
            kind: kind.to_string(),
            message,
            causes,
            trace,
        }
    }
}

/// Store the condition for the error controller.
///
/// NotFound carries no fault: the exception slot is cleared, so the report reads
/// `"Null"`.
pub(crate) fn stash(session: &Session, error: &DispatchError) {
    session.set(ERROR_TYPE_KEY, error.kind());
    match error {
        DispatchError::NotFound { .. } => {
            session.remove(EXCEPTION_KEY);
        }
        _ => session.set_shared(EXCEPTION_KEY, Arc::new(error.clone())),
    }
}
