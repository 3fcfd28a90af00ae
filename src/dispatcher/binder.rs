use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::coerce::{coerce_list, coerce_object, coerce_param, coerce_scalar, ParamSource, ParamType};
use crate::descriptor::{ArgumentSource, ArgumentSpec, HandlerDescriptor};
use crate::error::{CoercionError, DispatchError};
use crate::router::UrlCaptures;

/// Bound handler arguments in declaration order.
///
/// Absent optional arguments are `None`; [`Arguments::get`] maps them to `null`, so
/// they extract into `Option<T>` as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    names: Vec<String>,
    values: Vec<Option<Value>>,
}

impl Arguments {
    /// Extract argument `index` into `T`.
    ///
    /// # Errors
    ///
    /// Fails when `index` is out of range or the bound value does not deserialize into `T`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> anyhow::Result<T> {
        let Some(value) = self.values.get(index) else {
            anyhow::bail!("argument #{index} out of range ({} bound)", self.values.len());
        };
        let value = value.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            anyhow::anyhow!(
                "argument #{index} [{}] cannot be read as {}: {e}",
                self.names.get(index).map(String::as_str).unwrap_or_default(),
                std::any::type_name::<T>()
            )
        })
    }

    /// Extract the argument bound under `name`.
    ///
    /// # Errors
    ///
    /// Fails when no argument has that name or it does not deserialize into `T`.
    pub fn named<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<T> {
        match self.names.iter().position(|n| n == name) {
            Some(index) => self.get(index),
            None => anyhow::bail!("no argument named [{name}]"),
        }
    }

    /// Bound value, `None` when absent.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn push(&mut self, name: &str, value: Option<Value>) {
        self.names.push(name.to_string());
        self.values.push(value);
    }
}

/// Percent-decode one URL segment, `+` meaning space.
pub(crate) fn decode_segment(raw: &str) -> Result<String, CoercionError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| CoercionError::Undecodable {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

fn bind_one<P: ParamSource + ?Sized>(
    params: &P,
    spec: &ArgumentSpec,
    captures: &UrlCaptures,
) -> Result<Option<Value>, CoercionError> {
    let name = spec.name();
    match spec.source() {
        ArgumentSource::Url => match captures.get(name) {
            Some(raw) => coerce_param(&decode_segment(raw)?, spec.param_type()),
            None => Ok(None),
        },
        ArgumentSource::Request => match spec.param_type() {
            ParamType::Scalar(scalar) => params
                .parameter(name)
                .map(|raw| coerce_scalar(raw, *scalar))
                .transpose(),
            ParamType::List(_) => {
                coerce_list(params.parameter_values(name), spec.element_scalar()).map(Some)
            }
            ParamType::Object(schema) => Ok(coerce_object(params, name, schema)),
            other => match params.parameter(name) {
                Some(raw) => coerce_param(raw, other),
                None => Ok(None),
            },
        },
    }
}

/// Bind every declared argument of `handler`.
///
/// Runs before the controller exists, so a failure here has no side effects.
///
/// # Errors
///
/// - [`DispatchError::BadRequest`] for the first required argument that binds as absent
/// - [`DispatchError::Internal`] when a raw value cannot be decoded or converted
pub fn bind_arguments<P: ParamSource + ?Sized>(
    params: &P,
    handler: &HandlerDescriptor,
    captures: &UrlCaptures,
) -> Result<Arguments, DispatchError> {
    let mut arguments = Arguments::default();
    for spec in handler.arguments() {
        let value = bind_one(params, spec, captures)
            .map_err(|e| DispatchError::internal(handler.handler_name(), e))?;

        if value.is_none() && spec.is_required() {
            debug!(
                handler = %handler.handler_name(),
                argument = %spec.name(),
                "Required argument missing"
            );
            return Err(DispatchError::BadRequest {
                argument: spec.name().to_string(),
            });
        }
        arguments.push(spec.name(), value);
    }
    Ok(arguments)
}
