use serde_json::Value;
use tracing::{debug, warn};

use super::types::{FieldType, ObjectSchema, ParamSource, ParamType, ScalarType};
use crate::error::CoercionError;

/// Convert one raw value into `target`.
///
/// Text passes through; numbers are parsed and fail with
/// [`CoercionError::Malformed`] when the text is not a valid literal or is not finite
/// (`NaN`, `inf`), since JSON has no representation for those.
pub fn coerce_scalar(raw: &str, target: ScalarType) -> Result<Value, CoercionError> {
    let malformed = |reason: String| CoercionError::Malformed {
        value: raw.to_string(),
        target,
        reason,
    };

    match target {
        ScalarType::Text => Ok(Value::String(raw.to_string())),
        ScalarType::Integer => raw
            .parse::<i32>()
            .map(Value::from)
            .map_err(|e| malformed(e.to_string())),
        ScalarType::Float => {
            let parsed = raw.parse::<f32>().map_err(|e| malformed(e.to_string()))?;
            finite(f64::from(parsed)).ok_or_else(|| malformed("not a finite number".to_string()))
        }
        ScalarType::Double => {
            let parsed = raw.parse::<f64>().map_err(|e| malformed(e.to_string()))?;
            finite(parsed).ok_or_else(|| malformed("not a finite number".to_string()))
        }
    }
}

fn finite(n: f64) -> Option<Value> {
    serde_json::Number::from_f64(n).map(Value::Number)
}

/// Primitive-layer coercion against a declared parameter type.
///
/// Only scalar targets produce a value; every other declared type yields `Ok(None)`
/// and the caller decides whether absence is acceptable.
pub fn coerce_param(raw: &str, target: &ParamType) -> Result<Option<Value>, CoercionError> {
    match target.as_scalar() {
        Some(scalar) => coerce_scalar(raw, scalar).map(Some),
        None => {
            debug!(target = %target.type_name(), "Unsupported coercion target, binding as absent");
            Ok(None)
        }
    }
}

/// Coerce every raw value into `element`, preserving input order.
///
/// Total over absent input: no values produce an empty array. Elements without a
/// scalar type bind as `null`.
pub fn coerce_list<S: AsRef<str>>(
    values: &[S],
    element: Option<ScalarType>,
) -> Result<Value, CoercionError> {
    let mut items = Vec::with_capacity(values.len());
    for raw in values {
        let item = match element {
            Some(scalar) => coerce_scalar(raw.as_ref(), scalar)?,
            None => Value::Null,
        };
        items.push(item);
    }
    Ok(Value::Array(items))
}

/// Bind an object from `prefix.field` request parameters.
///
/// Starts from the object's default value, sets list fields unconditionally and
/// scalar fields when present, then round-trips the result through the concrete
/// type. Nested fields are left at their defaults. Any failure is logged and the
/// whole object binds as `None`.
pub fn coerce_object<P: ParamSource + ?Sized>(
    params: &P,
    prefix: &str,
    schema: &ObjectSchema,
) -> Option<Value> {
    match bind_object_fields(params, prefix, schema) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(
                prefix = %prefix,
                object_type = schema.type_name(),
                error = %error,
                "Object coercion failed, binding as absent"
            );
            None
        }
    }
}

fn bind_object_fields<P: ParamSource + ?Sized>(
    params: &P,
    prefix: &str,
    schema: &ObjectSchema,
) -> anyhow::Result<Value> {
    let mut fields = match schema.instantiate()? {
        Value::Object(map) => map,
        other => anyhow::bail!(
            "{} does not serialize to an object (got {other})",
            schema.type_name()
        ),
    };

    for field in schema.fields() {
        let key = format!("{prefix}.{}", field.name);
        match field.ty {
            FieldType::List(element) => {
                let values = params.parameter_values(&key);
                fields.insert(field.name.to_string(), coerce_list(values, element)?);
            }
            FieldType::Scalar(scalar) => {
                if let Some(raw) = params.parameter(&key) {
                    fields.insert(field.name.to_string(), coerce_scalar(raw, scalar)?);
                }
            }
            FieldType::Nested => {}
        }
    }

    Ok(schema.materialize(Value::Object(fields))?)
}
