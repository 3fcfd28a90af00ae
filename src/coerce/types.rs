use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};

/// Scalar targets the coercion engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// UTF-8 text, passed through unchanged
    Text,
    /// 32-bit signed integer
    Integer,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScalarType::Text => "Text",
            ScalarType::Integer => "Integer",
            ScalarType::Float => "Float",
            ScalarType::Double => "Double",
        };
        write!(f, "{s}")
    }
}

/// Declared type of a handler parameter.
///
/// This is the registration-time stand-in for a method signature: the descriptor
/// builder validates it and the binder switches on it.
#[derive(Debug, Clone)]
pub enum ParamType {
    /// Nullable scalar; absent input binds as `None`
    Scalar(ScalarType),
    /// Raw, non-nullable primitive (e.g. `"int"`); always rejected at registration
    Primitive(&'static str),
    /// List with its declared generic arguments, as written
    List(Vec<ParamType>),
    /// Object bound field-by-field from `name.field` parameters
    Object(ObjectSchema),
    /// Any other declared type; binds as `None`
    Other(&'static str),
}

impl ParamType {
    pub const TEXT: ParamType = ParamType::Scalar(ScalarType::Text);
    pub const INTEGER: ParamType = ParamType::Scalar(ScalarType::Integer);
    pub const FLOAT: ParamType = ParamType::Scalar(ScalarType::Float);
    pub const DOUBLE: ParamType = ParamType::Scalar(ScalarType::Double);

    /// `List<element>`
    #[must_use]
    pub fn list_of(element: ParamType) -> Self {
        ParamType::List(vec![element])
    }

    /// Object parameter bound through `T`'s [`FormObject`] fields.
    #[must_use]
    pub fn object<T: FormObject>() -> Self {
        ParamType::Object(ObjectSchema::of::<T>())
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<ScalarType> {
        match self {
            ParamType::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    /// Human-readable type name for logs and definition errors.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            ParamType::Scalar(s) => s.to_string(),
            ParamType::Primitive(name) | ParamType::Other(name) => (*name).to_string(),
            ParamType::List(args) => {
                let args: Vec<String> = args.iter().map(ParamType::type_name).collect();
                format!("List<{}>", args.join(", "))
            }
            ParamType::Object(schema) => schema.type_name().to_string(),
        }
    }
}

/// Bindable shape of one object field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    /// List field; `None` when the element is not a scalar (elements bind as `null`)
    List(Option<ScalarType>),
    /// Nested object or unsupported type; never bound, left at its default
    Nested,
}

/// One bindable field of a [`FormObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire name, read from `prefix.name`
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// A type that can be bound from prefixed request parameters.
///
/// Usually derived with `#[derive(FormObject)]`, which lists every named field and
/// honors `#[serde(rename)]` / `#[serde(rename_all)]` so the wire names agree with serde.
pub trait FormObject: Default + Serialize + DeserializeOwned + Send + 'static {
    fn form_fields() -> Vec<FieldSpec>;
}

/// Type-erased [`FormObject`] description held by a parameter spec.
#[derive(Clone)]
pub struct ObjectSchema {
    type_name: &'static str,
    fields: Vec<FieldSpec>,
    instantiate: fn() -> Result<Value, serde_json::Error>,
    materialize: fn(Value) -> Result<Value, serde_json::Error>,
}

impl ObjectSchema {
    #[must_use]
    pub fn of<T: FormObject>() -> Self {
        fn instantiate<T: FormObject>() -> Result<Value, serde_json::Error> {
            serde_json::to_value(T::default())
        }
        fn materialize<T: FormObject>(value: Value) -> Result<Value, serde_json::Error> {
            let object: T = serde_json::from_value(value)?;
            serde_json::to_value(object)
        }

        Self {
            type_name: std::any::type_name::<T>(),
            fields: T::form_fields(),
            instantiate: instantiate::<T>,
            materialize: materialize::<T>,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Serialized default instance of the object.
    pub(crate) fn instantiate(&self) -> Result<Value, serde_json::Error> {
        (self.instantiate)()
    }

    /// Round-trips `value` through the concrete type.
    pub(crate) fn materialize(&self, value: Value) -> Result<Value, serde_json::Error> {
        (self.materialize)(value)
    }
}

impl Debug for ObjectSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectSchema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Read access to request parameters.
///
/// Parameters are multi-valued; `parameter` returns the first value the way a form
/// post would be read for a single field.
pub trait ParamSource {
    fn parameter(&self, name: &str) -> Option<&str>;
    fn parameter_values(&self, name: &str) -> &[String];
}

impl ParamSource for HashMap<String, Vec<String>> {
    fn parameter(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    fn parameter_values(&self, name: &str) -> &[String] {
        self.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
