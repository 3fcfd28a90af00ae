//! # Coercion Module
//!
//! Converts raw request text into typed values without handlers writing any parsing
//! code. Values are produced as [`serde_json::Value`] so a handler can extract them into
//! any serde type through [`crate::dispatcher::Arguments`].
//!
//! ## Shapes
//!
//! Handler signatures are restricted at registration to exactly three shapes, so the
//! coercion surface is closed:
//!
//! - **Scalar** - [`coerce_scalar`]: text, 32-bit integer, 32-bit float, 64-bit float
//! - **List** - [`coerce_list`]: every value under one key, in input order; absent input
//!   is an empty list, never absent
//! - **Object** - [`coerce_object`]: one level of `prefix.field` binding into a
//!   [`FormObject`]; nested object fields are never bound
//!
//! ## Example
//!
//! ```rust
//! use webframe::coerce::{coerce_list, ScalarType};
//!
//! let values = vec!["1".to_string(), "2".to_string(), "3".to_string()];
//! let list = coerce_list(&values, Some(ScalarType::Integer)).unwrap();
//! assert_eq!(list, serde_json::json!([1, 2, 3]));
//! ```

mod core;
mod types;

pub use core::{coerce_list, coerce_object, coerce_param, coerce_scalar};
pub use types::{
    FieldSpec, FieldType, FormObject, ObjectSchema, ParamSource, ParamType, ScalarType,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoercionError;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Bean {
        str_value: Option<String>,
        int_value: Option<i32>,
        list_int: Vec<i32>,
        children: Vec<Bean>,
    }

    impl FormObject for Bean {
        fn form_fields() -> Vec<FieldSpec> {
            vec![
                FieldSpec::new("strValue", FieldType::Scalar(ScalarType::Text)),
                FieldSpec::new("intValue", FieldType::Scalar(ScalarType::Integer)),
                FieldSpec::new("listInt", FieldType::List(Some(ScalarType::Integer))),
                FieldSpec::new("children", FieldType::List(None)),
            ]
        }
    }

    fn params(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_scalar_targets() {
        assert_eq!(coerce_scalar("hello", ScalarType::Text).unwrap(), json!("hello"));
        assert_eq!(coerce_scalar("33", ScalarType::Integer).unwrap(), json!(33));
        assert_eq!(coerce_scalar("153.14433", ScalarType::Double).unwrap(), json!(153.14433));

        let float: f32 = serde_json::from_value(coerce_scalar("3.14", ScalarType::Float).unwrap())
            .unwrap();
        assert_eq!(float, 3.14f32);
    }

    #[test]
    fn test_malformed_integer() {
        let err = coerce_scalar("abc", ScalarType::Integer).unwrap_err();
        assert!(matches!(err, CoercionError::Malformed { target: ScalarType::Integer, .. }));
    }

    #[test]
    fn test_non_finite_numbers_are_malformed() {
        for raw in ["NaN", "inf", "-infinity"] {
            assert!(matches!(
                coerce_scalar(raw, ScalarType::Double),
                Err(CoercionError::Malformed { target: ScalarType::Double, .. })
            ));
            assert!(matches!(
                coerce_scalar(raw, ScalarType::Float),
                Err(CoercionError::Malformed { target: ScalarType::Float, .. })
            ));
        }
        // f32 overflow parses to infinity
        assert!(coerce_scalar("1e40", ScalarType::Float).is_err());
        assert!(coerce_list(&["1.5", "NaN"], Some(ScalarType::Double)).is_err());
    }

    #[test]
    fn test_unsupported_target_is_absent() {
        assert_eq!(coerce_param("x", &ParamType::Other("HashMap")).unwrap(), None);
        assert_eq!(coerce_param("1", &ParamType::list_of(ParamType::INTEGER)).unwrap(), None);
        assert_eq!(coerce_param("1", &ParamType::INTEGER).unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_list_in_order() {
        let values = ["1", "2", "3", "4", "5"];
        let list = coerce_list(&values, Some(ScalarType::Integer)).unwrap();
        assert_eq!(list, json!([1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_list_absent_is_empty() {
        let values: [&str; 0] = [];
        assert_eq!(coerce_list(&values, Some(ScalarType::Text)).unwrap(), json!([]));
    }

    #[test]
    fn test_object_binds_prefixed_fields() {
        let p = params(&[
            ("bean.strValue", &["hello"][..]),
            ("bean.intValue", &["33"][..]),
            ("other.strValue", &["ignored"][..]),
        ]);
        let value = coerce_object(&p, "bean", &ObjectSchema::of::<Bean>()).unwrap();
        let bean: Bean = serde_json::from_value(value).unwrap();
        assert_eq!(bean.str_value.as_deref(), Some("hello"));
        assert_eq!(bean.int_value, Some(33));
        assert!(bean.list_int.is_empty());
        assert!(bean.children.is_empty());
    }

    #[test]
    fn test_object_list_field() {
        let p = params(&[("bean.listInt", &["7", "8"][..])]);
        let value = coerce_object(&p, "bean", &ObjectSchema::of::<Bean>()).unwrap();
        assert_eq!(value["listInt"], json!([7, 8]));
        assert_eq!(value["strValue"], json!(null));
    }

    #[test]
    fn test_object_failure_is_absent() {
        let p = params(&[("bean.intValue", &["not-a-number"][..])]);
        assert!(coerce_object(&p, "bean", &ObjectSchema::of::<Bean>()).is_none());
    }
}
