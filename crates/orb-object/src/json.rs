//! JSON front-end: a [`ValueAccessor`] over borrowed `serde_json::Value`s.
//!
//! Objects map to dictionaries, arrays to link lists. Dates are RFC 3339
//! strings or integer seconds since the Unix epoch. Binary properties take
//! the UTF-8 bytes of a JSON string.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use orb_store::StorageBackend;
use orb_types::{ObjectSchema, RowIndex};
use serde_json::Value;
use thiserror::Error;

use crate::accessor::ValueAccessor;
use crate::error::{ObjectError, ObjectResult};
use crate::object::Object;
use crate::realm::Realm;

/// Conversion failures of the JSON front-end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonError {
    #[error("expected {expected}, found {found}")]
    ExpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("integer {0} does not fit in 64 bits")]
    IntegerOverflow(String),

    #[error("number {0} does not fit in a 32-bit float")]
    FloatOverflow(String),

    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no value for key '{0}'")]
    MissingKey(String),

    #[error("invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("no default value for '{object_type}.{property}'")]
    NoDefault {
        object_type: String,
        property: String,
    },
}

/// Default property values, keyed by object type then property name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonDefaults {
    by_type: HashMap<String, HashMap<String, Value>>,
}

impl JsonDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` as the default for `object_type.property`.
    pub fn insert(&mut self, object_type: impl Into<String>, property: impl Into<String>, value: Value) {
        self.by_type
            .entry(object_type.into())
            .or_default()
            .insert(property.into(), value);
    }

    pub fn get(&self, object_type: &str, property: &str) -> Option<&Value> {
        self.by_type.get(object_type)?.get(property)
    }

    /// Total number of registered defaults.
    pub fn len(&self) -> usize {
        self.by_type.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accessor for JSON values borrowed for `'v`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonAccessor<'v> {
    defaults: Option<&'v JsonDefaults>,
}

impl<'v> JsonAccessor<'v> {
    /// An accessor without defaults: every property must be supplied.
    pub fn new() -> Self {
        Self { defaults: None }
    }

    pub fn with_defaults(defaults: &'v JsonDefaults) -> Self {
        Self {
            defaults: Some(defaults),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(expected: &'static str, value: &Value) -> JsonError {
    JsonError::ExpectedType {
        expected,
        found: kind(value),
    }
}

impl<'v> ValueAccessor<'v> for JsonAccessor<'v> {
    type Value = &'v Value;
    type Error = JsonError;

    fn dict_has_value_for_key(&self, dict: &'v Value, prop_name: &str) -> bool {
        dict.as_object()
            .is_some_and(|map| map.contains_key(prop_name))
    }

    fn dict_value_for_key(&self, dict: &'v Value, prop_name: &str) -> Result<&'v Value, JsonError> {
        let map = dict.as_object().ok_or_else(|| expected("object", dict))?;
        map.get(prop_name)
            .ok_or_else(|| JsonError::MissingKey(prop_name.to_string()))
    }

    fn has_default_value_for_property(&self, object_schema: &ObjectSchema, prop_name: &str) -> bool {
        self.defaults
            .is_some_and(|d| d.get(&object_schema.name, prop_name).is_some())
    }

    fn default_value_for_property(
        &self,
        object_schema: &ObjectSchema,
        prop_name: &str,
    ) -> Result<&'v Value, JsonError> {
        self.defaults
            .and_then(|d| d.get(&object_schema.name, prop_name))
            .ok_or_else(|| JsonError::NoDefault {
                object_type: object_schema.name.clone(),
                property: prop_name.to_string(),
            })
    }

    fn to_bool(&self, value: &'v Value) -> Result<bool, JsonError> {
        value.as_bool().ok_or_else(|| expected("bool", value))
    }

    fn to_long(&self, value: &'v Value) -> Result<i64, JsonError> {
        let n = value.as_number().ok_or_else(|| expected("integer", value))?;
        if let Some(v) = n.as_i64() {
            return Ok(v);
        }
        if n.is_u64() {
            return Err(JsonError::IntegerOverflow(n.to_string()));
        }
        match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Ok(f as i64)
            }
            _ => Err(expected("integer", value)),
        }
    }

    fn to_float(&self, value: &'v Value) -> Result<f32, JsonError> {
        let f = value.as_f64().ok_or_else(|| expected("number", value))?;
        let narrowed = f as f32;
        if f.is_finite() && !narrowed.is_finite() {
            return Err(JsonError::FloatOverflow(f.to_string()));
        }
        Ok(narrowed)
    }

    fn to_double(&self, value: &'v Value) -> Result<f64, JsonError> {
        value.as_f64().ok_or_else(|| expected("number", value))
    }

    fn to_string(&self, value: &'v Value) -> Result<String, JsonError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| expected("string", value))
    }

    fn to_datetime(&self, value: &'v Value) -> Result<DateTime<Utc>, JsonError> {
        match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| JsonError::InvalidDate {
                    value: s.clone(),
                    reason: e.to_string(),
                }),
            Value::Number(n) => {
                let secs = n.as_i64().ok_or_else(|| expected("integer seconds", value))?;
                DateTime::from_timestamp(secs, 0).ok_or_else(|| JsonError::InvalidDate {
                    value: n.to_string(),
                    reason: "timestamp out of range".into(),
                })
            }
            other => Err(expected("date", other)),
        }
    }

    fn is_null(&self, value: &'v Value) -> bool {
        value.is_null()
    }

    fn to_object_index<B: StorageBackend>(
        &self,
        realm: &mut Realm<B>,
        value: &'v Value,
        object_type: &str,
        try_update: bool,
    ) -> ObjectResult<RowIndex> {
        if !value.is_object() {
            return Err(ObjectError::LinkConversion {
                object_type: object_type.to_string(),
                source: Box::new(expected("object", value)),
            });
        }
        let object_schema = realm.object_schema(object_type)?;
        let object = Object::create(self, realm, object_schema, value, try_update)?;
        Ok(object.row())
    }

    fn array_size(&self, value: &'v Value) -> Result<usize, JsonError> {
        value
            .as_array()
            .map(Vec::len)
            .ok_or_else(|| expected("array", value))
    }

    fn array_value_at_index(&self, value: &'v Value, index: usize) -> Result<&'v Value, JsonError> {
        let items = value.as_array().ok_or_else(|| expected("array", value))?;
        items.get(index).ok_or(JsonError::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orb_types::{Property, PropertyType};
    use serde_json::json;

    fn dog_schema() -> ObjectSchema {
        ObjectSchema::new("Dog", vec![Property::new("name", PropertyType::String)], None).unwrap()
    }

    // -----------------------------------------------------------------------
    // Dictionaries and defaults
    // -----------------------------------------------------------------------

    #[test]
    fn dict_access() {
        let a = JsonAccessor::new();
        let v = json!({"name": "Rex", "owner": null});
        assert!(a.dict_has_value_for_key(&v, "name"));
        assert!(a.dict_has_value_for_key(&v, "owner"));
        assert!(!a.dict_has_value_for_key(&v, "age"));
        assert_eq!(a.dict_value_for_key(&v, "name").unwrap(), &json!("Rex"));
        assert_eq!(
            a.dict_value_for_key(&v, "age").unwrap_err(),
            JsonError::MissingKey("age".into())
        );
    }

    #[test]
    fn non_object_has_no_keys() {
        let a = JsonAccessor::new();
        let v = json!([1, 2]);
        assert!(!a.dict_has_value_for_key(&v, "0"));
        assert!(matches!(
            a.dict_value_for_key(&v, "0"),
            Err(JsonError::ExpectedType { expected: "object", found: "array" })
        ));
    }

    #[test]
    fn defaults_lookup() {
        let mut defaults = JsonDefaults::new();
        defaults.insert("Dog", "name", json!("Unnamed"));
        assert_eq!(defaults.len(), 1);

        let schema = dog_schema();
        let a = JsonAccessor::with_defaults(&defaults);
        assert!(a.has_default_value_for_property(&schema, "name"));
        assert!(!a.has_default_value_for_property(&schema, "age"));
        assert_eq!(
            a.default_value_for_property(&schema, "name").unwrap(),
            &json!("Unnamed")
        );

        let none = JsonAccessor::new();
        assert!(!none.has_default_value_for_property(&schema, "name"));
        assert!(matches!(
            none.default_value_for_property(&schema, "name"),
            Err(JsonError::NoDefault { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Scalars
    // -----------------------------------------------------------------------

    #[test]
    fn integers() {
        let a = JsonAccessor::new();
        assert_eq!(a.to_long(&json!(-7)).unwrap(), -7);
        assert_eq!(a.to_long(&json!(3.0)).unwrap(), 3);
        assert!(a.to_long(&json!(3.5)).is_err());
        assert!(a.to_long(&json!("3")).is_err());
        assert!(matches!(
            a.to_long(&json!(u64::MAX)),
            Err(JsonError::IntegerOverflow(_))
        ));
    }

    #[test]
    fn floats_and_doubles() {
        let a = JsonAccessor::new();
        assert_eq!(a.to_float(&json!(1.5)).unwrap(), 1.5f32);
        assert_eq!(a.to_double(&json!(2)).unwrap(), 2.0);
        assert!(a.to_double(&json!(null)).is_err());
    }

    #[test]
    fn float_out_of_f32_range_is_rejected() {
        let a = JsonAccessor::new();
        assert!(matches!(
            a.to_float(&json!(1e39)),
            Err(JsonError::FloatOverflow(_))
        ));
        assert!(a.to_float(&json!(3.0e38)).unwrap().is_finite());
        assert_eq!(a.to_double(&json!(1e39)).unwrap(), 1e39);
    }

    #[test]
    fn bools_and_strings() {
        let a = JsonAccessor::new();
        assert!(a.to_bool(&json!(true)).unwrap());
        assert!(a.to_bool(&json!(1)).is_err());
        assert_eq!(a.to_string(&json!("x")).unwrap(), "x");
        assert_eq!(
            a.to_string(&json!(1)).unwrap_err(),
            JsonError::ExpectedType {
                expected: "string",
                found: "integer"
            }
        );
    }

    #[test]
    fn dates() {
        let a = JsonAccessor::new();
        let from_str = a.to_datetime(&json!("1970-01-02T00:00:00+00:00")).unwrap();
        let from_secs = a.to_datetime(&json!(86_400)).unwrap();
        assert_eq!(from_str, from_secs);
        assert!(matches!(
            a.to_datetime(&json!("yesterday")),
            Err(JsonError::InvalidDate { .. })
        ));
        assert!(a.to_datetime(&json!(true)).is_err());
    }

    #[test]
    fn null_detection() {
        let a = JsonAccessor::new();
        assert!(a.is_null(&Value::Null));
        assert!(!a.is_null(&json!({})));
    }

    // -----------------------------------------------------------------------
    // Arrays
    // -----------------------------------------------------------------------

    #[test]
    fn arrays() {
        let a = JsonAccessor::new();
        let v = json!([{"a": 1}, {"a": 2}]);
        assert_eq!(a.array_size(&v).unwrap(), 2);
        assert_eq!(a.array_value_at_index(&v, 1).unwrap(), &json!({"a": 2}));
        assert_eq!(
            a.array_value_at_index(&v, 2).unwrap_err(),
            JsonError::IndexOutOfRange { index: 2, len: 2 }
        );
        assert!(a.array_size(&json!({})).is_err());
    }
}
