use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared storage type of a property.
///
/// The set is closed: every writer dispatches over all of these variants.
/// [`PropertyType::Any`] is kept as a variant even though no value can ever be
/// written to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Bool,
    Int,
    Float,
    Double,
    String,
    /// Raw byte blob.
    Data,
    /// Deprecated mixed type. Always rejected on write.
    Any,
    Date,
    /// Single link to an object of the target type.
    Object,
    /// Ordered list of links to objects of the target type.
    Array,
}

impl PropertyType {
    /// Returns `true` for the two link-carrying types.
    pub fn is_link(&self) -> bool {
        matches!(self, Self::Object | Self::Array)
    }

    /// Returns `true` if a property of this type may act as a primary key.
    pub fn can_be_primary(&self) -> bool {
        matches!(self, Self::Int | Self::String)
    }

    /// Parse the lowercase name used in schema files.
    ///
    /// `list` is accepted as an alias of `array`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Self::Bool),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "string" => Some(Self::String),
            "data" => Some(Self::Data),
            "any" => Some(Self::Any),
            "date" => Some(Self::Date),
            "object" => Some(Self::Object),
            "array" | "list" => Some(Self::Array),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::String => write!(f, "string"),
            Self::Data => write!(f, "data"),
            Self::Any => write!(f, "any"),
            Self::Date => write!(f, "date"),
            Self::Object => write!(f, "object"),
            Self::Array => write!(f, "array"),
        }
    }
}

/// One declared property of an object type.
///
/// `table_column` and `is_primary` are assigned when the owning
/// [`ObjectSchema`](crate::ObjectSchema) is built and never change afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// Target type name for `Object` and `Array` properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(skip)]
    pub table_column: usize,
    #[serde(skip)]
    pub is_primary: bool,
}

impl Property {
    /// A scalar property (anything but `Object`/`Array`).
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            object_type: None,
            table_column: 0,
            is_primary: false,
        }
    }

    /// A single-link property pointing at `object_type`.
    pub fn object(name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            object_type: Some(object_type.into()),
            ..Self::new(name, PropertyType::Object)
        }
    }

    /// A link-list property holding objects of `object_type`.
    pub fn array(name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            object_type: Some(object_type.into()),
            ..Self::new(name, PropertyType::Array)
        }
    }

    /// Target type name, or `""` for scalar properties.
    pub fn target_type(&self) -> &str {
        self.object_type.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_display() {
        for ty in [
            PropertyType::Bool,
            PropertyType::Int,
            PropertyType::Float,
            PropertyType::Double,
            PropertyType::String,
            PropertyType::Data,
            PropertyType::Any,
            PropertyType::Date,
            PropertyType::Object,
            PropertyType::Array,
        ] {
            assert_eq!(PropertyType::from_name(&ty.to_string()), Some(ty));
        }
    }

    #[test]
    fn list_is_an_alias_for_array() {
        assert_eq!(PropertyType::from_name("list"), Some(PropertyType::Array));
        assert_eq!(PropertyType::from_name("mixed"), None);
    }

    #[test]
    fn only_int_and_string_can_be_primary() {
        assert!(PropertyType::Int.can_be_primary());
        assert!(PropertyType::String.can_be_primary());
        assert!(!PropertyType::Double.can_be_primary());
        assert!(!PropertyType::Object.can_be_primary());
    }

    #[test]
    fn link_constructors_set_target() {
        let p = Property::array("dogs", "Dog");
        assert_eq!(p.property_type, PropertyType::Array);
        assert_eq!(p.target_type(), "Dog");
        assert!(p.property_type.is_link());
        assert_eq!(Property::new("age", PropertyType::Int).target_type(), "");
    }
}
