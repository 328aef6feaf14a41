use thiserror::Error;

use crate::property::PropertyType;

/// Errors produced while building schema metadata.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate object type '{0}'")]
    DuplicateObjectType(String),

    #[error("duplicate property '{property}' on '{object_type}'")]
    DuplicateProperty {
        object_type: String,
        property: String,
    },

    #[error("primary key '{property}' is not a property of '{object_type}'")]
    MissingPrimaryKey {
        object_type: String,
        property: String,
    },

    #[error("primary key '{object_type}.{property}' has type {property_type}; expected int or string")]
    InvalidPrimaryKeyType {
        object_type: String,
        property: String,
        property_type: PropertyType,
    },

    #[error("link property '{object_type}.{property}' has no object type")]
    MissingObjectType {
        object_type: String,
        property: String,
    },

    #[error("scalar property '{object_type}.{property}' must not name an object type")]
    UnexpectedObjectType {
        object_type: String,
        property: String,
    },

    #[error("property '{object_type}.{property}' links to unknown type '{target}'")]
    UnknownLinkTarget {
        object_type: String,
        property: String,
        target: String,
    },
}
