use orb_store::StoreError;
use thiserror::Error;

/// Boxed conversion failure raised by a [`ValueAccessor`](crate::ValueAccessor).
pub type ConversionSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from object creation and property writes.
///
/// None of these undo writes already applied to the row. Discarding a
/// partially populated object is done by cancelling the enclosing
/// transaction.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// Objects can only be created or modified inside a write transaction.
    #[error("can only create or modify objects within a write transaction")]
    TransactionState,

    /// The property name is not part of the object's schema.
    #[error("setting invalid property '{property}' on object '{object_type}'")]
    UnknownProperty {
        object_type: String,
        property: String,
    },

    /// An object with the same primary key exists and updating was not allowed.
    #[error("attempting to create an object of type '{object_type}' with an existing primary key value {key}")]
    DuplicateKey { object_type: String, key: String },

    /// A new object had no value and no default for a property.
    #[error("missing property value for property '{property}' on object '{object_type}'")]
    MissingValue {
        object_type: String,
        property: String,
    },

    /// The property uses the deprecated `any` type, which cannot be written.
    #[error("property '{object_type}.{property}' has the unsupported 'any' type")]
    UnsupportedType {
        object_type: String,
        property: String,
    },

    /// The accessor could not coerce a value to the property's type.
    #[error("invalid value for property '{object_type}.{property}': {source}")]
    Conversion {
        object_type: String,
        property: String,
        #[source]
        source: ConversionSource,
    },

    /// The accessor could not turn a value into an object of the link target type.
    #[error("cannot convert value to an object of type '{object_type}': {source}")]
    LinkConversion {
        object_type: String,
        #[source]
        source: ConversionSource,
    },

    /// No object type with this name in the realm's schema.
    #[error("unknown object type '{0}'")]
    UnknownObjectType(String),

    /// A primary-key lookup was requested on a type without one.
    #[error("object type '{0}' has no primary key")]
    NoPrimaryKey(String),

    /// An existing table's columns disagree with the schema.
    #[error("table for '{object_type}' does not match the schema at property '{property}'")]
    SchemaMismatch {
        object_type: String,
        property: String,
    },

    /// Error from the storage backend.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ObjectError {
    /// Wrap an accessor failure with the property it was converting for.
    pub fn conversion<E>(object_type: &str, property: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Conversion {
            object_type: object_type.to_string(),
            property: property.to_string(),
            source: Box::new(source),
        }
    }
}

/// Result alias for object operations.
pub type ObjectResult<T> = Result<T, ObjectError>;
