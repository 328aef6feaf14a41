//! The [`ValueAccessor`] trait: the conversion capability every front-end
//! supplies.
//!
//! Object creation and property writes are written once against this trait.
//! A front-end (a scripting host binding, a JSON importer, ...) implements it
//! for its own dynamic value representation.

use chrono::{DateTime, Utc};
use orb_store::StorageBackend;
use orb_types::{ObjectSchema, RowIndex};

use crate::error::ObjectResult;
use crate::realm::Realm;

/// Converts opaque host values into storable data.
///
/// The implementing type is the conversion context. `Value` is a cheap,
/// copyable handle to a value owned by the host for at least `'v`; this
/// layer never mutates it.
///
/// Every conversion may fail with [`Self::Error`] when the value cannot be
/// coerced to the requested type. [`to_object_index`](Self::to_object_index)
/// is the only operation allowed to write: it resolves or creates the
/// referenced object, usually by calling back into
/// [`Object::create`](crate::Object::create).
pub trait ValueAccessor<'v> {
    /// Handle to a host value.
    type Value: Copy;

    /// Conversion failure.
    type Error: std::error::Error + Send + Sync + 'static;

    // ---- Dictionary access ----

    /// Returns `true` if `dict` carries an entry named `prop_name`.
    fn dict_has_value_for_key(&self, dict: Self::Value, prop_name: &str) -> bool;

    /// The entry named `prop_name` in `dict`.
    fn dict_value_for_key(&self, dict: Self::Value, prop_name: &str)
        -> Result<Self::Value, Self::Error>;

    // ---- Defaults ----

    /// Returns `true` if the host registered a default for the property.
    fn has_default_value_for_property(&self, object_schema: &ObjectSchema, prop_name: &str)
        -> bool;

    /// The registered default for the property.
    fn default_value_for_property(
        &self,
        object_schema: &ObjectSchema,
        prop_name: &str,
    ) -> Result<Self::Value, Self::Error>;

    // ---- Scalars ----

    fn to_bool(&self, value: Self::Value) -> Result<bool, Self::Error>;
    fn to_long(&self, value: Self::Value) -> Result<i64, Self::Error>;
    fn to_float(&self, value: Self::Value) -> Result<f32, Self::Error>;
    fn to_double(&self, value: Self::Value) -> Result<f64, Self::Error>;
    fn to_string(&self, value: Self::Value) -> Result<String, Self::Error>;
    fn to_datetime(&self, value: Self::Value) -> Result<DateTime<Utc>, Self::Error>;

    /// Returns `true` if the value represents "no object".
    fn is_null(&self, value: Self::Value) -> bool;

    // ---- Objects ----

    /// Resolve `value` to a row of `object_type`, creating or updating the
    /// object as needed, and return the row index.
    ///
    /// `try_update` is the caller's upsert flag and must be forwarded to any
    /// nested creation.
    fn to_object_index<B: StorageBackend>(
        &self,
        realm: &mut Realm<B>,
        value: Self::Value,
        object_type: &str,
        try_update: bool,
    ) -> ObjectResult<RowIndex>;

    // ---- Arrays ----

    fn array_size(&self, value: Self::Value) -> Result<usize, Self::Error>;
    fn array_value_at_index(&self, value: Self::Value, index: usize)
        -> Result<Self::Value, Self::Error>;
}
