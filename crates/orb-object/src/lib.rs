//! Object materialization for the object record bridge.
//!
//! Turns dynamic host values (dictionaries and arrays) into typed, persisted
//! objects. The logic is written once against the [`ValueAccessor`] trait;
//! each front-end supplies its own accessor. [`JsonAccessor`] is the
//! front-end for `serde_json` values.
//!
//! # Entry points
//!
//! - [`Object::create`] -- locate-or-create a row, then write every property
//! - [`Object::set_property_value`] -- convert and write a single property
//! - [`Realm`] -- a storage backend opened with a [`Schema`](orb_types::Schema)
//!
//! # Transactions and partial failure
//!
//! Every write happens inside a write transaction the caller opened with
//! [`Realm::begin_transaction`]. A failed creation leaves whatever it wrote
//! so far in place; the caller undoes it with [`Realm::cancel_transaction`].
//!
//! Nested objects are created recursively with no depth limit. Values whose
//! object graph contains a cycle recurse without bound, so accessors for
//! hosts that can express cycles must reject them before calling in.

pub mod accessor;
pub mod error;
pub mod json;
pub mod object;
pub mod realm;

pub use accessor::ValueAccessor;
pub use error::{ConversionSource, ObjectError, ObjectResult};
pub use json::{JsonAccessor, JsonDefaults, JsonError};
pub use object::Object;
pub use realm::{PrimaryKey, Realm};

// Re-export key types
pub use orb_store::{ColumnValue, InMemoryBackend, StorageBackend};
pub use orb_types::{ObjectSchema, Property, PropertyType, RowIndex, Schema};
