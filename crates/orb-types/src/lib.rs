//! Schema metadata for the object record bridge.
//!
//! This crate describes *what* can be stored: object types, their ordered
//! properties, primary keys and link targets. Every other orb crate depends
//! on `orb-types`.
//!
//! # Key Types
//!
//! - [`PropertyType`] -- closed set of storable property types
//! - [`Property`] -- one declared property with its resolved column
//! - [`ObjectSchema`] -- ordered properties plus optional primary key
//! - [`Schema`] -- all object types, shared as `Arc<ObjectSchema>`
//! - [`RowIndex`] -- position of a persisted row within its table

pub mod error;
pub mod property;
pub mod row;
pub mod schema;

pub use error::SchemaError;
pub use property::{Property, PropertyType};
pub use row::RowIndex;
pub use schema::{count_of_type, ObjectSchema, Schema};
