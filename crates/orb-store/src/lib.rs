//! Table storage for the object record bridge.
//!
//! This crate is the persistence layer underneath object materialization: a
//! set of typed tables, one per object type, whose rows are addressed by
//! [`RowIndex`](orb_types::RowIndex). Columns hold scalars, byte blobs, dates,
//! single links, or ordered link lists.
//!
//! # Storage Backends
//!
//! All backends implement the [`StorageBackend`] trait:
//!
//! - [`InMemoryBackend`] -- `Vec`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. All mutation happens inside a write transaction owned by the caller.
//! 2. Rows are append-only; a row index never moves.
//! 3. New rows start with column type defaults.
//! 4. Cell writes are type-checked against the column.
//! 5. Links must point at an existing row of the target table.
//! 6. Rollback restores the state seen at `begin_write`.

pub mod column;
pub mod error;
pub mod memory;
pub mod traits;

pub use column::{ColumnType, ColumnValue, TableKey};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryBackend;
pub use traits::StorageBackend;
