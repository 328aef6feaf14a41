use std::fmt;
use std::sync::Arc;

use orb_store::{ColumnType, StorageBackend, TableKey};
use orb_types::{ObjectSchema, Property, PropertyType, RowIndex, Schema};
use tracing::{debug, info};

use crate::error::{ObjectError, ObjectResult};
use crate::object::Object;

/// A storage backend paired with the schema it was opened with.
///
/// The realm never opens or commits transactions on its own. Callers bracket
/// object creation with [`begin_transaction`](Self::begin_transaction) and
/// either [`commit_transaction`](Self::commit_transaction) or
/// [`cancel_transaction`](Self::cancel_transaction); cancelling is the only
/// way to undo a partially populated object.
pub struct Realm<B> {
    backend: B,
    schema: Arc<Schema>,
}

/// Value of a primary-key property.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimaryKey {
    Int(i64),
    String(String),
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<i64> for PrimaryKey {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for PrimaryKey {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<B: StorageBackend> Realm<B> {
    /// Open a realm, creating a table for every object type that does not
    /// have one yet.
    ///
    /// Tables that already exist must have exactly the columns the schema
    /// implies.
    pub fn open(mut backend: B, schema: impl Into<Arc<Schema>>) -> ObjectResult<Self> {
        let schema = schema.into();

        let mut created = Vec::new();
        for object_schema in schema.iter() {
            if !backend.has_table(&object_schema.name) {
                let table = backend.create_table(&object_schema.name, &[])?;
                created.push((table, Arc::clone(object_schema)));
            }
        }

        for (table, object_schema) in &created {
            for prop in &object_schema.properties {
                let column_type = column_type_for(&backend, prop)?;
                backend.add_column(*table, column_type)?;
            }
        }

        for object_schema in schema.iter() {
            verify_columns(&backend, object_schema)?;
        }

        info!(
            object_types = schema.len(),
            created_tables = created.len(),
            "realm opened"
        );
        Ok(Self { backend, schema })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Shared metadata for `object_type`.
    pub fn object_schema(&self, object_type: &str) -> ObjectResult<Arc<ObjectSchema>> {
        self.schema
            .object_schema(object_type)
            .cloned()
            .ok_or_else(|| ObjectError::UnknownObjectType(object_type.to_string()))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Close the realm and hand back the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    // ---- Transactions ----

    pub fn is_in_transaction(&self) -> bool {
        self.backend.is_in_write_transaction()
    }

    pub fn begin_transaction(&mut self) -> ObjectResult<()> {
        self.backend.begin_write()?;
        Ok(())
    }

    pub fn commit_transaction(&mut self) -> ObjectResult<()> {
        self.backend.commit()?;
        Ok(())
    }

    /// Discard everything written since `begin_transaction`, including
    /// partially created objects.
    pub fn cancel_transaction(&mut self) -> ObjectResult<()> {
        self.backend.rollback()?;
        debug!("transaction cancelled");
        Ok(())
    }

    // ---- Objects ----

    pub fn table_for_object_type(&self, object_type: &str) -> ObjectResult<TableKey> {
        Ok(self.backend.table_for_object_type(object_type)?)
    }

    /// Number of stored objects of `object_type`.
    pub fn object_count(&self, object_type: &str) -> ObjectResult<usize> {
        let table = self.table_for_object_type(object_type)?;
        Ok(self.backend.row_count(table)?)
    }

    /// Handle to an existing row.
    pub fn object(&mut self, object_type: &str, row: RowIndex) -> ObjectResult<Object<'_, B>> {
        let object_schema = self.object_schema(object_type)?;
        let table = self.table_for_object_type(object_type)?;
        let len = self.backend.row_count(table)?;
        if row.get() >= len {
            return Err(orb_store::StoreError::RowOutOfRange { table, row, len }.into());
        }
        Ok(Object::from_parts(self, object_schema, table, row))
    }

    /// Row holding the object whose primary key equals `key`.
    pub fn find_by_primary_key(
        &self,
        object_type: &str,
        key: impl Into<PrimaryKey>,
    ) -> ObjectResult<Option<RowIndex>> {
        let object_schema = self.object_schema(object_type)?;
        let primary = object_schema
            .primary_key_property()
            .ok_or_else(|| ObjectError::NoPrimaryKey(object_type.to_string()))?;
        let table = self.table_for_object_type(object_type)?;
        let found = match key.into() {
            PrimaryKey::Int(v) => self.backend.find_first_int(table, primary.table_column, v)?,
            PrimaryKey::String(s) => {
                self.backend
                    .find_first_string(table, primary.table_column, &s)?
            }
        };
        Ok(found)
    }
}

impl<B> fmt::Debug for Realm<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("object_types", &self.schema.len())
            .finish()
    }
}

fn column_type_for<B: StorageBackend>(backend: &B, prop: &Property) -> ObjectResult<ColumnType> {
    Ok(match prop.property_type {
        PropertyType::Bool => ColumnType::Bool,
        PropertyType::Int => ColumnType::Int,
        PropertyType::Float => ColumnType::Float,
        PropertyType::Double => ColumnType::Double,
        PropertyType::String => ColumnType::String,
        PropertyType::Data => ColumnType::Binary,
        PropertyType::Any => ColumnType::Mixed,
        PropertyType::Date => ColumnType::Date,
        PropertyType::Object => {
            ColumnType::Link(backend.table_for_object_type(prop.target_type())?)
        }
        PropertyType::Array => {
            ColumnType::LinkList(backend.table_for_object_type(prop.target_type())?)
        }
    })
}

fn verify_columns<B: StorageBackend>(backend: &B, object_schema: &ObjectSchema) -> ObjectResult<()> {
    let table = backend.table_for_object_type(&object_schema.name)?;
    for prop in &object_schema.properties {
        let expected = column_type_for(backend, prop)?;
        match backend.column_type(table, prop.table_column) {
            Ok(actual) if actual == expected => {}
            _ => {
                return Err(ObjectError::SchemaMismatch {
                    object_type: object_schema.name.clone(),
                    property: prop.name.clone(),
                })
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orb_store::{ColumnValue, InMemoryBackend};

    fn schema() -> Schema {
        Schema::new(vec![
            ObjectSchema::new(
                "Person",
                vec![
                    Property::new("name", PropertyType::String),
                    Property::object("best_friend", "Dog"),
                    Property::array("dogs", "Dog"),
                ],
                Some("name"),
            )
            .unwrap(),
            ObjectSchema::new("Dog", vec![Property::new("age", PropertyType::Int)], None).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn open_creates_tables_with_link_columns() {
        let realm = Realm::open(InMemoryBackend::new(), schema()).unwrap();
        let people = realm.table_for_object_type("Person").unwrap();
        let dogs = realm.table_for_object_type("Dog").unwrap();
        let backend = realm.backend();
        assert_eq!(backend.column_type(people, 0).unwrap(), ColumnType::String);
        assert_eq!(backend.column_type(people, 1).unwrap(), ColumnType::Link(dogs));
        assert_eq!(backend.column_type(people, 2).unwrap(), ColumnType::LinkList(dogs));
        assert_eq!(backend.column_type(dogs, 0).unwrap(), ColumnType::Int);
    }

    #[test]
    fn reopen_reuses_existing_tables() {
        let mut realm = Realm::open(InMemoryBackend::new(), schema()).unwrap();
        realm.begin_transaction().unwrap();
        let dogs = realm.table_for_object_type("Dog").unwrap();
        realm.backend_mut().add_empty_row(dogs).unwrap();
        realm.commit_transaction().unwrap();

        let realm = Realm::open(realm.into_backend(), schema()).unwrap();
        assert_eq!(realm.object_count("Dog").unwrap(), 1);
        assert_eq!(realm.backend().table_count(), 2);
    }

    #[test]
    fn reopen_with_different_columns_fails() {
        let mut backend = InMemoryBackend::new();
        backend.create_table("Dog", &[ColumnType::String]).unwrap();
        let schema = Schema::new(vec![ObjectSchema::new(
            "Dog",
            vec![Property::new("age", PropertyType::Int)],
            None,
        )
        .unwrap()])
        .unwrap();
        let err = Realm::open(backend, schema).unwrap_err();
        assert!(matches!(err, ObjectError::SchemaMismatch { .. }));
    }

    #[test]
    fn transactions_forward_to_backend() {
        let mut realm = Realm::open(InMemoryBackend::new(), schema()).unwrap();
        assert!(!realm.is_in_transaction());
        realm.begin_transaction().unwrap();
        assert!(realm.is_in_transaction());
        let dogs = realm.table_for_object_type("Dog").unwrap();
        realm.backend_mut().add_empty_row(dogs).unwrap();
        realm.cancel_transaction().unwrap();
        assert!(!realm.is_in_transaction());
        assert_eq!(realm.object_count("Dog").unwrap(), 0);
    }

    #[test]
    fn unknown_object_type() {
        let realm = Realm::open(InMemoryBackend::new(), schema()).unwrap();
        assert!(matches!(
            realm.object_schema("Cat"),
            Err(ObjectError::UnknownObjectType(name)) if name == "Cat"
        ));
    }

    #[test]
    fn find_by_primary_key_requires_key() {
        let realm = Realm::open(InMemoryBackend::new(), schema()).unwrap();
        assert!(matches!(
            realm.find_by_primary_key("Dog", 1i64),
            Err(ObjectError::NoPrimaryKey(_))
        ));
        assert_eq!(realm.find_by_primary_key("Person", "ann").unwrap(), None);
    }

    #[test]
    fn object_handle_for_missing_row_fails() {
        let mut realm = Realm::open(InMemoryBackend::new(), schema()).unwrap();
        let err = realm.object("Dog", RowIndex(0)).unwrap_err();
        assert!(matches!(err, ObjectError::Store(_)));
    }

    #[test]
    fn object_handle_reads_row() {
        let mut realm = Realm::open(InMemoryBackend::new(), schema()).unwrap();
        realm.begin_transaction().unwrap();
        let dogs = realm.table_for_object_type("Dog").unwrap();
        let row = realm.backend_mut().add_empty_row(dogs).unwrap();
        realm
            .backend_mut()
            .set(dogs, row, 0, ColumnValue::Int(4))
            .unwrap();
        let dog = realm.object("Dog", row).unwrap();
        assert_eq!(dog.get_property_value("age").unwrap(), ColumnValue::Int(4));
    }

    #[test]
    fn primary_key_display() {
        assert_eq!(PrimaryKey::from(5i64).to_string(), "5");
        assert_eq!(PrimaryKey::from("ann").to_string(), "'ann'");
    }
}
