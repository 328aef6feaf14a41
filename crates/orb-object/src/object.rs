use std::sync::Arc;

use orb_store::{ColumnValue, StorageBackend, TableKey};
use orb_types::{ObjectSchema, Property, PropertyType, RowIndex};
use tracing::{debug, trace};

use crate::accessor::ValueAccessor;
use crate::error::{ObjectError, ObjectResult};
use crate::realm::{PrimaryKey, Realm};

/// Handle to one persisted object.
///
/// The handle borrows the realm and shares the type's schema; it does not own
/// the row, whose lifetime belongs to the backend and the enclosing
/// transaction.
pub struct Object<'r, B: StorageBackend> {
    realm: &'r mut Realm<B>,
    object_schema: Arc<ObjectSchema>,
    table: TableKey,
    row: RowIndex,
}

impl<'r, B: StorageBackend> Object<'r, B> {
    pub(crate) fn from_parts(
        realm: &'r mut Realm<B>,
        object_schema: Arc<ObjectSchema>,
        table: TableKey,
        row: RowIndex,
    ) -> Self {
        Self {
            realm,
            object_schema,
            table,
            row,
        }
    }

    pub fn row(&self) -> RowIndex {
        self.row
    }

    pub fn object_schema(&self) -> &Arc<ObjectSchema> {
        &self.object_schema
    }

    pub fn realm(&self) -> &Realm<B> {
        &*self.realm
    }

    /// Create an object of `object_schema`'s type from a host value, or update
    /// the existing one with the same primary key when `try_update` is set.
    ///
    /// Must run inside a write transaction. On a new row every property must
    /// be supplied or have a default. On the update path the primary key is
    /// left alone and omitted properties keep their stored values.
    ///
    /// A failure stops at the offending property. Properties written before
    /// it stay written, and a newly allocated row stays allocated; callers
    /// that need all-or-nothing behaviour cancel the transaction.
    pub fn create<'v, A>(
        accessor: &A,
        realm: &'r mut Realm<B>,
        object_schema: Arc<ObjectSchema>,
        value: A::Value,
        try_update: bool,
    ) -> ObjectResult<Self>
    where
        A: ValueAccessor<'v>,
    {
        if !realm.is_in_transaction() {
            return Err(ObjectError::TransactionState);
        }

        let table = realm.table_for_object_type(&object_schema.name)?;

        // try to get existing row if updating
        let mut existing = None;
        let mut primary_key = None;
        if let Some(primary) = object_schema.primary_key_property() {
            let key = primary_key_value(accessor, &object_schema, primary, value)?;
            let backend = realm.backend();
            existing = match &key {
                PrimaryKey::String(s) => backend.find_first_string(table, primary.table_column, s)?,
                PrimaryKey::Int(v) => backend.find_first_int(table, primary.table_column, *v)?,
            };
            if existing.is_some() && !try_update {
                return Err(ObjectError::DuplicateKey {
                    object_type: object_schema.name.clone(),
                    key: key.to_string(),
                });
            }
            primary_key = Some((primary.table_column, key));
        }

        let (row, created) = match existing {
            Some(row) => (row, false),
            None => (realm.backend_mut().add_empty_row(table)?, true),
        };

        // The key goes in before any link is resolved, so nested creates of
        // the same type never match this row by its default key.
        if created {
            if let Some((column, key)) = primary_key {
                let cell = match key {
                    PrimaryKey::Int(v) => ColumnValue::Int(v),
                    PrimaryKey::String(s) => ColumnValue::String(s),
                };
                realm.backend_mut().set(table, row, column, cell)?;
            }
        }
        debug!(
            object_type = %object_schema.name,
            row = %row,
            created,
            "materializing object"
        );

        let mut object = Object::from_parts(realm, Arc::clone(&object_schema), table, row);
        for prop in &object_schema.properties {
            if prop.is_primary {
                continue;
            }
            if accessor.dict_has_value_for_key(value, &prop.name) {
                let prop_value = accessor
                    .dict_value_for_key(value, &prop.name)
                    .map_err(|e| ObjectError::conversion(&object_schema.name, &prop.name, e))?;
                object.set_property_value_impl(accessor, prop, prop_value, try_update)?;
            } else if created {
                if !accessor.has_default_value_for_property(&object_schema, &prop.name) {
                    return Err(ObjectError::MissingValue {
                        object_type: object_schema.name.clone(),
                        property: prop.name.clone(),
                    });
                }
                let default = accessor
                    .default_value_for_property(&object_schema, &prop.name)
                    .map_err(|e| ObjectError::conversion(&object_schema.name, &prop.name, e))?;
                object.set_property_value_impl(accessor, prop, default, try_update)?;
            }
        }
        Ok(object)
    }

    /// Convert `value` and write it to the property named `prop_name`.
    ///
    /// Usable outside of [`create`](Self::create) for direct mutation; it
    /// requires a write transaction all the same.
    pub fn set_property_value<'v, A>(
        &mut self,
        accessor: &A,
        prop_name: &str,
        value: A::Value,
        try_update: bool,
    ) -> ObjectResult<()>
    where
        A: ValueAccessor<'v>,
    {
        let object_schema = Arc::clone(&self.object_schema);
        let prop = object_schema
            .property_for_name(prop_name)
            .ok_or_else(|| ObjectError::UnknownProperty {
                object_type: object_schema.name.clone(),
                property: prop_name.to_string(),
            })?;
        if !self.realm.is_in_transaction() {
            return Err(ObjectError::TransactionState);
        }
        self.set_property_value_impl(accessor, prop, value, try_update)
    }

    /// Read the stored value of the property named `prop_name`.
    pub fn get_property_value(&self, prop_name: &str) -> ObjectResult<ColumnValue> {
        let prop = self
            .object_schema
            .property_for_name(prop_name)
            .ok_or_else(|| ObjectError::UnknownProperty {
                object_type: self.object_schema.name.clone(),
                property: prop_name.to_string(),
            })?;
        Ok(self
            .realm
            .backend()
            .get(self.table, self.row, prop.table_column)?)
    }

    fn set_property_value_impl<'v, A>(
        &mut self,
        accessor: &A,
        prop: &Property,
        value: A::Value,
        try_update: bool,
    ) -> ObjectResult<()>
    where
        A: ValueAccessor<'v>,
    {
        let object_schema = Arc::clone(&self.object_schema);
        let conv = |e: A::Error| ObjectError::conversion(&object_schema.name, &prop.name, e);
        let (table, row, column) = (self.table, self.row, prop.table_column);
        trace!(property = %prop.name, property_type = %prop.property_type, row = %row, "set property");

        match prop.property_type {
            PropertyType::Bool => {
                let v = accessor.to_bool(value).map_err(conv)?;
                self.write(column, ColumnValue::Bool(v))
            }
            PropertyType::Int => {
                let v = accessor.to_long(value).map_err(conv)?;
                self.write(column, ColumnValue::Int(v))
            }
            PropertyType::Float => {
                let v = accessor.to_float(value).map_err(conv)?;
                self.write(column, ColumnValue::Float(v))
            }
            PropertyType::Double => {
                let v = accessor.to_double(value).map_err(conv)?;
                self.write(column, ColumnValue::Double(v))
            }
            PropertyType::String => {
                let v = accessor.to_string(value).map_err(conv)?;
                self.write(column, ColumnValue::String(v))
            }
            PropertyType::Data => {
                let v = accessor.to_string(value).map_err(conv)?;
                self.write(column, ColumnValue::Binary(v.into_bytes()))
            }
            PropertyType::Any => Err(ObjectError::UnsupportedType {
                object_type: object_schema.name.clone(),
                property: prop.name.clone(),
            }),
            PropertyType::Date => {
                let v = accessor.to_datetime(value).map_err(conv)?;
                self.write(column, ColumnValue::Date(v))
            }
            PropertyType::Object => {
                if accessor.is_null(value) {
                    self.realm.backend_mut().nullify_link(table, row, column)?;
                } else {
                    let target = accessor.to_object_index(
                        &mut *self.realm,
                        value,
                        prop.target_type(),
                        try_update,
                    )?;
                    self.realm
                        .backend_mut()
                        .set_link(table, row, column, target)?;
                }
                Ok(())
            }
            PropertyType::Array => {
                self.realm.backend_mut().link_list_clear(table, row, column)?;
                let count = accessor.array_size(value).map_err(conv)?;
                for i in 0..count {
                    let element = accessor.array_value_at_index(value, i).map_err(conv)?;
                    let target = accessor.to_object_index(
                        &mut *self.realm,
                        element,
                        prop.target_type(),
                        try_update,
                    )?;
                    self.realm
                        .backend_mut()
                        .link_list_add(table, row, column, target)?;
                }
                Ok(())
            }
        }
    }

    fn write(&mut self, column: usize, value: ColumnValue) -> ObjectResult<()> {
        self.realm
            .backend_mut()
            .set(self.table, self.row, column, value)?;
        Ok(())
    }
}

impl<B: StorageBackend> std::fmt::Debug for Object<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("object_type", &self.object_schema.name)
            .field("row", &self.row)
            .finish()
    }
}

/// Extract and convert the primary key from `value`, falling back to the
/// registered default.
fn primary_key_value<'v, A>(
    accessor: &A,
    object_schema: &ObjectSchema,
    primary: &Property,
    value: A::Value,
) -> ObjectResult<PrimaryKey>
where
    A: ValueAccessor<'v>,
{
    let conv = |e: A::Error| ObjectError::conversion(&object_schema.name, &primary.name, e);
    let raw = if accessor.dict_has_value_for_key(value, &primary.name) {
        accessor.dict_value_for_key(value, &primary.name).map_err(conv)?
    } else if accessor.has_default_value_for_property(object_schema, &primary.name) {
        accessor
            .default_value_for_property(object_schema, &primary.name)
            .map_err(conv)?
    } else {
        return Err(ObjectError::MissingValue {
            object_type: object_schema.name.clone(),
            property: primary.name.clone(),
        });
    };

    match primary.property_type {
        PropertyType::String => Ok(PrimaryKey::String(accessor.to_string(raw).map_err(conv)?)),
        _ => Ok(PrimaryKey::Int(accessor.to_long(raw).map_err(conv)?)),
    }
}
