use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::error::SchemaError;
use crate::property::{Property, PropertyType};

/// Metadata for one object type: its ordered properties and optional
/// primary key.
///
/// Built once and shared read-only (behind `Arc`) by every object of the type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ObjectSchema {
    pub name: String,
    pub properties: Vec<Property>,
    /// Name of the primary-key property, if the type declares one.
    pub primary_key: Option<String>,
}

impl ObjectSchema {
    /// Validate the property list and resolve column indices.
    ///
    /// Each property's column index is its declaration position. The primary
    /// key must name an `int` or `string` property.
    pub fn new(
        name: impl Into<String>,
        properties: Vec<Property>,
        primary_key: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut seen = HashSet::new();
        let mut properties = properties;

        for (column, prop) in properties.iter_mut().enumerate() {
            if !seen.insert(prop.name.clone()) {
                return Err(SchemaError::DuplicateProperty {
                    object_type: name.clone(),
                    property: prop.name.clone(),
                });
            }
            match (prop.property_type.is_link(), prop.object_type.as_deref()) {
                (true, None) | (true, Some("")) => {
                    return Err(SchemaError::MissingObjectType {
                        object_type: name.clone(),
                        property: prop.name.clone(),
                    });
                }
                (false, Some(_)) => {
                    return Err(SchemaError::UnexpectedObjectType {
                        object_type: name.clone(),
                        property: prop.name.clone(),
                    });
                }
                _ => {}
            }
            prop.table_column = column;
            prop.is_primary = primary_key == Some(prop.name.as_str());
        }

        if let Some(pk) = primary_key {
            let prop = properties
                .iter()
                .find(|p| p.name == pk)
                .ok_or_else(|| SchemaError::MissingPrimaryKey {
                    object_type: name.clone(),
                    property: pk.to_string(),
                })?;
            if !prop.property_type.can_be_primary() {
                return Err(SchemaError::InvalidPrimaryKeyType {
                    object_type: name.clone(),
                    property: pk.to_string(),
                    property_type: prop.property_type,
                });
            }
        }

        Ok(Self {
            name,
            properties,
            primary_key: primary_key.map(str::to_string),
        })
    }

    /// Look up a property by name.
    pub fn property_for_name(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The primary-key property, if one is declared.
    pub fn primary_key_property(&self) -> Option<&Property> {
        self.properties.iter().find(|p| p.is_primary)
    }
}

/// The set of object types a realm is opened with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    object_schemas: Vec<Arc<ObjectSchema>>,
}

impl Schema {
    /// Build a schema, checking that type names are unique and that every
    /// link property targets a type in the same schema.
    pub fn new(object_schemas: Vec<ObjectSchema>) -> Result<Self, SchemaError> {
        let mut names = HashSet::new();
        for os in &object_schemas {
            if !names.insert(os.name.as_str()) {
                return Err(SchemaError::DuplicateObjectType(os.name.clone()));
            }
        }

        for os in &object_schemas {
            for prop in os.properties.iter().filter(|p| p.property_type.is_link()) {
                let target = prop.target_type();
                if !names.contains(target) {
                    return Err(SchemaError::UnknownLinkTarget {
                        object_type: os.name.clone(),
                        property: prop.name.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            object_schemas: object_schemas.into_iter().map(Arc::new).collect(),
        })
    }

    /// Shared metadata for `name`, if the type exists.
    pub fn object_schema(&self, name: &str) -> Option<&Arc<ObjectSchema>> {
        self.object_schemas.iter().find(|os| os.name == name)
    }

    /// Iterate over object types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ObjectSchema>> {
        self.object_schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.object_schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_schemas.is_empty()
    }
}

/// Count of properties of a given type, used by diagnostics.
pub fn count_of_type(schema: &ObjectSchema, property_type: PropertyType) -> usize {
    schema
        .properties
        .iter()
        .filter(|p| p.property_type == property_type)
        .count()
}
