//! TOML schema files.
//!
//! ```toml
//! [[object]]
//! name = "Person"
//! primary_key = "id"
//!
//! [[object.property]]
//! name = "id"
//! type = "int"
//! ```

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use orb_object::JsonDefaults;
use orb_types::{ObjectSchema, Property, PropertyType, Schema};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    object: Vec<ObjectEntry>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
    primary_key: Option<String>,
    #[serde(default)]
    property: Vec<PropertyEntry>,
}

#[derive(Debug, Deserialize)]
struct PropertyEntry {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    object_type: Option<String>,
    default: Option<toml::Value>,
}

/// A validated schema plus the defaults declared alongside it.
#[derive(Debug)]
pub struct LoadedSchema {
    pub schema: Schema,
    pub defaults: JsonDefaults,
}

pub fn load_schema(path: &Path) -> anyhow::Result<LoadedSchema> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading schema {}", path.display()))?;
    parse_schema(&text).with_context(|| format!("loading schema {}", path.display()))
}

pub fn parse_schema(text: &str) -> anyhow::Result<LoadedSchema> {
    let file: SchemaFile = toml::from_str(text)?;
    let mut defaults = JsonDefaults::new();
    let mut object_schemas = Vec::with_capacity(file.object.len());

    for entry in file.object {
        let mut properties = Vec::with_capacity(entry.property.len());
        for prop in entry.property {
            let property_type = PropertyType::from_name(&prop.type_name).ok_or_else(|| {
                anyhow!(
                    "{}.{}: unknown property type '{}'",
                    entry.name,
                    prop.name,
                    prop.type_name
                )
            })?;
            if let Some(value) = prop.default {
                defaults.insert(entry.name.clone(), prop.name.clone(), toml_to_json(value)?);
            }
            properties.push(Property {
                object_type: prop.object_type,
                ..Property::new(prop.name, property_type)
            });
        }
        object_schemas.push(ObjectSchema::new(
            entry.name,
            properties,
            entry.primary_key.as_deref(),
        )?);
    }

    let schema = Schema::new(object_schemas)?;
    debug!(
        object_types = schema.len(),
        defaults = defaults.len(),
        "schema parsed"
    );
    Ok(LoadedSchema { schema, defaults })
}

/// Convert a TOML default into the JSON value the accessor consumes.
/// Datetimes become RFC 3339 strings.
fn toml_to_json(value: toml::Value) -> anyhow::Result<serde_json::Value> {
    use serde_json::Value as Json;
    Ok(match value {
        toml::Value::String(s) => Json::String(s),
        toml::Value::Integer(i) => Json::from(i),
        toml::Value::Float(f) => match serde_json::Number::from_f64(f) {
            Some(n) => Json::Number(n),
            None => bail!("default {f} is not a finite number"),
        },
        toml::Value::Boolean(b) => Json::Bool(b),
        toml::Value::Datetime(dt) => Json::String(datetime_to_rfc3339(&dt)?),
        toml::Value::Array(items) => Json::Array(
            items
                .into_iter()
                .map(toml_to_json)
                .collect::<anyhow::Result<_>>()?,
        ),
        toml::Value::Table(table) => Json::Object(
            table
                .into_iter()
                .map(|(k, v)| Ok((k, toml_to_json(v)?)))
                .collect::<anyhow::Result<_>>()?,
        ),
    })
}

/// Local datetimes and bare dates are read as UTC, dates at midnight.
fn datetime_to_rfc3339(dt: &toml::value::Datetime) -> anyhow::Result<String> {
    match (&dt.date, &dt.time, &dt.offset) {
        (Some(_), Some(_), Some(_)) => Ok(dt.to_string()),
        (Some(date), Some(time), None) => Ok(format!("{date}T{time}Z")),
        (Some(date), None, _) => Ok(format!("{date}T00:00:00Z")),
        (None, _, _) => bail!("time-only default {dt} has no date"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orb_types::SchemaError;
    use serde_json::json;

    const PEOPLE: &str = r#"
[[object]]
name = "Person"
primary_key = "id"

[[object.property]]
name = "id"
type = "int"

[[object.property]]
name = "nickname"
type = "string"
default = ""

[[object.property]]
name = "dogs"
type = "list"
object_type = "Dog"

[[object]]
name = "Dog"

[[object.property]]
name = "name"
type = "string"

[[object.property]]
name = "born"
type = "date"
default = 2020-01-02T03:04:05Z
"#;

    // ----------------------------------------------------------------
    // Parsing
    // ----------------------------------------------------------------

    #[test]
    fn parses_objects_and_properties() {
        let loaded = parse_schema(PEOPLE).unwrap();
        assert_eq!(loaded.schema.len(), 2);

        let person = loaded.schema.object_schema("Person").unwrap();
        assert_eq!(person.primary_key.as_deref(), Some("id"));
        let dogs = person.property_for_name("dogs").unwrap();
        assert_eq!(dogs.property_type, PropertyType::Array);
        assert_eq!(dogs.target_type(), "Dog");
        assert_eq!(dogs.table_column, 2);
    }

    #[test]
    fn defaults_become_json() {
        let loaded = parse_schema(PEOPLE).unwrap();
        assert_eq!(loaded.defaults.len(), 2);
        assert_eq!(loaded.defaults.get("Person", "nickname"), Some(&json!("")));
        assert_eq!(
            loaded.defaults.get("Dog", "born"),
            Some(&json!("2020-01-02T03:04:05Z"))
        );
    }

    #[test]
    fn dates_without_offset_default_to_utc() {
        use orb_object::ValueAccessor;

        let loaded = parse_schema(
            r#"
[[object]]
name = "Event"

[[object.property]]
name = "day"
type = "date"
default = 1979-05-27

[[object.property]]
name = "at"
type = "date"
default = 1979-05-27T07:32:00
"#,
        )
        .unwrap();
        let day = loaded.defaults.get("Event", "day").unwrap();
        let at = loaded.defaults.get("Event", "at").unwrap();
        assert_eq!(day, &json!("1979-05-27T00:00:00Z"));
        assert_eq!(at, &json!("1979-05-27T07:32:00Z"));

        let accessor = orb_object::JsonAccessor::new();
        assert!(accessor.to_datetime(day).is_ok());
        assert!(accessor.to_datetime(at).is_ok());
    }

    #[test]
    fn time_only_default_is_rejected() {
        let err = parse_schema(
            "[[object]]\nname = \"A\"\n[[object.property]]\nname = \"t\"\ntype = \"date\"\ndefault = 07:32:00\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("no date"));
    }

    #[test]
    fn empty_file_is_empty_schema() {
        let loaded = parse_schema("").unwrap();
        assert!(loaded.schema.is_empty());
        assert!(loaded.defaults.is_empty());
    }

    // ----------------------------------------------------------------
    // Errors
    // ----------------------------------------------------------------

    #[test]
    fn unknown_type_name() {
        let err = parse_schema(
            "[[object]]\nname = \"A\"\n[[object.property]]\nname = \"x\"\ntype = \"decimal\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("decimal"));
    }

    #[test]
    fn unknown_link_target() {
        let err = parse_schema(
            "[[object]]\nname = \"A\"\n[[object.property]]\nname = \"b\"\ntype = \"object\"\nobject_type = \"B\"\n",
        )
        .unwrap_err();
        assert!(err.downcast_ref::<SchemaError>().is_some());
    }

    #[test]
    fn bad_primary_key_type() {
        let err = parse_schema(
            "[[object]]\nname = \"A\"\nprimary_key = \"x\"\n[[object.property]]\nname = \"x\"\ntype = \"double\"\n",
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::InvalidPrimaryKeyType { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.toml");
        std::fs::write(&path, PEOPLE).unwrap();
        let loaded = load_schema(&path).unwrap();
        assert!(loaded.schema.object_schema("Dog").is_some());
    }
}
