use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use orb_object::{ColumnValue, InMemoryBackend, JsonAccessor, JsonDefaults, Object, Realm};
use orb_types::{count_of_type, PropertyType, RowIndex};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::cli::*;
use crate::config::CliConfig;
use crate::schema_file::{load_schema, LoadedSchema};

pub fn run_command(cli: Cli, config: &CliConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Check(args) => cmd_check(args, cli.format),
        Command::Import(args) => cmd_import(args, cli.format, config),
    }
}

fn cmd_check(args: CheckArgs, format: OutputFormat) -> anyhow::Result<()> {
    let loaded = load_schema(&args.schema)?;

    if format == OutputFormat::Json {
        let objects: Vec<_> = loaded.schema.iter().map(|os| os.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&objects)?);
        return Ok(());
    }

    println!(
        "{} {} object type(s) in {}",
        "✓".green().bold(),
        loaded.schema.len(),
        args.schema.display().to_string().bold()
    );
    for os in loaded.schema.iter() {
        let links = count_of_type(os, PropertyType::Object) + count_of_type(os, PropertyType::Array);
        print!("  {}", os.name.yellow().bold());
        if let Some(pk) = &os.primary_key {
            print!(" (primary key: {})", pk.cyan());
        }
        println!(" {}", format!("{} properties, {links} links", os.properties.len()).dimmed());
        for prop in &os.properties {
            let target = match &prop.object_type {
                Some(t) => format!(" -> {t}"),
                None => String::new(),
            };
            let default = match loaded.defaults.get(&os.name, &prop.name) {
                Some(v) => format!(" = {v}"),
                None => String::new(),
            };
            println!("    {}: {}{}{}", prop.name, prop.property_type, target.blue(), default.dimmed());
        }
    }
    Ok(())
}

fn cmd_import(args: ImportArgs, format: OutputFormat, config: &CliConfig) -> anyhow::Result<()> {
    let LoadedSchema { schema, defaults } = load_schema(&args.schema)?;
    let data = read_data(&args.data)?;
    let update = args.update || config.update;
    let keep_partial = args.keep_partial || config.keep_partial;

    let mut realm = Realm::open(InMemoryBackend::new(), schema)?;
    realm.begin_transaction()?;
    match import_records(&mut realm, &data, &defaults, update) {
        Ok(count) => {
            realm.commit_transaction()?;
            info!(records = count, "import committed");
        }
        Err(e) => {
            if keep_partial {
                realm.commit_transaction()?;
                warn!("import failed; keeping records written before the failure");
            } else {
                realm.cancel_transaction()?;
            }
            return Err(e);
        }
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dump_json(&mut realm)?)?),
        OutputFormat::Text => print_tables(&mut realm)?,
    }
    Ok(())
}

fn read_data(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading data {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing data {}", path.display()))
}

/// Materialize every record of `data`, a JSON object mapping type names to
/// arrays of records. Stops at the first failure without touching the
/// transaction. Returns the number of records processed.
pub fn import_records(
    realm: &mut Realm<InMemoryBackend>,
    data: &Value,
    defaults: &JsonDefaults,
    update: bool,
) -> anyhow::Result<usize> {
    let Some(by_type) = data.as_object() else {
        bail!("data must be an object mapping type names to record arrays");
    };
    let accessor = JsonAccessor::with_defaults(defaults);
    let mut count = 0;
    for (object_type, records) in by_type {
        let object_schema = realm.object_schema(object_type)?;
        let Some(records) = records.as_array() else {
            bail!("records for '{object_type}' must be an array");
        };
        for (i, record) in records.iter().enumerate() {
            Object::create(&accessor, &mut *realm, Arc::clone(&object_schema), record, update)
                .with_context(|| format!("{object_type}[{i}]"))?;
            count += 1;
        }
    }
    Ok(count)
}

// ---- Output ----

/// Stored rows as `(object type, rows of (property, value))`.
type TableDump = Vec<(String, Vec<Vec<(String, ColumnValue)>>)>;

fn read_tables(realm: &mut Realm<InMemoryBackend>) -> anyhow::Result<TableDump> {
    let schema = Arc::clone(realm.schema());
    let mut tables = Vec::with_capacity(schema.len());
    for os in schema.iter() {
        let mut rows = Vec::new();
        for row in 0..realm.object_count(&os.name)? {
            let object = realm.object(&os.name, RowIndex::new(row))?;
            let cells = os
                .properties
                .iter()
                .map(|p| Ok((p.name.clone(), object.get_property_value(&p.name)?)))
                .collect::<anyhow::Result<Vec<_>>>()?;
            rows.push(cells);
        }
        tables.push((os.name.clone(), rows));
    }
    Ok(tables)
}

fn dump_json(realm: &mut Realm<InMemoryBackend>) -> anyhow::Result<Value> {
    let mut out = serde_json::Map::new();
    for (object_type, rows) in read_tables(realm)? {
        let rows: Vec<Value> = rows
            .iter()
            .map(|cells| {
                Value::Object(
                    cells
                        .iter()
                        .map(|(name, v)| (name.clone(), cell_to_json(v)))
                        .collect(),
                )
            })
            .collect();
        out.insert(object_type, Value::Array(rows));
    }
    Ok(Value::Object(out))
}

fn print_tables(realm: &mut Realm<InMemoryBackend>) -> anyhow::Result<()> {
    for (object_type, rows) in read_tables(realm)? {
        println!("{} {}", object_type.yellow().bold(), format!("({} rows)", rows.len()).dimmed());
        for (i, cells) in rows.iter().enumerate() {
            let fields: Vec<String> = cells
                .iter()
                .map(|(name, v)| format!("{}={}", name.cyan(), cell_text(v)))
                .collect();
            println!("  {} {}", RowIndex::new(i).to_string().dimmed(), fields.join(" "));
        }
    }
    Ok(())
}

fn cell_to_json(value: &ColumnValue) -> Value {
    match value {
        ColumnValue::Null => Value::Null,
        ColumnValue::Bool(b) => json!(b),
        ColumnValue::Int(i) => json!(i),
        ColumnValue::Float(f) => json!(f),
        ColumnValue::Double(d) => json!(d),
        ColumnValue::String(s) => json!(s),
        ColumnValue::Binary(bytes) => json!(hex::encode(bytes)),
        ColumnValue::Date(dt) => json!(dt.to_rfc3339()),
        ColumnValue::Link(target) => json!(target.map(|r| r.get())),
        ColumnValue::LinkList(targets) => {
            json!(targets.iter().map(|r| r.get()).collect::<Vec<_>>())
        }
    }
}

fn cell_text(value: &ColumnValue) -> String {
    match value {
        ColumnValue::Null | ColumnValue::Link(None) => "null".into(),
        ColumnValue::String(s) => format!("{s:?}"),
        ColumnValue::Binary(bytes) => format!("0x{}", hex::encode(bytes)),
        ColumnValue::Date(dt) => dt.to_rfc3339(),
        ColumnValue::Link(Some(r)) => r.to_string(),
        ColumnValue::LinkList(targets) => {
            let items: Vec<String> = targets.iter().map(ToString::to_string).collect();
            format!("[{}]", items.join(", "))
        }
        ColumnValue::Bool(b) => b.to_string(),
        ColumnValue::Int(i) => i.to_string(),
        ColumnValue::Float(f) => f.to_string(),
        ColumnValue::Double(d) => d.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_file::parse_schema;
    use orb_object::ObjectError;

    const SCHEMA: &str = r#"
[[object]]
name = "Person"
primary_key = "name"

[[object.property]]
name = "name"
type = "string"

[[object.property]]
name = "age"
type = "int"
default = 0

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
name = "tag"
type = "data"
default = ""
"#;

    fn realm() -> (Realm<InMemoryBackend>, JsonDefaults) {
        let LoadedSchema { schema, defaults } = parse_schema(SCHEMA).unwrap();
        (Realm::open(InMemoryBackend::new(), schema).unwrap(), defaults)
    }

    fn import(
        realm: &mut Realm<InMemoryBackend>,
        defaults: &JsonDefaults,
        data: Value,
        update: bool,
    ) -> anyhow::Result<usize> {
        realm.begin_transaction().unwrap();
        let result = import_records(realm, &data, defaults, update);
        if result.is_ok() {
            realm.commit_transaction().unwrap();
        } else {
            realm.cancel_transaction().unwrap();
        }
        result
    }

    // ----------------------------------------------------------------
    // import_records
    // ----------------------------------------------------------------

    #[test]
    fn imports_nested_records() {
        let (mut realm, defaults) = realm();
        let n = import(
            &mut realm,
            &defaults,
            json!({"Person": [{"name": "ann", "dogs": [{"name": "rex"}, {"name": "fido"}]}]}),
            false,
        )
        .unwrap();
        assert_eq!(n, 1);
        assert_eq!(realm.object_count("Person").unwrap(), 1);
        assert_eq!(realm.object_count("Dog").unwrap(), 2);

        let dump = dump_json(&mut realm).unwrap();
        assert_eq!(dump["Person"][0]["age"], json!(0));
        assert_eq!(dump["Person"][0]["dogs"], json!([0, 1]));
        assert_eq!(dump["Dog"][1]["name"], json!("fido"));
        assert_eq!(dump["Dog"][0]["tag"], json!(""));
    }

    #[test]
    fn duplicate_key_cancels_everything() {
        let (mut realm, defaults) = realm();
        let err = import(
            &mut realm,
            &defaults,
            json!({"Person": [{"name": "ann"}, {"name": "ann"}]}),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ObjectError>(),
            Some(ObjectError::DuplicateKey { .. })
        ));
        assert!(err.to_string().contains("Person[1]"));
        assert_eq!(realm.object_count("Person").unwrap(), 0);
    }

    #[test]
    fn update_flag_upserts() {
        let (mut realm, defaults) = realm();
        import(
            &mut realm,
            &defaults,
            json!({"Person": [{"name": "ann", "age": 3}, {"name": "ann", "age": 4}]}),
            true,
        )
        .unwrap();
        assert_eq!(realm.object_count("Person").unwrap(), 1);
        assert_eq!(dump_json(&mut realm).unwrap()["Person"][0]["age"], json!(4));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let (mut realm, defaults) = realm();
        let err = import(&mut realm, &defaults, json!({"Cat": []}), false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ObjectError>(),
            Some(ObjectError::UnknownObjectType(_))
        ));
    }

    #[test]
    fn data_must_be_object_of_arrays() {
        let (mut realm, defaults) = realm();
        assert!(import(&mut realm, &defaults, json!([]), false).is_err());
        assert!(import(&mut realm, &defaults, json!({"Person": {}}), false).is_err());
    }

    #[test]
    fn partial_failure_can_be_committed() {
        let (mut realm, defaults) = realm();
        realm.begin_transaction().unwrap();
        let data = json!({"Person": [{"name": "ann"}, {"age": 3}]});
        assert!(import_records(&mut realm, &data, &defaults, false).is_err());
        realm.commit_transaction().unwrap();
        assert_eq!(realm.object_count("Person").unwrap(), 1);
    }

    // ----------------------------------------------------------------
    // Output
    // ----------------------------------------------------------------

    #[test]
    fn cell_rendering() {
        assert_eq!(cell_to_json(&ColumnValue::Binary(vec![0xab, 0x01])), json!("ab01"));
        assert_eq!(cell_to_json(&ColumnValue::Link(None)), Value::Null);
        assert_eq!(cell_text(&ColumnValue::Link(Some(RowIndex(2)))), "#2");
        assert_eq!(
            cell_text(&ColumnValue::LinkList(vec![RowIndex(0), RowIndex(3)])),
            "[#0, #3]"
        );
        assert_eq!(cell_text(&ColumnValue::String("a".into())), "\"a\"");
    }
}
