use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::core::coerce::parse_date;
use crate::core::{DataType, EntityKind, EntityStore, GymError, GymResult, Row, Value};

/// Loads the ETL snapshot directory into a fresh [`EntityStore`].
///
/// One JSON file per entity (`students.json`, `classes.json`, ...), each an
/// array of objects keyed by the legacy field names, case-preserved. A
/// missing file loads as an empty table; an unreadable or malformed file is
/// fatal.
pub fn load_snapshot<P: AsRef<Path>>(dir: P) -> GymResult<EntityStore> {
    let dir = dir.as_ref();
    let mut store = EntityStore::new();

    for kind in EntityKind::ALL {
        let path = dir.join(format!("{}.json", kind.table_name()));
        if !path.exists() {
            debug!(entity = kind.table_name(), "snapshot file absent, table left empty");
            continue;
        }
        let text = fs::read_to_string(&path).map_err(|e| {
            GymError::data_load(format!("cannot read {}: {e}", path.display()))
        })?;
        let objects: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(&text)?;
        load_entity(&mut store, kind, &objects)?;
    }

    Ok(store)
}

fn load_entity(
    store: &mut EntityStore,
    kind: EntityKind,
    objects: &[serde_json::Map<String, serde_json::Value>],
) -> GymResult<()> {
    let table = store.table_mut(kind)?;
    let columns = table.columns.clone();
    let mut dropped = 0usize;

    for object in objects {
        // Required columns must be present in the snapshot row.
        for column in &columns {
            if column.required && !object.contains_key(&column.name) {
                return Err(GymError::MissingColumn {
                    entity: kind.table_name().to_string(),
                    column: column.name.clone(),
                });
            }
        }

        let mut values = Vec::with_capacity(columns.len());
        for column in &columns {
            let raw = object.get(&column.name);
            values.push(typed_from_json(kind, &column.name, raw, &column.data_type)?);
        }
        let row = Row::new(values);

        // Students with neither name are conversion debris; drop them.
        if kind == EntityKind::Student {
            let fname = table.require_column("FNAME")?;
            let lname = table.require_column("LNAME")?;
            if row.get(fname).is_null() && row.get(lname).is_null() {
                dropped += 1;
                continue;
            }
        }
        table.insert(row)?;
    }

    if dropped > 0 {
        warn!(entity = kind.table_name(), dropped, "dropped nameless rows at load");
    }
    Ok(())
}

/// Types one snapshot cell. Empty strings become `Null` (or zero for
/// numeric columns); a date that fails the lenient parse is fatal.
fn typed_from_json(
    kind: EntityKind,
    column: &str,
    raw: Option<&serde_json::Value>,
    data_type: &DataType,
) -> GymResult<Value> {
    let raw = match raw {
        None | Some(serde_json::Value::Null) => return Ok(data_type.empty_value()),
        Some(v) => v,
    };
    match (data_type, raw) {
        (DataType::Integer, serde_json::Value::Number(n)) => n
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| bad_cell(kind, column, raw)),
        (DataType::Integer, serde_json::Value::String(s)) => {
            if s.trim().is_empty() {
                Ok(Value::Integer(0))
            } else {
                s.trim()
                    .parse()
                    .map(Value::Integer)
                    .map_err(|_| bad_cell(kind, column, raw))
            }
        }
        (DataType::Real, serde_json::Value::Number(n)) => n
            .as_f64()
            .map(Value::Real)
            .ok_or_else(|| bad_cell(kind, column, raw)),
        (DataType::Numeric, serde_json::Value::Number(n)) => n
            .to_string()
            .parse::<Decimal>()
            .map(Value::Numeric)
            .map_err(|_| bad_cell(kind, column, raw)),
        (DataType::Numeric, serde_json::Value::String(s)) => {
            if s.trim().is_empty() {
                Ok(Value::Numeric(Decimal::ZERO))
            } else {
                s.trim()
                    .parse::<Decimal>()
                    .map(Value::Numeric)
                    .map_err(|_| bad_cell(kind, column, raw))
            }
        }
        (DataType::Boolean, serde_json::Value::Bool(b)) => Ok(Value::Boolean(*b)),
        (DataType::Date, serde_json::Value::String(s)) => {
            if s.trim().is_empty() {
                Ok(Value::Null)
            } else {
                parse_date(s).map(Value::Date).ok_or_else(|| {
                    GymError::data_load(format!(
                        "{}.{column}: '{s}' is not a parseable date",
                        kind.table_name()
                    ))
                })
            }
        }
        (DataType::Text { .. }, serde_json::Value::String(s)) => {
            if s.trim().is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Text(s.clone()))
            }
        }
        _ => Err(bad_cell(kind, column, raw)),
    }
}

fn bad_cell(kind: EntityKind, column: &str, raw: &serde_json::Value) -> GymError {
    GymError::data_load(format!(
        "{}.{column}: unexpected value {raw}",
        kind.table_name()
    ))
}
