use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::core::{GymError, GymResult};

use super::field::{LegacyType, LegacyValue};
use super::session::LegacySession;
use super::table::{class_fields, student_fields, LegacyTable};

/// Current-year student table.
pub const STUDENT_TABLE: &str = "STUDENT";
/// Prior-year student table.
pub const STUDENT_PREV_TABLE: &str = "STUDPREV";
/// Class table, one record per class with numbered roster slots.
pub const CLASS_TABLE: &str = "CLASSES";

/// The legacy flat-file record store: named indexed tables persisted as
/// binary files under one data directory.
pub struct LegacyStore {
    data_dir: PathBuf,
    tables: HashMap<String, LegacyTable>,
}

impl LegacyStore {
    /// Opens the store, creating empty tables when files are absent, then
    /// runs the startup schema migration (ACTIVE on the student tables,
    /// CLASS_ID on the class table, backfilled for existing records).
    pub fn open<P: AsRef<Path>>(data_dir: P) -> GymResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let mut tables = HashMap::new();
        for (name, fields) in [
            (STUDENT_TABLE, student_fields()),
            (STUDENT_PREV_TABLE, student_fields()),
            (CLASS_TABLE, class_fields()),
        ] {
            let path = data_dir.join(format!("{name}.dat"));
            let table = if path.exists() {
                let data = fs::read(&path)?;
                bincode::deserialize(&data)
                    .map_err(|e| GymError::BinarySerialization(e.to_string()))?
            } else {
                debug!(table = name, "legacy table file absent, starting empty");
                LegacyTable::new(name.to_string(), fields)
            };
            tables.insert(name.to_string(), table);
        }

        let mut store = Self { data_dir, tables };
        store.migrate();
        Ok(store)
    }

    /// One-shot startup migration; idempotent across reopens.
    fn migrate(&mut self) {
        for name in [STUDENT_TABLE, STUDENT_PREV_TABLE] {
            if let Some(table) = self.tables.get_mut(name) {
                if table.field_index("ACTIVE").is_none() {
                    info!(table = name, "migrating: adding ACTIVE flag");
                    table.add_field("ACTIVE", LegacyType::Bool);
                    // Existing enrollees default to active.
                    let idx = table.field_index("ACTIVE").unwrap_or(0);
                    for record in &mut table.records {
                        record.values[idx] = LegacyValue::Bool(true);
                    }
                }
            }
        }
        if let Some(table) = self.tables.get_mut(CLASS_TABLE) {
            if table.field_index("CLASS_ID").is_none() {
                info!(table = CLASS_TABLE, "migrating: adding CLASS_ID key");
                table.add_field("CLASS_ID", LegacyType::Num);
                let idx = table.field_index("CLASS_ID").unwrap_or(0);
                for (pos, record) in table.records.iter_mut().enumerate() {
                    record.values[idx] = LegacyValue::Num(Decimal::from(pos as i64 + 1));
                }
            }
        }
    }

    pub fn table(&self, name: &str) -> GymResult<&LegacyTable> {
        self.tables
            .get(name)
            .ok_or_else(|| GymError::TableNotFound(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> GymResult<&mut LegacyTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| GymError::TableNotFound(name.to_string()))
    }

    /// Opens a scoped open-for-update session over a named table.
    pub fn update(&mut self, name: &str) -> GymResult<LegacySession<'_>> {
        Ok(LegacySession::new(self.table_mut(name)?))
    }

    /// Persists every table to its binary file.
    pub fn save(&self) -> GymResult<()> {
        for (name, table) in &self.tables {
            let encoded = bincode::serialize(table)
                .map_err(|e| GymError::BinarySerialization(e.to_string()))?;
            fs::write(self.data_dir.join(format!("{name}.dat")), encoded)?;
        }
        Ok(())
    }
}
