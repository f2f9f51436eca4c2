use tracing::info;

use crate::core::coerce::coerce_input;
use crate::core::{EntityKind, GymError, GymResult, Row, Value};
use crate::legacy::{LegacyValue, CLASS_TABLE, STUDENT_TABLE};

use super::mutation::{apply_recorded, rollback, Mutation};
use super::Reconciler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Student,
    Class,
}

impl Reconciler<'_> {
    /// Creates a new student or class in both representations: validates
    /// the entry, allocates the next sequential legacy key, and inserts a
    /// row into the tabular store and a record into the legacy table.
    /// Returns the allocated key.
    pub fn create_record(
        &mut self,
        entry: &[(String, String)],
        record_type: RecordType,
    ) -> GymResult<i64> {
        match record_type {
            RecordType::Student => self.create_student(entry),
            RecordType::Class => self.create_class(entry),
        }
    }

    fn create_student(&mut self, entry: &[(String, String)]) -> GymResult<i64> {
        let kind = EntityKind::Student;
        let coerced = self.coerce_entry(kind, entry, &["STUDENT_ID", "STUDENTNO"])?;
        if !coerced.iter().any(|(f, v)| {
            (f == "FNAME" || f == "LNAME") && !v.is_null()
        }) {
            return Err(GymError::validation("FNAME", "a new student needs a name"));
        }

        let student_no = self.next_key(kind, "STUDENTNO", STUDENT_TABLE, "STUDENTNO")?;
        let student_id = self.next_memory_key(kind, "STUDENT_ID")?;

        let mut overrides = vec![
            ("STUDENT_ID".to_string(), Value::Integer(student_id)),
            ("STUDENTNO".to_string(), Value::Integer(student_no)),
            ("ACTIVE".to_string(), Value::Boolean(true)),
        ];
        overrides.extend(coerced.iter().cloned());

        let row = self.build_row(kind, &overrides)?;
        let mut applied = Vec::new();
        apply_recorded(self.store, &mut applied, Mutation::Insert { kind, row })?;

        let result = self.create_legacy_record(STUDENT_TABLE, &overrides);
        if let Err(e) = result {
            rollback(self.store, &applied);
            return Err(e);
        }
        info!(student_id, student_no, "student created");
        Ok(student_no)
    }

    fn create_class(&mut self, entry: &[(String, String)]) -> GymResult<i64> {
        let kind = EntityKind::Class;
        let coerced = self.coerce_entry(kind, entry, &["CLASS_ID"])?;
        if !coerced.iter().any(|(f, v)| f == "CLASSNAME" && !v.is_null()) {
            return Err(GymError::validation("CLASSNAME", "a new class needs a name"));
        }

        let class_id = self.next_key(kind, "CLASS_ID", CLASS_TABLE, "CLASS_ID")?;
        // A fresh class starts with every slot open.
        let max = coerced
            .iter()
            .find(|(f, _)| f == "MAX")
            .and_then(|(_, v)| v.as_int())
            .unwrap_or(0);

        let mut overrides = vec![
            ("CLASS_ID".to_string(), Value::Integer(class_id)),
            ("AVAILABLE".to_string(), Value::Integer(max)),
        ];
        overrides.extend(coerced.iter().cloned());

        let row = self.build_row(kind, &overrides)?;
        let mut applied = Vec::new();
        apply_recorded(self.store, &mut applied, Mutation::Insert { kind, row })?;

        let result = self.create_legacy_record(CLASS_TABLE, &overrides);
        if let Err(e) = result {
            rollback(self.store, &applied);
            return Err(e);
        }
        info!(class_id, "class created");
        Ok(class_id)
    }

    /// Coerces entry fields against the entity schema, rejecting the
    /// reserved key columns the engine allocates itself.
    fn coerce_entry(
        &self,
        kind: EntityKind,
        entry: &[(String, String)],
        reserved: &[&str],
    ) -> GymResult<Vec<(String, Value)>> {
        let table = self.store.table(kind)?;
        let mut coerced = Vec::with_capacity(entry.len());
        for (field, raw) in entry {
            if reserved.contains(&field.as_str()) {
                return Err(GymError::validation(field, "key fields are allocated, not entered"));
            }
            let idx = table.require_column(field)?;
            coerced.push((
                field.clone(),
                coerce_input(field, raw, &table.columns[idx].data_type)?,
            ));
        }
        Ok(coerced)
    }

    /// Next sequential key across both representations, so the key spaces
    /// cannot diverge even if one side has records the other lacks.
    fn next_key(
        &self,
        kind: EntityKind,
        column: &str,
        legacy_table: &str,
        legacy_field: &str,
    ) -> GymResult<i64> {
        let memory_max = self.max_int(kind, column)?;
        let table = self.legacy.table(legacy_table)?;
        let legacy_max = table
            .records
            .iter()
            .filter_map(|r| table.num(r, legacy_field))
            .max()
            .unwrap_or(0);
        Ok(memory_max.max(legacy_max) + 1)
    }

    fn next_memory_key(&self, kind: EntityKind, column: &str) -> GymResult<i64> {
        Ok(self.max_int(kind, column)? + 1)
    }

    fn max_int(&self, kind: EntityKind, column: &str) -> GymResult<i64> {
        let table = self.store.table(kind)?;
        let idx = table.require_column(column)?;
        Ok(table
            .rows
            .iter()
            .filter_map(|r| r.get(idx).as_int())
            .max()
            .unwrap_or(0))
    }

    /// Full-width row from overrides plus per-column empty defaults.
    fn build_row(&self, kind: EntityKind, overrides: &[(String, Value)]) -> GymResult<Row> {
        let table = self.store.table(kind)?;
        let values = table
            .columns
            .iter()
            .map(|col| {
                overrides
                    .iter()
                    .find(|(f, _)| *f == col.name)
                    .map_or_else(|| col.data_type.empty_value(), |(_, v)| v.clone())
            })
            .collect();
        Ok(Row::new(values))
    }

    fn create_legacy_record(
        &mut self,
        table_name: &str,
        overrides: &[(String, Value)],
    ) -> GymResult<()> {
        let table = self.legacy.table_mut(table_name)?;
        let pos = table.push_default_record();
        for (field, value) in overrides {
            let Some(idx) = table.field_index(field) else {
                continue; // memory-only field
            };
            let ftype = table.fields[idx].ftype.clone();
            match LegacyValue::coerce(field, value, &ftype) {
                Ok(coerced) => table.records[pos].values[idx] = coerced,
                Err(e) => {
                    // Drop the half-written record rather than leave it.
                    table.records.remove(pos);
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
