use std::collections::HashMap;

use crate::core::{GymError, GymResult, Value};

use super::field::LegacyValue;
use super::table::{LegacyRecord, LegacyTable};

/// Scoped open-for-update session over one legacy table.
pub struct LegacySession<'a> {
    table: &'a mut LegacyTable,
    index: HashMap<i64, Vec<usize>>,
}

impl<'a> LegacySession<'a> {
    pub(super) fn new(table: &'a mut LegacyTable) -> Self {
        Self {
            table,
            index: HashMap::new(),
        }
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table.name
    }

    /// Builds a secondary index from a caller-supplied key extraction.
    /// Records whose key cannot be extracted are left unindexed.
    pub fn index_on<F>(&mut self, extract: F)
    where
        F: Fn(&LegacyTable, &LegacyRecord) -> Option<i64>,
    {
        self.index.clear();
        for (pos, record) in self.table.records.iter().enumerate() {
            if let Some(key) = extract(self.table, record) {
                self.index.entry(key).or_default().push(pos);
            }
        }
    }

    /// Exact-match lookup against the built index.
    #[must_use]
    pub fn find(&self, key: i64) -> Vec<usize> {
        self.index.get(&key).cloned().unwrap_or_default()
    }

    /// Exactly-one lookup; anything else means the two representations
    /// have diverged and is reported as a fatal integrity error.
    pub fn find_one(&self, key: i64) -> GymResult<usize> {
        let matches = self.find(key);
        if matches.len() == 1 {
            Ok(matches[0])
        } else {
            Err(GymError::RecordNotFound {
                table: self.table.name.clone(),
                key,
            })
        }
    }

    /// Scoped focus on one record for field-level reads and writes.
    pub fn focus(&mut self, record: usize) -> RecordEdit<'_> {
        RecordEdit {
            table: self.table,
            record,
            pending: Vec::new(),
        }
    }
}

/// Buffered per-record edit. Writes are coerced eagerly on `set` but only
/// land on the record in `apply`, so any coercion failure leaves the
/// record untouched — this is the rollback boundary of the legacy store.
pub struct RecordEdit<'a> {
    table: &'a mut LegacyTable,
    record: usize,
    pending: Vec<(usize, LegacyValue)>,
}

impl RecordEdit<'_> {
    pub fn get(&self, field: &str) -> GymResult<LegacyValue> {
        self.table.get(self.record, field).cloned()
    }

    pub fn set(&mut self, field: &str, value: &Value) -> GymResult<()> {
        let idx = self.table.require_field(field)?;
        let coerced = LegacyValue::coerce(field, value, &self.table.fields[idx].ftype)?;
        self.pending.push((idx, coerced));
        Ok(())
    }

    /// Buffers a write only when the coerced value differs from what the
    /// record already holds. Returns whether a write was buffered; legacy
    /// writes are kept to the minimum this way.
    pub fn set_if_changed(&mut self, field: &str, value: &Value) -> GymResult<bool> {
        let idx = self.table.require_field(field)?;
        let coerced = LegacyValue::coerce(field, value, &self.table.fields[idx].ftype)?;
        if self.table.records[self.record].values[idx] == coerced {
            return Ok(false);
        }
        self.pending.push((idx, coerced));
        Ok(true)
    }

    /// Whether the table carries this field at all.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.table.field_index(field).is_some()
    }

    /// Applies all buffered writes at once.
    pub fn apply(self) {
        let record = &mut self.table.records[self.record];
        for (idx, value) in self.pending {
            record.values[idx] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::field::LegacyType;
    use crate::legacy::table::student_fields;

    fn student_table() -> LegacyTable {
        let mut table = LegacyTable::new("STUDENT".to_string(), student_fields());
        table.add_field("ACTIVE", LegacyType::Bool);
        for no in [1041, 1042] {
            let pos = table.push_default_record();
            let idx = table.field_index("STUDENTNO").unwrap();
            table.records[pos].values[idx] = LegacyValue::Num(no.into());
        }
        table
    }

    #[test]
    fn test_index_and_find_one() {
        let mut table = student_table();
        let mut session = LegacySession::new(&mut table);
        session.index_on(|t, r| t.num(r, "STUDENTNO"));
        assert!(session.find_one(1042).is_ok());
        assert!(matches!(
            session.find_one(9999),
            Err(GymError::RecordNotFound { .. })
        ));
    }

    #[test]
    fn test_focus_buffered_until_apply() {
        let mut table = student_table();
        let mut session = LegacySession::new(&mut table);
        session.index_on(|t, r| t.num(r, "STUDENTNO"));
        let pos = session.find_one(1042).unwrap();

        let mut edit = session.focus(pos);
        edit.set("FNAME", &Value::Text("MARIA".to_string())).unwrap();
        assert_eq!(edit.get("FNAME").unwrap(), LegacyValue::Str(String::new()));
        edit.apply();

        assert_eq!(
            table.get(1, "FNAME").unwrap(),
            &LegacyValue::Str("MARIA".to_string())
        );
    }

    #[test]
    fn test_set_failure_leaves_record_untouched() {
        let mut table = student_table();
        let mut session = LegacySession::new(&mut table);
        session.index_on(|t, r| t.num(r, "STUDENTNO"));
        let pos = session.find_one(1041).unwrap();

        let mut edit = session.focus(pos);
        edit.set("FNAME", &Value::Text("ANNA".to_string())).unwrap();
        let err = edit.set("STATE", &Value::Text("TEXAS".to_string()));
        assert!(err.is_err());
        drop(edit); // abandoned without apply

        assert_eq!(table.get(0, "FNAME").unwrap(), &LegacyValue::Str(String::new()));
    }
}
