use serde::{Deserialize, Serialize};

use crate::core::coerce::MONTH_ABBREVS;
use crate::core::{GymError, GymResult};

use super::field::{LegacyType, LegacyValue};

/// Fixed numbered student slots carried on each legacy class record.
pub const CLASS_SLOTS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyField {
    pub name: String,
    pub ftype: LegacyType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyRecord {
    pub values: Vec<LegacyValue>,
}

/// One indexed record table of the legacy flat-file store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyTable {
    pub name: String,
    pub fields: Vec<LegacyField>,
    pub records: Vec<LegacyRecord>,
}

impl LegacyTable {
    #[must_use]
    pub const fn new(name: String, fields: Vec<LegacyField>) -> Self {
        Self {
            name,
            fields,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn require_field(&self, name: &str) -> GymResult<usize> {
        self.field_index(name)
            .ok_or_else(|| GymError::ColumnNotFound(name.to_string()))
    }

    /// Schema migration: adds a field with a backfill default for every
    /// existing record. No-op when the field already exists.
    pub fn add_field(&mut self, name: &str, ftype: LegacyType) {
        if self.field_index(name).is_some() {
            return;
        }
        let default = LegacyValue::default_for(&ftype);
        self.fields.push(LegacyField {
            name: name.to_string(),
            ftype,
        });
        for record in &mut self.records {
            record.values.push(default.clone());
        }
    }

    /// Appends a record with every field at its backfill default.
    pub fn push_default_record(&mut self) -> usize {
        let values = self
            .fields
            .iter()
            .map(|f| LegacyValue::default_for(&f.ftype))
            .collect();
        self.records.push(LegacyRecord { values });
        self.records.len() - 1
    }

    pub fn get(&self, record: usize, field: &str) -> GymResult<&LegacyValue> {
        let idx = self.require_field(field)?;
        Ok(&self.records[record].values[idx])
    }

    /// Numeric field shorthand used by index key extraction closures.
    #[must_use]
    pub fn num(&self, record: &LegacyRecord, field: &str) -> Option<i64> {
        self.field_index(field)
            .and_then(|idx| record.values[idx].as_i64())
    }
}

/// Field layout of the student tables (current and prior year). The ACTIVE
/// flag is not part of the historical layout; it is added by the startup
/// migration in [`super::store::LegacyStore::open`].
#[must_use]
pub fn student_fields() -> Vec<LegacyField> {
    let f = |name: &str, ftype: LegacyType| LegacyField {
        name: name.to_string(),
        ftype,
    };
    let mut fields = vec![
        f("STUDENTNO", LegacyType::Num),
        f("FNAME", LegacyType::Str { width: 20 }),
        f("LNAME", LegacyType::Str { width: 20 }),
        f("ADDRESS", LegacyType::Str { width: 30 }),
        f("CITY", LegacyType::Str { width: 20 }),
        f("STATE", LegacyType::Str { width: 2 }),
        f("ZIP", LegacyType::Str { width: 10 }),
        f("PHONE", LegacyType::Str { width: 14 }),
        f("BIRTHDAY", LegacyType::Date),
        f("ENROLLDATE", LegacyType::Date),
        f("FAMILY_ID", LegacyType::Num),
        f("MONTHLYFEE", LegacyType::Num),
        f("BALANCE", LegacyType::Num),
        f("MOMNAME", LegacyType::Str { width: 30 }),
        f("DADNAME", LegacyType::Str { width: 30 }),
        f("REGFEE", LegacyType::Num),
        f("REGBILL", LegacyType::Str { width: 1 }),
    ];
    for month in MONTH_ABBREVS {
        fields.push(f(&format!("{month}PAY"), LegacyType::Num));
        fields.push(f(&format!("{month}DATE"), LegacyType::Date));
        fields.push(f(&format!("{month}BILL"), LegacyType::Str { width: 1 }));
    }
    fields
}

/// Field layout of the class table, including the numbered roster slot
/// pairs. CLASS_ID is added by the startup migration.
#[must_use]
pub fn class_fields() -> Vec<LegacyField> {
    let f = |name: &str, ftype: LegacyType| LegacyField {
        name: name.to_string(),
        ftype,
    };
    let mut fields = vec![
        f("INSTRUCTOR", LegacyType::Str { width: 20 }),
        f("CLASSNAME", LegacyType::Str { width: 30 }),
        f("TIME", LegacyType::Str { width: 10 }),
        f("DAY", LegacyType::Str { width: 10 }),
        f("MAX", LegacyType::Num),
        f("AVAILABLE", LegacyType::Num),
    ];
    for i in 1..=CLASS_SLOTS {
        fields.push(f(&format!("S{i}NO"), LegacyType::Num));
        fields.push(f(&format!("S{i}NAME"), LegacyType::Str { width: 30 }));
    }
    fields
}
