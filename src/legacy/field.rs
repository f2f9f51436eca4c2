use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{GymError, GymResult, Value};

/// Declared type of a legacy flat-file field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LegacyType {
    /// Fixed-width string; writes longer than `width` are rejected.
    Str { width: usize },
    Num,
    Date,
    Bool,
}

/// A stored legacy field value. Numbers are kept as decimals so record
/// keys and money amounts compare exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LegacyValue {
    Str(String),
    Num(Decimal),
    Date(Option<NaiveDate>),
    Bool(bool),
}

impl LegacyValue {
    /// Backfill default for a freshly added or cleared field.
    #[must_use]
    pub const fn default_for(ftype: &LegacyType) -> Self {
        match ftype {
            LegacyType::Str { .. } => Self::Str(String::new()),
            LegacyType::Num => Self::Num(Decimal::ZERO),
            LegacyType::Date => Self::Date(None),
            LegacyType::Bool => Self::Bool(false),
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Num(d) => d.trunc().try_into().ok(),
            _ => None,
        }
    }

    /// Coerces a tabular [`Value`] into this field's declared legacy type.
    /// This is the write-path type coercion of the adapter contract;
    /// date-typed fields accept `MM/DD/YYYY` text as well as typed dates.
    pub fn coerce(field: &str, value: &Value, ftype: &LegacyType) -> GymResult<Self> {
        match (ftype, value) {
            (LegacyType::Str { width }, Value::Text(s)) => {
                if s.len() > *width {
                    return Err(GymError::validation(
                        field,
                        format!("exceeds legacy field width of {width}"),
                    ));
                }
                Ok(Self::Str(s.clone()))
            }
            (LegacyType::Str { .. }, Value::Null) => Ok(Self::Str(String::new())),
            (LegacyType::Num, Value::Integer(i)) => Ok(Self::Num(Decimal::from(*i))),
            (LegacyType::Num, Value::Numeric(d)) => Ok(Self::Num(*d)),
            (LegacyType::Num, Value::Real(r)) => Decimal::try_from(*r)
                .map(Self::Num)
                .map_err(|_| GymError::validation(field, "not representable as legacy number")),
            (LegacyType::Num, Value::Null) => Ok(Self::Num(Decimal::ZERO)),
            (LegacyType::Date, Value::Date(d)) => Ok(Self::Date(Some(*d))),
            (LegacyType::Date, Value::Null) => Ok(Self::Date(None)),
            (LegacyType::Date, Value::Text(s)) => crate::core::coerce::parse_date(s)
                .map(|d| Self::Date(Some(d)))
                .ok_or_else(|| GymError::validation(field, "not a MM/DD/YYYY date")),
            (LegacyType::Bool, Value::Boolean(b)) => Ok(Self::Bool(*b)),
            _ => Err(GymError::TypeMismatch),
        }
    }
}
