use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DataType {
    Integer,
    Real,
    /// Money fields (fees, payments, balances).
    Numeric,
    /// Free text; `max_length` mirrors the fixed width of the matching
    /// legacy field when there is one.
    Text { max_length: Option<usize> },
    Boolean,
    Date,
}

impl DataType {
    /// The value an absent cell normalizes to: zero for numeric columns,
    /// the explicit empty marker otherwise.
    #[must_use]
    pub const fn empty_value(&self) -> Value {
        match self {
            Self::Integer => Value::Integer(0),
            Self::Real => Value::Real(0.0),
            Self::Numeric => Value::Numeric(Decimal::ZERO),
            _ => Value::Null,
        }
    }
}
