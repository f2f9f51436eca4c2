//! Shared coercion helpers: calendar-month mapping, lenient date parsing,
//! and raw-user-input coercion into typed [`Value`]s.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::data_type::DataType;
use super::error::{GymError, GymResult};
use super::value::{Value, DATE_FORMAT};

/// Three-letter month abbreviations used as legacy field prefixes
/// (JANPAY, FEBBILL, ...). Index + 1 is the month number.
pub const MONTH_ABBREVS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Reserved month sentinel for the registration-fee bucket.
pub const REG_MONTH: i64 = 13;

/// Monthly payment amounts are capped at the legacy field's ceiling.
pub const PAYMENT_CEILING: Decimal = dec!(999.99);

/// Month number 1-12 from a legacy field's three-letter prefix
/// ("MARPAY" -> 3), or 13 for the "REG" prefix.
pub fn month_from_field(field: &str) -> GymResult<i64> {
    let prefix = field.get(..3).unwrap_or(field);
    month_number(prefix)
}

/// "JAN".."DEC" -> 1..12, "REG" -> 13. Case-insensitive.
pub fn month_number(name: &str) -> GymResult<i64> {
    let upper = name.to_uppercase();
    if upper == "REG" {
        return Ok(REG_MONTH);
    }
    MONTH_ABBREVS
        .iter()
        .position(|m| *m == upper)
        .map(|i| i as i64 + 1)
        .ok_or_else(|| GymError::validation(name, "not a calendar month abbreviation"))
}

/// Lenient `MM/DD/YYYY` parse; also accepts single-digit month/day and
/// dash separators, which show up in hand-entered legacy data.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    for fmt in [DATE_FORMAT, "%m-%d-%Y", "%m/%d/%y"] {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d);
        }
    }
    None
}

/// Coerces a raw user-entered string by declared type.
///
/// Numeric fields parse as int/decimal/float with empty meaning zero; every
/// other empty field becomes `Null`; text is upper-cased and width-checked
/// against the matching legacy fixed field.
pub fn coerce_input(field: &str, raw: &str, data_type: &DataType) -> GymResult<Value> {
    let trimmed = raw.trim();
    match data_type {
        DataType::Integer => {
            if trimmed.is_empty() {
                return Ok(Value::Integer(0));
            }
            trimmed
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| GymError::validation(field, format!("'{trimmed}' is not a number")))
        }
        DataType::Real => {
            if trimmed.is_empty() {
                return Ok(Value::Real(0.0));
            }
            trimmed
                .parse::<f64>()
                .map(Value::Real)
                .map_err(|_| GymError::validation(field, format!("'{trimmed}' is not a number")))
        }
        DataType::Numeric => {
            if trimmed.is_empty() {
                return Ok(Value::Numeric(Decimal::ZERO));
            }
            trimmed
                .parse::<Decimal>()
                .map(Value::Numeric)
                .map_err(|_| GymError::validation(field, format!("'{trimmed}' is not an amount")))
        }
        DataType::Date => {
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            parse_date(trimmed).map(Value::Date).ok_or_else(|| {
                GymError::validation(field, format!("'{trimmed}' is not a MM/DD/YYYY date"))
            })
        }
        DataType::Boolean => {
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            match trimmed.to_uppercase().as_str() {
                "TRUE" | "T" | "YES" | "Y" | "1" => Ok(Value::Boolean(true)),
                "FALSE" | "F" | "NO" | "N" | "0" => Ok(Value::Boolean(false)),
                other => Err(GymError::validation(field, format!("'{other}' is not a boolean"))),
            }
        }
        DataType::Text { max_length } => {
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            let upper = trimmed.to_uppercase();
            if let Some(width) = max_length {
                if upper.len() > *width {
                    return Err(GymError::validation(
                        field,
                        format!("exceeds field width of {width} characters"),
                    ));
                }
            }
            Ok(Value::Text(upper))
        }
    }
}

/// Payment-amount ceiling check, applied before any payment write.
pub fn check_payment_ceiling(field: &str, amount: Decimal) -> GymResult<()> {
    if amount > PAYMENT_CEILING {
        return Err(GymError::validation(
            field,
            format!("amount exceeds {PAYMENT_CEILING} ceiling"),
        ));
    }
    Ok(())
}
