use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::core::coerce::{month_number, MONTH_ABBREVS, REG_MONTH};
use crate::core::{EntityKind, EntityStore, GymResult, Row, Value};

use super::mutation::{apply_recorded, rollback, Mutation};
use super::Reconciler;

/// Which sub-field of a payment a raw edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaySub {
    Amount,
    Date,
}

/// Legacy bill-marker field for a month number (13 = registration fee).
#[must_use]
pub fn bill_field(month: i64) -> String {
    if month == REG_MONTH {
        "REGBILL".to_string()
    } else {
        format!("{}BILL", MONTH_ABBREVS[(month - 1) as usize])
    }
}

/// Position of the Payment or Bill row keyed by (student, month, year).
pub(crate) fn month_year_row(
    store: &EntityStore,
    kind: EntityKind,
    student_id: i64,
    month: i64,
    year: i64,
) -> GymResult<Option<usize>> {
    let table = store.table(kind)?;
    let sid = table.require_column("STUDENT_ID")?;
    let m = table.require_column("MONTH")?;
    let y = table.require_column("YEAR")?;
    Ok(table.rows.iter().position(|r| {
        r.get(sid).as_int() == Some(student_id)
            && r.get(m).as_int() == Some(month)
            && r.get(y).as_int() == Some(year)
    }))
}

impl Reconciler<'_> {
    /// Toggles the billed state for (student, month, year) and writes the
    /// legacy marker through. Returns the new state: `true` = billed.
    ///
    /// The marker polarity is a legacy display convention and is preserved
    /// exactly: `'*'` goes out when the in-memory bill row was just
    /// deleted, the empty string when it was inserted.
    pub fn bill_student(&mut self, student_id: i64, month_name: &str, year: i32) -> GymResult<bool> {
        let month = month_number(month_name)?;
        let student_row = self.store.student_row(student_id)?;
        let student_no = self.student_no(student_row)?;

        let existing = month_year_row(self.store, EntityKind::Bill, student_id, month, i64::from(year))?;
        let mut applied = Vec::new();
        let (billed, marker) = match existing {
            Some(row_idx) => {
                let row = self.store.table(EntityKind::Bill)?.rows[row_idx].clone();
                apply_recorded(
                    self.store,
                    &mut applied,
                    Mutation::Delete {
                        kind: EntityKind::Bill,
                        row_idx,
                        row,
                    },
                )?;
                (false, Value::Text("*".to_string()))
            }
            None => {
                apply_recorded(
                    self.store,
                    &mut applied,
                    Mutation::Insert {
                        kind: EntityKind::Bill,
                        row: Row::new(vec![
                            Value::Integer(student_id),
                            Value::Integer(month),
                            Value::Integer(i64::from(year)),
                        ]),
                    },
                )?;
                (true, Value::Null)
            }
        };

        let table = self.student_table_for(year);
        let field = bill_field(month);
        let result: GymResult<()> = (|| {
            let mut session = self.legacy.update(table)?;
            session.index_on(|t, r| t.num(r, "STUDENTNO"));
            let pos = session.find_one(student_no)?;
            let mut edit = session.focus(pos);
            edit.set(&field, &marker)?;
            edit.apply();
            Ok(())
        })();

        if let Err(e) = result {
            rollback(self.store, &applied);
            return Err(e);
        }
        debug!(student_id, month, year, billed, "bill toggled");
        Ok(billed)
    }

    /// In-memory half of a payment edit; recorded on `applied` so the
    /// caller can compensate if its legacy phase fails.
    pub(crate) fn apply_payment_edit(
        &mut self,
        applied: &mut Vec<Mutation>,
        student_id: i64,
        month: i64,
        year: i64,
        sub: PaySub,
        value: &Value,
    ) -> GymResult<()> {
        let existing = month_year_row(self.store, EntityKind::Payment, student_id, month, year)?;
        let zero = value.is_null() || value.as_numeric() == Some(Decimal::ZERO);

        match (existing, sub) {
            (None, PaySub::Amount) if !zero => {
                apply_recorded(
                    self.store,
                    applied,
                    Mutation::Insert {
                        kind: EntityKind::Payment,
                        row: Row::new(vec![
                            Value::Integer(student_id),
                            Value::Integer(month),
                            Value::Integer(year),
                            value.clone(),
                            Value::Null,
                        ]),
                    },
                )?;
                // A recorded payment clears any outstanding bill.
                if let Some(bill_idx) =
                    month_year_row(self.store, EntityKind::Bill, student_id, month, year)?
                {
                    let row = self.store.table(EntityKind::Bill)?.rows[bill_idx].clone();
                    apply_recorded(
                        self.store,
                        applied,
                        Mutation::Delete {
                            kind: EntityKind::Bill,
                            row_idx: bill_idx,
                            row,
                        },
                    )?;
                }
            }
            (None, PaySub::Amount) => {
                // Zero amount with no payment on file: nothing to record.
            }
            (None, PaySub::Date) => {
                warn!(student_id, month, year, "date entered for a month with no payment, ignored");
            }
            (Some(row_idx), PaySub::Amount) if zero => {
                let row = self.store.table(EntityKind::Payment)?.rows[row_idx].clone();
                apply_recorded(
                    self.store,
                    applied,
                    Mutation::Delete {
                        kind: EntityKind::Payment,
                        row_idx,
                        row,
                    },
                )?;
            }
            (Some(row_idx), sub) => {
                let column = match sub {
                    PaySub::Amount => "AMOUNT",
                    PaySub::Date => "DATEPAID",
                };
                let old = self
                    .store
                    .table(EntityKind::Payment)?
                    .get_field(row_idx, column)?
                    .clone();
                apply_recorded(
                    self.store,
                    applied,
                    Mutation::Set {
                        kind: EntityKind::Payment,
                        row_idx,
                        column: column.to_string(),
                        old,
                        new: value.clone(),
                    },
                )?;
            }
        }
        Ok(())
    }
}
