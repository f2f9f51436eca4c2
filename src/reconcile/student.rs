use tracing::{debug, warn};

use crate::core::coerce::{check_payment_ceiling, coerce_input, month_from_field};
use crate::core::{DataType, EntityKind, GymError, GymResult, Value};

use super::billing::PaySub;
use super::mutation::{apply_recorded, rollback, Mutation};
use super::Reconciler;

/// What kind of edit screen the raw field values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    General,
    Payment,
}

/// Where one coerced edit lands in the tabular store.
#[derive(Debug, Clone)]
enum Target {
    Student,
    Guardian { relation: &'static str },
    Payment { month: i64, sub: PaySub },
}

#[derive(Debug, Clone)]
struct PlannedEdit {
    field: String,
    value: Value,
    target: Target,
}

impl Reconciler<'_> {
    /// Applies a batch of raw user-entered field edits to a student.
    ///
    /// Values are coerced by declared type (numeric empty means zero, other
    /// text is upper-cased), guardian name fields update the matching
    /// guardian row in place, and payment-screen edits on month fields go
    /// through the payment/bill lifecycle. Everything is validated before
    /// the first write; the legacy write-through only touches fields whose
    /// stored value actually changed.
    pub fn update_student_info(
        &mut self,
        student_id: i64,
        field_values: &[(String, String)],
        edit: EditKind,
        year: i32,
    ) -> GymResult<()> {
        let student_row = self.store.student_row(student_id)?;
        let student_no = self.student_no(student_row)?;
        let planned = self.plan_edits(field_values, edit)?;

        // Phase 1: in-memory mutations, recorded for compensation.
        let mut applied = Vec::new();
        let result = self.apply_planned(&mut applied, student_id, student_row, &planned, year);
        if let Err(e) = result {
            rollback(self.store, &applied);
            return Err(e);
        }

        // Phase 2: diffed write-through to the legacy record.
        let table = self.student_table_for(year);
        let result: GymResult<()> = (|| {
            let mut session = self.legacy.update(table)?;
            session.index_on(|t, r| t.num(r, "STUDENTNO"));
            let pos = session.find_one(student_no)?;
            let mut edit = session.focus(pos);
            for planned_edit in &planned {
                if !edit.has_field(&planned_edit.field) {
                    debug!(field = %planned_edit.field, "no legacy counterpart, memory-only field");
                    continue;
                }
                edit.set_if_changed(&planned_edit.field, &planned_edit.value)?;
            }
            edit.apply();
            Ok(())
        })();

        if let Err(e) = result {
            rollback(self.store, &applied);
            return Err(e);
        }
        Ok(())
    }

    /// Coerces and routes every raw input before anything is written.
    fn plan_edits(
        &self,
        field_values: &[(String, String)],
        edit: EditKind,
    ) -> GymResult<Vec<PlannedEdit>> {
        let students = self.store.table(EntityKind::Student)?;
        let mut planned = Vec::with_capacity(field_values.len());

        for (field, raw) in field_values {
            let (target, data_type) = match field.as_str() {
                "MOMNAME" => (
                    Target::Guardian { relation: "MOM" },
                    DataType::Text { max_length: Some(30) },
                ),
                "DADNAME" => (
                    Target::Guardian { relation: "DAD" },
                    DataType::Text { max_length: Some(30) },
                ),
                name if edit == EditKind::Payment
                    && !name.starts_with("REG")
                    && (name.ends_with("PAY") || name.ends_with("DATE")) =>
                {
                    let month = month_from_field(name)?;
                    if name.ends_with("PAY") {
                        (Target::Payment { month, sub: PaySub::Amount }, DataType::Numeric)
                    } else {
                        (Target::Payment { month, sub: PaySub::Date }, DataType::Date)
                    }
                }
                name => {
                    let idx = students.require_column(name)?;
                    (Target::Student, students.columns[idx].data_type.clone())
                }
            };

            let value = coerce_input(field, raw, &data_type)?;
            if let (Target::Payment { sub: PaySub::Amount, .. }, Value::Numeric(amount)) =
                (&target, &value)
            {
                check_payment_ceiling(field, *amount)?;
            }
            planned.push(PlannedEdit {
                field: field.clone(),
                value,
                target,
            });
        }
        Ok(planned)
    }

    fn apply_planned(
        &mut self,
        applied: &mut Vec<Mutation>,
        student_id: i64,
        student_row: usize,
        planned: &[PlannedEdit],
        year: i32,
    ) -> GymResult<()> {
        for edit in planned {
            match &edit.target {
                Target::Student => {
                    let old = self
                        .store
                        .table(EntityKind::Student)?
                        .get_field(student_row, &edit.field)?
                        .clone();
                    apply_recorded(
                        self.store,
                        applied,
                        Mutation::Set {
                            kind: EntityKind::Student,
                            row_idx: student_row,
                            column: edit.field.clone(),
                            old,
                            new: edit.value.clone(),
                        },
                    )?;
                }
                Target::Guardian { relation } => {
                    self.apply_guardian_edit(applied, student_row, relation, &edit.value)?;
                }
                Target::Payment { month, sub } => {
                    self.apply_payment_edit(
                        applied,
                        student_id,
                        *month,
                        i64::from(year),
                        *sub,
                        &edit.value,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Updates the matching guardian's name in place. When no guardian row
    /// exists for the family this is a no-op; guardian creation from a name
    /// edit is an unimplemented extension point.
    fn apply_guardian_edit(
        &mut self,
        applied: &mut Vec<Mutation>,
        student_row: usize,
        relation: &str,
        value: &Value,
    ) -> GymResult<()> {
        let family = self.student_family(student_row)?;
        let guardians = self.store.table(EntityKind::Guardian)?;
        let fam_col = guardians.require_column("FAMILY_ID")?;
        let rel_col = guardians.require_column("RELATION")?;
        let found = guardians.rows.iter().position(|r| {
            r.get(fam_col) == &family && r.get(rel_col).as_text() == Some(relation)
        });
        match found {
            Some(row_idx) => {
                let old = self
                    .store
                    .table(EntityKind::Guardian)?
                    .get_field(row_idx, "NAME")?
                    .clone();
                apply_recorded(
                    self.store,
                    applied,
                    Mutation::Set {
                        kind: EntityKind::Guardian,
                        row_idx,
                        column: "NAME".to_string(),
                        old,
                        new: value.clone(),
                    },
                )?;
            }
            None => {
                // TODO: offer guardian creation from the edit screen once
                // the family form exposes relation entry.
                warn!(relation, "no guardian row for family, name edit ignored");
            }
        }
        Ok(())
    }

    /// Flips the student's active flag in both stores and returns the new
    /// state. A second call restores the original state.
    pub fn activate_student(&mut self, student_id: i64) -> GymResult<bool> {
        let student_row = self.store.student_row(student_id)?;
        let student_no = self.student_no(student_row)?;
        let old = self
            .store
            .table(EntityKind::Student)?
            .get_field(student_row, "ACTIVE")?
            .clone();
        // Migration backfills active=true, so an absent flag reads as active.
        let new_state = !old.as_bool().unwrap_or(true);

        let mut applied = Vec::new();
        apply_recorded(
            self.store,
            &mut applied,
            Mutation::Set {
                kind: EntityKind::Student,
                row_idx: student_row,
                column: "ACTIVE".to_string(),
                old,
                new: Value::Boolean(new_state),
            },
        )?;

        let table = self.student_table_for(self.current_year);
        let result: GymResult<()> = (|| {
            let mut session = self.legacy.update(table)?;
            session.index_on(|t, r| t.num(r, "STUDENTNO"));
            let pos = session.find_one(student_no)?;
            let mut edit = session.focus(pos);
            edit.set("ACTIVE", &Value::Boolean(new_state))?;
            edit.apply();
            Ok(())
        })();

        if let Err(e) = result {
            rollback(self.store, &applied);
            return Err(e);
        }
        Ok(new_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GymError;

    #[test]
    fn test_plan_rejects_unknown_field() {
        let mut store = crate::core::EntityStore::new();
        let dir = tempfile::tempdir().unwrap();
        let mut legacy = crate::legacy::LegacyStore::open(dir.path()).unwrap();
        let reconciler = Reconciler::new(&mut store, &mut legacy, 2025);
        let err = reconciler.plan_edits(
            &[("NOSUCH".to_string(), "X".to_string())],
            EditKind::General,
        );
        assert!(matches!(err, Err(GymError::ColumnNotFound(_))));
    }

    #[test]
    fn test_plan_routes_payment_fields() {
        let mut store = crate::core::EntityStore::new();
        let dir = tempfile::tempdir().unwrap();
        let mut legacy = crate::legacy::LegacyStore::open(dir.path()).unwrap();
        let reconciler = Reconciler::new(&mut store, &mut legacy, 2025);
        let planned = reconciler
            .plan_edits(
                &[
                    ("MARPAY".to_string(), "45.00".to_string()),
                    ("MARDATE".to_string(), "03/02/2025".to_string()),
                    ("REGFEE".to_string(), "25".to_string()),
                ],
                EditKind::Payment,
            )
            .unwrap();
        assert!(matches!(
            planned[0].target,
            Target::Payment { month: 3, sub: PaySub::Amount }
        ));
        assert!(matches!(
            planned[1].target,
            Target::Payment { month: 3, sub: PaySub::Date }
        ));
        // Registration fee is a plain student field even on the payment screen.
        assert!(matches!(planned[2].target, Target::Student));
    }

    #[test]
    fn test_plan_enforces_payment_ceiling() {
        let mut store = crate::core::EntityStore::new();
        let dir = tempfile::tempdir().unwrap();
        let mut legacy = crate::legacy::LegacyStore::open(dir.path()).unwrap();
        let reconciler = Reconciler::new(&mut store, &mut legacy, 2025);
        let err = reconciler.plan_edits(
            &[("MARPAY".to_string(), "1000.00".to_string())],
            EditKind::Payment,
        );
        assert!(matches!(err, Err(GymError::Validation { .. })));
    }
}
