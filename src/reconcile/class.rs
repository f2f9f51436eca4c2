use tracing::debug;

use crate::core::coerce::coerce_input;
use crate::core::{EntityKind, GymError, GymResult, Row, Value};
use crate::legacy::{LegacyRecord, LegacyTable, CLASS_SLOTS, CLASS_TABLE};

use super::mutation::{apply_recorded, rollback, Mutation};
use super::Reconciler;

/// Slot position (1-based) found in a legacy class record.
struct SlotScan {
    old_slot: usize,
    new_slot: usize,
}

fn find_class_record<'a>(
    table: &'a LegacyTable,
    class_id: i64,
) -> GymResult<&'a LegacyRecord> {
    table
        .records
        .iter()
        .find(|r| table.num(r, "CLASS_ID") == Some(class_id))
        .ok_or(GymError::RecordNotFound {
            table: CLASS_TABLE.to_string(),
            key: class_id,
        })
}

impl Reconciler<'_> {
    /// Applies raw field edits to a class, same two-phase shape as the
    /// student update but with no payment or guardian routing.
    pub fn update_class_info(
        &mut self,
        class_id: i64,
        field_values: &[(String, String)],
    ) -> GymResult<()> {
        let class_row = self.store.class_row(class_id)?;

        // Coerce everything before any write.
        let classes = self.store.table(EntityKind::Class)?;
        let mut planned = Vec::with_capacity(field_values.len());
        for (field, raw) in field_values {
            let idx = classes.require_column(field)?;
            let value = coerce_input(field, raw, &classes.columns[idx].data_type)?;
            planned.push((field.clone(), value));
        }

        let mut applied = Vec::new();
        for (field, value) in &planned {
            let old = self
                .store
                .table(EntityKind::Class)?
                .get_field(class_row, field)?
                .clone();
            if let Err(e) = apply_recorded(
                self.store,
                &mut applied,
                Mutation::Set {
                    kind: EntityKind::Class,
                    row_idx: class_row,
                    column: field.clone(),
                    old,
                    new: value.clone(),
                },
            ) {
                rollback(self.store, &applied);
                return Err(e);
            }
        }

        let result: GymResult<()> = (|| {
            let mut session = self.legacy.update(CLASS_TABLE)?;
            session.index_on(|t, r| t.num(r, "CLASS_ID"));
            let pos = session.find_one(class_id)?;
            let mut edit = session.focus(pos);
            for (field, value) in &planned {
                if !edit.has_field(field) {
                    debug!(field = %field, "no legacy counterpart, memory-only field");
                    continue;
                }
                edit.set_if_changed(field, value)?;
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

    /// Moves a student's roster link between classes, keeping its active
    /// flag, and mirrors the numbered slot pairs in the legacy class
    /// records. A missing old-class slot or a full new class fails the
    /// whole operation before anything is written.
    pub fn move_student(
        &mut self,
        student_id: i64,
        from_class: i64,
        to_class: i64,
    ) -> GymResult<()> {
        let student_row = self.store.student_row(student_id)?;
        let student_no = self.student_no(student_row)?;
        let full_name = self.student_display_name(student_row)?;
        let from_row = self.store.class_row(from_class)?;
        let to_row = self.store.class_row(to_class)?;

        // The roster link being moved; its active flag survives the move.
        let roster = self.store.table(EntityKind::Roster)?;
        let cid = roster.require_column("CLASS_ID")?;
        let sid = roster.require_column("STUDENT_ID")?;
        let link_idx = roster
            .rows
            .iter()
            .position(|r| {
                r.get(cid).as_int() == Some(from_class) && r.get(sid).as_int() == Some(student_id)
            })
            .ok_or(GymError::RecordNotFound {
                table: "roster".to_string(),
                key: student_id,
            })?;
        let active = roster.get_field(link_idx, "ACTIVE")?.clone();

        // Dry-run against the legacy class records: the operation must
        // fail loudly here, not silently skip a half.
        let scan = self.scan_legacy_slots(student_no, from_class, to_class)?;

        // Phase 1: roster link move + AVAILABLE accounting.
        let mut applied = Vec::new();
        let result = self.apply_move_mutations(
            &mut applied,
            student_id,
            to_class,
            link_idx,
            &active,
            from_row,
            to_row,
        );
        if let Err(e) = result {
            rollback(self.store, &applied);
            return Err(e);
        }

        // Phase 2: clear the old slot, fill the first free slot.
        let result = self.write_legacy_slots(student_no, &full_name, from_class, to_class, &scan);
        if let Err(e) = result {
            rollback(self.store, &applied);
            return Err(e);
        }
        debug!(student_id, from_class, to_class, "student moved");
        Ok(())
    }

    fn student_display_name(&self, student_row: usize) -> GymResult<String> {
        let students = self.store.table(EntityKind::Student)?;
        let fname = students.get_field(student_row, "FNAME")?.to_string();
        let lname = students.get_field(student_row, "LNAME")?.to_string();
        let full = format!("{fname} {lname}");
        Ok(full.trim().chars().take(30).collect())
    }

    fn scan_legacy_slots(
        &self,
        student_no: i64,
        from_class: i64,
        to_class: i64,
    ) -> GymResult<SlotScan> {
        let table = self.legacy.table(CLASS_TABLE)?;
        let old_record = find_class_record(table, from_class)?;
        let new_record = find_class_record(table, to_class)?;

        let slot_holding = |record: &LegacyRecord, wanted: i64| {
            (1..=CLASS_SLOTS)
                .find(|i| table.num(record, &format!("S{i}NO")) == Some(wanted))
        };
        let old_slot = slot_holding(old_record, student_no).ok_or(GymError::RecordNotFound {
            table: CLASS_TABLE.to_string(),
            key: student_no,
        })?;
        let new_slot = slot_holding(new_record, 0).ok_or(GymError::Capacity {
            class_id: to_class,
            message: "no free roster slot".to_string(),
        })?;
        Ok(SlotScan { old_slot, new_slot })
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_move_mutations(
        &mut self,
        applied: &mut Vec<Mutation>,
        student_id: i64,
        to_class: i64,
        link_idx: usize,
        active: &Value,
        from_row: usize,
        to_row: usize,
    ) -> GymResult<()> {
        let link = self.store.table(EntityKind::Roster)?.rows[link_idx].clone();
        apply_recorded(
            self.store,
            applied,
            Mutation::Delete {
                kind: EntityKind::Roster,
                row_idx: link_idx,
                row: link,
            },
        )?;
        apply_recorded(
            self.store,
            applied,
            Mutation::Insert {
                kind: EntityKind::Roster,
                row: Row::new(vec![
                    Value::Integer(to_class),
                    Value::Integer(student_id),
                    active.clone(),
                ]),
            },
        )?;
        for (row_idx, delta) in [(from_row, 1), (to_row, -1)] {
            let old = self
                .store
                .table(EntityKind::Class)?
                .get_field(row_idx, "AVAILABLE")?
                .clone();
            let new = Value::Integer(old.as_int().unwrap_or(0) + delta);
            apply_recorded(
                self.store,
                applied,
                Mutation::Set {
                    kind: EntityKind::Class,
                    row_idx,
                    column: "AVAILABLE".to_string(),
                    old,
                    new,
                },
            )?;
        }
        Ok(())
    }

    fn write_legacy_slots(
        &mut self,
        student_no: i64,
        full_name: &str,
        from_class: i64,
        to_class: i64,
        scan: &SlotScan,
    ) -> GymResult<()> {
        let mut session = self.legacy.update(CLASS_TABLE)?;
        session.index_on(|t, r| t.num(r, "CLASS_ID"));
        let old_pos = session.find_one(from_class)?;
        let new_pos = session.find_one(to_class)?;

        let mut edit = session.focus(old_pos);
        let avail = edit.get("AVAILABLE")?.as_i64().unwrap_or(0);
        edit.set(&format!("S{}NO", scan.old_slot), &Value::Integer(0))?;
        edit.set(&format!("S{}NAME", scan.old_slot), &Value::Null)?;
        edit.set("AVAILABLE", &Value::Integer(avail + 1))?;
        edit.apply();

        let mut edit = session.focus(new_pos);
        let avail = edit.get("AVAILABLE")?.as_i64().unwrap_or(0);
        edit.set(&format!("S{}NO", scan.new_slot), &Value::Integer(student_no))?;
        edit.set(
            &format!("S{}NAME", scan.new_slot),
            &Value::Text(full_name.to_string()),
        )?;
        edit.set("AVAILABLE", &Value::Integer(avail - 1))?;
        edit.apply();
        Ok(())
    }
}
