//! Waitlist, trial, and makeup slot bookkeeping, plus free-text notes.
//! These live only in the tabular store; the legacy tables do not carry
//! them, so there is no write-through phase.

use crate::core::coerce::coerce_input;
use crate::core::{schema, DataType, EntityKind, GymError, GymResult, Row, Value};

use super::Reconciler;

impl Reconciler<'_> {
    /// Books a trial visit into the first open slot of a class.
    pub fn add_trial(
        &mut self,
        class_id: i64,
        name: &str,
        phone: &str,
        date: &str,
    ) -> GymResult<i64> {
        let slot = self.first_open_slot(EntityKind::Trial, class_id)?;
        let row = Row::new(vec![
            Value::Integer(class_id),
            Value::Integer(slot),
            coerce_input("NAME", name, &DataType::Text { max_length: Some(30) })?,
            coerce_input("PHONE", phone, &DataType::Text { max_length: Some(14) })?,
            coerce_input("DATE", date, &DataType::Date)?,
        ]);
        self.store.table_mut(EntityKind::Trial)?.insert(row)?;
        Ok(slot)
    }

    /// Adds a caller to a class waitlist.
    pub fn add_wait(&mut self, class_id: i64, name: &str, phone: &str) -> GymResult<i64> {
        let slot = self.first_open_slot(EntityKind::Wait, class_id)?;
        let row = Row::new(vec![
            Value::Integer(class_id),
            Value::Integer(slot),
            coerce_input("NAME", name, &DataType::Text { max_length: Some(30) })?,
            coerce_input("PHONE", phone, &DataType::Text { max_length: Some(14) })?,
        ]);
        self.store.table_mut(EntityKind::Wait)?.insert(row)?;
        Ok(slot)
    }

    /// Schedules a makeup visit.
    pub fn add_makeup(
        &mut self,
        class_id: i64,
        name: &str,
        phone: &str,
        date: &str,
    ) -> GymResult<i64> {
        let slot = self.first_open_slot(EntityKind::Makeup, class_id)?;
        let row = Row::new(vec![
            Value::Integer(class_id),
            Value::Integer(slot),
            coerce_input("NAME", name, &DataType::Text { max_length: Some(30) })?,
            coerce_input("PHONE", phone, &DataType::Text { max_length: Some(14) })?,
            coerce_input("DATE", date, &DataType::Date)?,
        ]);
        self.store.table_mut(EntityKind::Makeup)?.insert(row)?;
        Ok(slot)
    }

    /// Clears one slot. The gap it leaves is temporary: the next add
    /// targets the first open slot.
    pub fn clear_slot(&mut self, kind: EntityKind, class_id: i64, slot: i64) -> GymResult<()> {
        let table = self.store.table_mut(kind)?;
        let cid = table.require_column("CLASS_ID")?;
        let s = table.require_column("SLOT")?;
        let pos = table
            .rows
            .iter()
            .position(|r| r.get(cid).as_int() == Some(class_id) && r.get(s).as_int() == Some(slot))
            .ok_or(GymError::RecordNotFound {
                table: kind.table_name().to_string(),
                key: slot,
            })?;
        table.delete_row(pos);
        Ok(())
    }

    /// Attaches a free-text note to a student or class.
    pub fn add_note(&mut self, owner_kind: &str, owner_id: i64, text: &str) -> GymResult<()> {
        let row = Row::new(vec![
            Value::Text(owner_kind.to_uppercase()),
            Value::Integer(owner_id),
            Value::Text(text.to_string()),
        ]);
        self.store.table_mut(EntityKind::Note)?.insert(row)
    }

    /// Lowest unoccupied slot number, bounded by the per-kind capacity.
    fn first_open_slot(&self, kind: EntityKind, class_id: i64) -> GymResult<i64> {
        let capacity = schema::slot_capacity(kind).ok_or(GymError::TypeMismatch)?;
        let table = self.store.table(kind)?;
        let cid = table.require_column("CLASS_ID")?;
        let s = table.require_column("SLOT")?;
        let taken: Vec<i64> = table
            .rows
            .iter()
            .filter(|r| r.get(cid).as_int() == Some(class_id))
            .filter_map(|r| r.get(s).as_int())
            .collect();
        (1..=capacity)
            .find(|slot| !taken.contains(slot))
            .ok_or(GymError::Capacity {
                class_id,
                message: format!("all {capacity} {} slots taken", kind.table_name()),
            })
    }
}
