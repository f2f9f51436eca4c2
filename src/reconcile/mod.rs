//! Reconciliation engine: the sole writer over the tabular working copy and
//! the sole caller of the legacy store's write path.
//!
//! Every public operation has the same two-phase shape: compute and validate
//! the full mutation set, apply it to memory, then replay the diffed fields
//! to the legacy store. A legacy failure triggers the compensating undo of
//! the in-memory mutations, so the operation either completes in both
//! stores or in neither.

pub mod billing;
pub mod class;
pub mod create;
pub mod mutation;
pub mod slots;
pub mod student;

pub use create::RecordType;
pub use mutation::Mutation;
pub use student::EditKind;

use crate::core::{EntityKind, EntityStore, GymError, GymResult, Value};
use crate::legacy::{LegacyStore, STUDENT_PREV_TABLE, STUDENT_TABLE};

pub struct Reconciler<'a> {
    pub store: &'a mut EntityStore,
    pub legacy: &'a mut LegacyStore,
    /// The school year currently being administered; selects which legacy
    /// student table a `year` argument maps to.
    pub current_year: i32,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a mut EntityStore, legacy: &'a mut LegacyStore, current_year: i32) -> Self {
        Self {
            store,
            legacy,
            current_year,
        }
    }

    /// Legacy student table for a given school year. Anything other than
    /// the current year goes to the prior-year table.
    #[must_use]
    pub fn student_table_for(&self, year: i32) -> &'static str {
        if year == self.current_year {
            STUDENT_TABLE
        } else {
            STUDENT_PREV_TABLE
        }
    }

    /// The student's legacy join key.
    pub(crate) fn student_no(&self, student_row: usize) -> GymResult<i64> {
        self.store
            .table(EntityKind::Student)?
            .get_field(student_row, "STUDENTNO")?
            .as_int()
            .ok_or(GymError::TypeMismatch)
    }

    pub(crate) fn student_family(&self, student_row: usize) -> GymResult<Value> {
        Ok(self
            .store
            .table(EntityKind::Student)?
            .get_field(student_row, "FAMILY_ID")?
            .clone())
    }
}
