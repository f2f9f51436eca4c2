use crate::core::{EntityKind, EntityStore, GymResult, Row, Value};

/// One in-memory mutation of the tabular working copy. Every reconciliation
/// operation records the mutations it applies so that a failure during the
/// legacy write-through can be compensated by undoing them in reverse,
/// leaving the two stores consistent.
#[derive(Debug, Clone)]
pub enum Mutation {
    Set {
        kind: EntityKind,
        row_idx: usize,
        column: String,
        old: Value,
        new: Value,
    },
    /// Row appended at the end of the table.
    Insert { kind: EntityKind, row: Row },
    /// Row removed from `row_idx`; kept for re-insertion on undo.
    Delete {
        kind: EntityKind,
        row_idx: usize,
        row: Row,
    },
}

impl Mutation {
    pub fn apply(&self, store: &mut EntityStore) -> GymResult<()> {
        match self {
            Self::Set {
                kind,
                row_idx,
                column,
                new,
                ..
            } => store.table_mut(*kind)?.set_field(*row_idx, column, new.clone()),
            Self::Insert { kind, row } => store.table_mut(*kind)?.insert(row.clone()),
            Self::Delete { kind, row_idx, .. } => {
                store.table_mut(*kind)?.delete_row(*row_idx);
                Ok(())
            }
        }
    }

    pub fn undo(&self, store: &mut EntityStore) -> GymResult<()> {
        match self {
            Self::Set {
                kind,
                row_idx,
                column,
                old,
                ..
            } => store.table_mut(*kind)?.set_field(*row_idx, column, old.clone()),
            Self::Insert { kind, .. } => {
                let table = store.table_mut(*kind)?;
                table.rows.pop();
                Ok(())
            }
            Self::Delete { kind, row_idx, row } => {
                let table = store.table_mut(*kind)?;
                table.rows.insert(*row_idx, row.clone());
                Ok(())
            }
        }
    }
}

/// Applies a planned mutation and records it on the undo list.
pub fn apply_recorded(
    store: &mut EntityStore,
    applied: &mut Vec<Mutation>,
    mutation: Mutation,
) -> GymResult<()> {
    mutation.apply(store)?;
    applied.push(mutation);
    Ok(())
}

/// Compensating action: undoes applied mutations in reverse order.
pub fn rollback(store: &mut EntityStore, applied: &[Mutation]) {
    for mutation in applied.iter().rev() {
        // Undo of a recorded mutation cannot fail: the rows it targets are
        // exactly the ones the forward pass touched.
        let _ = mutation.undo(store);
    }
}
