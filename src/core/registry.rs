use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{GymError, GymResult};
use super::schema::{self, EntityKind};
use super::table::EntityTable;

/// The tabular working copy: one typed table per entity kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    tables: HashMap<EntityKind, EntityTable>,
}

impl EntityStore {
    #[must_use]
    pub fn new() -> Self {
        let mut tables = HashMap::new();
        for kind in EntityKind::ALL {
            tables.insert(kind, schema::table_for(kind));
        }
        Self { tables }
    }

    pub fn table(&self, kind: EntityKind) -> GymResult<&EntityTable> {
        self.tables
            .get(&kind)
            .ok_or_else(|| GymError::TableNotFound(kind.table_name().to_string()))
    }

    pub fn table_mut(&mut self, kind: EntityKind) -> GymResult<&mut EntityTable> {
        self.tables
            .get_mut(&kind)
            .ok_or_else(|| GymError::TableNotFound(kind.table_name().to_string()))
    }

    /// Position of the student row with the given surrogate id.
    pub fn student_row(&self, student_id: i64) -> GymResult<usize> {
        let students = self.table(EntityKind::Student)?;
        let col = students.require_column("STUDENT_ID")?;
        students
            .find(col, &super::value::Value::Integer(student_id))
            .ok_or(GymError::RecordNotFound {
                table: "students".to_string(),
                key: student_id,
            })
    }

    /// Position of the class row with the given id.
    pub fn class_row(&self, class_id: i64) -> GymResult<usize> {
        let classes = self.table(EntityKind::Class)?;
        let col = classes.require_column("CLASS_ID")?;
        classes
            .find(col, &super::value::Value::Integer(class_id))
            .ok_or(GymError::RecordNotFound {
                table: "classes".to_string(),
                key: class_id,
            })
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
