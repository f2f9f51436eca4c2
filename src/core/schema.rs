//! Column definitions for every entity table, matching the field names of
//! the legacy flat-file tables (case-preserved, per the ETL load contract).

use serde::{Deserialize, Serialize};

use super::column::Column;
use super::data_type::DataType;
use super::table::EntityTable;

/// Waitlist/trial/makeup slots are a fixed-size block per class.
pub const MAX_TRIAL_SLOTS: i64 = 8;
pub const MAX_WAIT_SLOTS: i64 = 8;
pub const MAX_MAKEUP_SLOTS: i64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Student,
    Guardian,
    Payment,
    Bill,
    Class,
    Roster,
    Note,
    Trial,
    Wait,
    Makeup,
}

impl EntityKind {
    pub const ALL: [Self; 10] = [
        Self::Student,
        Self::Guardian,
        Self::Payment,
        Self::Bill,
        Self::Class,
        Self::Roster,
        Self::Note,
        Self::Trial,
        Self::Wait,
        Self::Makeup,
    ];

    /// Snapshot file stem and table name.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Student => "students",
            Self::Guardian => "guardians",
            Self::Payment => "payments",
            Self::Bill => "bills",
            Self::Class => "classes",
            Self::Roster => "roster",
            Self::Note => "notes",
            Self::Trial => "trials",
            Self::Wait => "waits",
            Self::Makeup => "makeups",
        }
    }
}

fn text(name: &str, required: bool) -> Column {
    Column::new(name, DataType::Text { max_length: None }, required)
}

fn text_w(name: &str, width: usize) -> Column {
    Column::new(
        name,
        DataType::Text {
            max_length: Some(width),
        },
        false,
    )
}

fn int(name: &str, required: bool) -> Column {
    Column::new(name, DataType::Integer, required)
}

fn money(name: &str) -> Column {
    Column::new(name, DataType::Numeric, false)
}

fn date(name: &str) -> Column {
    Column::new(name, DataType::Date, false)
}

fn boolean(name: &str) -> Column {
    Column::new(name, DataType::Boolean, false)
}

/// Builds the empty typed table for an entity kind.
#[must_use]
pub fn table_for(kind: EntityKind) -> EntityTable {
    let columns = match kind {
        EntityKind::Student => vec![
            int("STUDENT_ID", true),
            int("STUDENTNO", true),
            text("FNAME", true),
            text("LNAME", true),
            text_w("ADDRESS", 30),
            text_w("CITY", 20),
            text_w("STATE", 2),
            text_w("ZIP", 10),
            text_w("PHONE", 14),
            date("BIRTHDAY"),
            date("ENROLLDATE"),
            boolean("ACTIVE"),
            int("FAMILY_ID", false),
            money("MONTHLYFEE"),
            money("BALANCE"),
            money("REGFEE"),
        ],
        EntityKind::Guardian => vec![
            int("FAMILY_ID", true),
            text("RELATION", true),
            text_w("NAME", 30),
        ],
        EntityKind::Payment => vec![
            int("STUDENT_ID", true),
            int("MONTH", true),
            int("YEAR", true),
            money("AMOUNT"),
            date("DATEPAID"),
        ],
        EntityKind::Bill => vec![
            int("STUDENT_ID", true),
            int("MONTH", true),
            int("YEAR", true),
        ],
        EntityKind::Class => vec![
            int("CLASS_ID", true),
            text_w("INSTRUCTOR", 20),
            text_w("CLASSNAME", 30),
            text_w("TIME", 10),
            text_w("DAY", 10),
            int("MAX", true),
            int("AVAILABLE", true),
        ],
        EntityKind::Roster => vec![
            int("CLASS_ID", true),
            int("STUDENT_ID", true),
            boolean("ACTIVE"),
        ],
        EntityKind::Note => vec![
            text("OWNER_KIND", true),
            int("OWNER_ID", true),
            text("TEXT", true),
        ],
        EntityKind::Trial => vec![
            int("CLASS_ID", true),
            int("SLOT", true),
            text_w("NAME", 30),
            text_w("PHONE", 14),
            date("DATE"),
        ],
        EntityKind::Wait => vec![
            int("CLASS_ID", true),
            int("SLOT", true),
            text_w("NAME", 30),
            text_w("PHONE", 14),
        ],
        EntityKind::Makeup => vec![
            int("CLASS_ID", true),
            int("SLOT", true),
            text_w("NAME", 30),
            text_w("PHONE", 14),
            date("DATE"),
        ],
    };
    EntityTable::new(kind.table_name().to_string(), columns)
}

/// Max slot count for the three slot-block entity kinds.
#[must_use]
pub const fn slot_capacity(kind: EntityKind) -> Option<i64> {
    match kind {
        EntityKind::Trial => Some(MAX_TRIAL_SLOTS),
        EntityKind::Wait => Some(MAX_WAIT_SLOTS),
        EntityKind::Makeup => Some(MAX_MAKEUP_SLOTS),
        _ => None,
    }
}
