// Legacy flat-file record store adapter: indexed tables, scoped update
// sessions, per-record focused edits with typed field coercion.
pub mod field;
pub mod session;
pub mod store;
pub mod table;

pub use field::{LegacyType, LegacyValue};
pub use session::{LegacySession, RecordEdit};
pub use store::{LegacyStore, CLASS_TABLE, STUDENT_PREV_TABLE, STUDENT_TABLE};
pub use table::{LegacyRecord, LegacyTable, CLASS_SLOTS};
