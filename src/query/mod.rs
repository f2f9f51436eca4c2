// Read-only projections over the tabular working copy; the presentation
// layer renders these directly.
pub mod classes;
pub mod students;

pub use classes::{filter_classes, ClassFilter, ClassHit};
pub use students::{search_family, search_student, FamilyHit, StudentHit};
