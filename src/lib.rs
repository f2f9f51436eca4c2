// gymbook - gymnastics school administration core
// Keeps the tabular working copy and the legacy flat-file record store
// consistent under edits, moves, activations, and billing transitions.

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::missing_const_for_fn)]

// Tabular entity store: typed tables, schemas, coercion helpers
pub mod core;

// Application configuration (file + env)
pub mod config;

// ETL boundary: snapshot bulk load
pub mod etl;

// Legacy flat-file record store adapter
pub mod legacy;

// Reconciliation engine: the sole writer over both stores
pub mod reconcile;

// Read-only search/filter projections
pub mod query;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use core::{
    Column, DataType, EntityKind, EntityStore, EntityTable, GymError, GymResult, Row, Value,
};
pub use etl::load_snapshot;
pub use legacy::{LegacySession, LegacyStore, LegacyTable, LegacyValue, RecordEdit};
pub use query::{filter_classes, search_family, search_student, ClassFilter};
pub use reconcile::{EditKind, Reconciler, RecordType};
