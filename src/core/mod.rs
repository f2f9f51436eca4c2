// Module declarations
pub mod coerce;
pub mod column;
pub mod data_type;
pub mod error;
pub mod registry;
pub mod row;
pub mod schema;
pub mod table;
pub mod value;

// Re-exports for convenience
pub use column::Column;
pub use data_type::DataType;
pub use error::{GymError, GymResult};
pub use registry::EntityStore;
pub use row::Row;
pub use schema::EntityKind;
pub use table::EntityTable;
pub use value::Value;
