// ETL boundary: one-shot bulk load of the converted legacy tables into the
// tabular working copy.
pub mod loader;

pub use loader::load_snapshot;
