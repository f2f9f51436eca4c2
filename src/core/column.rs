use serde::{Deserialize, Serialize};

use super::data_type::DataType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    /// Required at ETL load time; a missing required column fails the load.
    pub required: bool,
}

impl Column {
    #[must_use]
    pub fn new(name: &str, data_type: DataType, required: bool) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            required,
        }
    }
}
