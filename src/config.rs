use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

/// Application configuration.
///
/// Priority: CLI args > `GYMBOOK_*` env > config file > defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding the legacy flat-file tables.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Directory holding the ETL snapshot (one JSON file per entity).
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
    /// The school year being administered; selects the current-year
    /// legacy student table.
    #[serde(default = "default_year")]
    pub current_year: i32,
}

fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_snapshot_dir() -> String {
    "./snapshot".to_string()
}
const fn default_year() -> i32 {
    2025
}

impl AppConfig {
    /// Loads configuration from the first config file found, then layers
    /// environment variables on top.
    #[must_use]
    pub fn load() -> Self {
        let config_paths = ["/etc/gymbook/gymbook.toml", "./gymbook.toml"];

        let mut builder = Config::builder();
        for path in &config_paths {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
                break;
            }
        }
        builder = builder.add_source(Environment::with_prefix("GYMBOOK").try_parsing(true));

        builder
            .build()
            .ok()
            .and_then(|c| c.try_deserialize::<Self>().ok())
            .unwrap_or_else(|| Self {
                data_dir: default_data_dir(),
                snapshot_dir: default_snapshot_dir(),
                current_year: default_year(),
            })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            snapshot_dir: default_snapshot_dir(),
            current_year: default_year(),
        }
    }
}
