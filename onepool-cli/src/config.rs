use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub database: String,
    pub verbose: bool,
}

impl CliConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.database)
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("onepool"),
            database: "onepool.db".to_string(),
            verbose: false,
        }
    }
}
