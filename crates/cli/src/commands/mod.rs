pub mod chat;
pub mod doctor;
pub mod onboard;
pub mod serve;
pub mod students;

use aula_config::AppConfig;
use aula_core::student::StudentRepository;
use aula_store::{InMemoryStore, JsonFileStore};
use std::path::Path;
use std::sync::Arc;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_at(path),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// Open the configured roster, or an empty in-memory one.
pub async fn open_store(config: &AppConfig, ephemeral: bool) -> Arc<dyn StudentRepository> {
    if ephemeral {
        return Arc::new(InMemoryStore::new());
    }
    Arc::new(
        JsonFileStore::open(&config.store.path)
            .await
            .with_strict_writes(config.store.strict_writes),
    )
}
