//! `aula onboard` — First-time setup.

use aula_config::AppConfig;
use aula_core::student::StudentRepository;
use aula_store::JsonFileStore;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    println!("Aula — First-Time Setup");
    println!("=======================\n");

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete it and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config at: {}", config_path.display());
    }

    let config = super::load_config(Some(&config_path))?;
    let roster_path = &config.store.path;
    if roster_path.exists() {
        println!("   Roster file exists: {}", roster_path.display());
    } else {
        JsonFileStore::new(roster_path).save().await?;
        println!("✅ Created empty roster: {}", roster_path.display());
    }

    println!("\n📝 Next steps:");
    println!("   1. ollama pull {}", config.default_model);
    println!("   2. aula serve");
    println!(
        "   3. Open http://{}:{} and start chatting!\n",
        config.gateway.host, config.gateway.port
    );

    Ok(())
}
