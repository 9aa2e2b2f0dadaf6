//! `aula doctor` — Diagnose config, roster file, and model backend.

use aula_config::AppConfig;
use aula_core::student::StudentRepository;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Aula Doctor — System Diagnostics");
    println!("================================\n");

    let mut issues = 0;

    // Config
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    if path.exists() {
        println!("  ✅ Config file found: {}", path.display());
    } else {
        println!("  ⚠️  No config file at {} — using defaults (run `aula onboard`)", path.display());
    }

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  Fix the config file and run `aula doctor` again.");
            return Ok(());
        }
    };

    // Roster file
    let roster_path = &config.store.path;
    if roster_path.exists() {
        let store = super::open_store(&config, false).await;
        let count = store.len().await;
        match std::fs::read_to_string(roster_path)
            .ok()
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
        {
            Some(_) => println!("  ✅ Roster file readable: {} ({count} students)", roster_path.display()),
            None => {
                println!("  ❌ Roster file is not valid JSON: {}", roster_path.display());
                issues += 1;
            }
        }
    } else {
        println!(
            "  ⚠️  No roster file at {} — it will be created on the first addition",
            roster_path.display()
        );
    }

    // Model backend
    let router = aula_providers::router::build_from_config(&config);
    match router.default() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => {
                println!("  ✅ Model server reachable: {}", provider.base_url());
                let models = provider.list_models().await.unwrap_or_default();
                if models.iter().any(|m| m == &config.default_model) {
                    println!("  ✅ Model available: {}", config.default_model);
                } else if models.is_empty() {
                    println!("  ⚠️  Could not list models on {}", provider.base_url());
                } else {
                    println!(
                        "  ❌ Model {} not found — run `ollama pull {}`",
                        config.default_model, config.default_model
                    );
                    issues += 1;
                }
            }
            Ok(false) => {
                println!("  ❌ Model server answered with an error: {}", provider.base_url());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Model server unreachable ({e}) — is `ollama serve` running?");
                issues += 1;
            }
        },
        None => {
            println!("  ❌ Provider '{}' is not configured", config.default_provider);
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
