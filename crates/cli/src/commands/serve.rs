//! `aula serve` — Start the HTTP chat service.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
    ephemeral: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let store = super::open_store(&config, ephemeral).await;

    println!("Aula");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {} ({})", config.default_model, config.default_provider);
    if ephemeral {
        println!("   Roster:    in memory (changes are not saved)");
    } else {
        println!("   Roster:    {}", config.store.path.display());
    }

    aula_gateway::start(config, store).await?;

    Ok(())
}
