//! `aula chat` — Interactive or single-message chat mode.

use aula_agent::{AgentSession, TurnOptions};
use aula_core::student::StudentRepository;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let router = aula_providers::router::build_from_config(&config);
    let provider = router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not configured", config.default_provider))?;

    let store = super::open_store(&config, false).await;
    let students = store.len().await;
    let session = Arc::new(AgentSession::from_config(&config, provider, store));

    let options = TurnOptions { model, temperature };
    let model_name = options
        .model
        .clone()
        .unwrap_or_else(|| config.default_model.clone());

    if let Some(msg) = message {
        eprint!("  Pensando...");
        let reply = session.chat(&msg, options).await?;
        eprint!("\r              \r");
        println!("{}", reply.text);
        return Ok(());
    }

    println!();
    println!("  Aula — Asistente de estudiantes");
    println!();
    println!("  Modelo:      {model_name}");
    println!("  Servidor:    {}", session.provider().base_url());
    println!("  Estudiantes: {students} ({})", config.store.path.display());
    println!();
    println!("  Escribí tu mensaje y presioná Enter.");
    println!("  Escribí 'salir' o Ctrl+C para terminar.");
    println!();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  Tú > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "salir" | "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        match session.chat(line, options.clone()).await {
            Ok(reply) => {
                eprint!("\r     \r");
                println!();
                for text_line in reply.text.lines() {
                    println!("  Asistente > {text_line}");
                }
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  ¡Hasta luego!");
    println!();

    Ok(())
}
