//! `aula students` — Query or extend the roster without going through the model.

use aula_core::student::{Lookup, Student, StudentRepository};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum StudentsAction {
    /// Show every student
    List,

    /// Search by name (case-insensitive substring)
    FindName { query: String },

    /// Search by surname (case-insensitive substring)
    FindSurname { query: String },

    /// Add a student and save the roster
    Add {
        nombre: String,
        apellido: String,
        curso: String,
    },
}

pub async fn run(
    config_path: Option<&Path>,
    action: StudentsAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let store = super::open_store(&config, false).await;

    match action {
        StudentsAction::List => print_lookup(store.list().await)?,
        StudentsAction::FindName { query } => print_lookup(store.find_by_name(&query).await)?,
        StudentsAction::FindSurname { query } => {
            print_lookup(store.find_by_surname(&query).await)?
        }
        StudentsAction::Add {
            nombre,
            apellido,
            curso,
        } => {
            let message = store.add(Student::new(nombre, apellido, curso)).await?;
            println!("{message}");
        }
    }

    Ok(())
}

fn print_lookup(lookup: Lookup) -> Result<(), Box<dyn std::error::Error>> {
    match lookup {
        Lookup::Found(students) => println!("{}", serde_json::to_string_pretty(&students)?),
        other => println!("{other}"),
    }
    Ok(())
}
