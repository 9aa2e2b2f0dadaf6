//! Student roster domain — records, lookups and the repository trait.
//!
//! Records carry no identifier; two students with the same name, surname and
//! course are simply two entries. Order is insertion order.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single student record, serialized with the Spanish field names used by
/// the roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "nombre", default, deserialize_with = "scalar_string")]
    pub name: String,

    #[serde(rename = "apellido", default, deserialize_with = "scalar_string")]
    pub surname: String,

    #[serde(rename = "curso", default, deserialize_with = "scalar_string")]
    pub course: String,
}

/// Hand-edited rosters carry courses like `5` or blank fields as `null`.
/// Scalars become their text form and `null` becomes an empty string.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar, found {other}"
        ))),
    }
}

impl Student {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        course: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            course: course.into(),
        }
    }

    /// Confirmation sentence returned after a successful `add`.
    pub fn added_message(&self) -> String {
        format!(
            "Estudiante {} {} agregado correctamente al curso {}.",
            self.name, self.surname, self.course
        )
    }

    fn field(&self, field: LookupField) -> &str {
        match field {
            LookupField::Name => &self.name,
            LookupField::Surname => &self.surname,
        }
    }
}

/// On-disk shape of the roster: `{"alumnos": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub alumnos: Vec<Student>,
}

/// Which field a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupField {
    Name,
    Surname,
}

impl LookupField {
    fn label(self) -> &'static str {
        match self {
            LookupField::Name => "nombre",
            LookupField::Surname => "apellido",
        }
    }
}

/// Outcome of a read-only roster query.
///
/// `Found` always holds at least one record. The other variants carry what
/// was asked for, and their `Display` is the sentence shown to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Vec<Student>),
    NotFound { field: LookupField, query: String },
    Empty,
}

impl Lookup {
    /// Wrap a match list, mapping an empty one to `NotFound`.
    pub fn from_matches(matches: Vec<Student>, field: LookupField, query: &str) -> Self {
        if matches.is_empty() {
            Lookup::NotFound {
                field,
                query: query.to_string(),
            }
        } else {
            Lookup::Found(matches)
        }
    }

    /// Wrap the full roster, mapping an empty one to `Empty`.
    pub fn from_roster(students: Vec<Student>) -> Self {
        if students.is_empty() {
            Lookup::Empty
        } else {
            Lookup::Found(students)
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// The matched records, empty for the not-found variants.
    pub fn students(&self) -> &[Student] {
        match self {
            Lookup::Found(students) => students,
            _ => &[],
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Found(students) => write!(f, "{} estudiante(s) encontrados.", students.len()),
            Lookup::NotFound { field, query } => write!(
                f,
                "No se encontraron estudiantes con el {} \"{}\".",
                field.label(),
                query
            ),
            Lookup::Empty => f.write_str("No hay estudiantes registrados."),
        }
    }
}

/// Case-insensitive substring filter over one field.
pub fn search(students: &[Student], field: LookupField, query: &str) -> Lookup {
    let needle = query.to_lowercase();
    let matches = students
        .iter()
        .filter(|s| s.field(field).to_lowercase().contains(&needle))
        .cloned()
        .collect();
    Lookup::from_matches(matches, field, query)
}

/// The student roster storage abstraction.
///
/// Implementations own the collection and its persistence. Queries have
/// default implementations on top of `snapshot()`.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// A short backend name for logs and diagnostics.
    fn name(&self) -> &str;

    /// (Re)load the collection from the backing medium.
    ///
    /// Never fails: on any error the collection is reset to empty and the
    /// failure is logged.
    async fn load(&self);

    /// Persist the full collection.
    async fn save(&self) -> Result<(), StoreError>;

    /// Append a record, persist, and return the confirmation sentence.
    async fn add(&self, student: Student) -> Result<String, StoreError>;

    /// A copy of the collection in insertion order.
    async fn snapshot(&self) -> Vec<Student>;

    async fn find_by_name(&self, query: &str) -> Lookup {
        search(&self.snapshot().await, LookupField::Name, query)
    }

    async fn find_by_surname(&self, query: &str) -> Lookup {
        search(&self.snapshot().await, LookupField::Surname, query)
    }

    async fn list(&self) -> Lookup {
        Lookup::from_roster(self.snapshot().await)
    }

    async fn len(&self) -> usize {
        self.snapshot().await.len()
    }
}
