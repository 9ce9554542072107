//! lion-project: project file format, validation and CSV traces.

pub mod schema;
pub mod trace;
pub mod validate;

pub use schema::*;
pub use trace::{InputTrace, parse_input_trace, read_input_trace, save_states, write_states};
pub use validate::{ValidationError, validate_project};

use std::path::Path;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Trace error at line {line}: {what}")]
    Trace { line: usize, what: String },

    #[error("Unsupported project file extension: {what}")]
    Format { what: String },
}

pub fn load_yaml(path: &Path) -> ProjectResult<Project> {
    let content = std::fs::read_to_string(path)?;
    let project: Project = serde_yaml::from_str(&content)?;
    validate_project(&project)?;
    Ok(project)
}

pub fn save_yaml(path: &Path, project: &Project) -> ProjectResult<()> {
    validate_project(project)?;
    let content = serde_yaml::to_string(project)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<Project> {
    let content = std::fs::read_to_string(path)?;
    let project: Project = serde_json::from_str(&content)?;
    validate_project(&project)?;
    Ok(project)
}

pub fn save_json(path: &Path, project: &Project) -> ProjectResult<()> {
    validate_project(project)?;
    let content = serde_json::to_string_pretty(project)?;
    std::fs::write(path, content)?;
    Ok(())
}

enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> ProjectResult<Format> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("yaml" | "yml") => Ok(Format::Yaml),
        Some("json") => Ok(Format::Json),
        _ => Err(ProjectError::Format {
            what: format!("{} (expected .yaml, .yml or .json)", path.display()),
        }),
    }
}

/// Load a project, choosing YAML or JSON from the file extension.
pub fn load(path: &Path) -> ProjectResult<Project> {
    let project = match format_of(path)? {
        Format::Yaml => load_yaml(path)?,
        Format::Json => load_json(path)?,
    };
    tracing::debug!(path = %path.display(), name = %project.config.name, "project loaded");
    Ok(project)
}

/// Save a project, choosing YAML or JSON from the file extension.
pub fn save(path: &Path, project: &Project) -> ProjectResult<()> {
    match format_of(path)? {
        Format::Yaml => save_yaml(path, project),
        Format::Json => save_json(path, project),
    }
}
