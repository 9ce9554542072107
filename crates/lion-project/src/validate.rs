//! Project validation logic.

use crate::schema::{CURRENT_VERSION, Project};
use lion_cell::CellError;
use lion_sim::SimError;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Invalid configuration: {0}")]
    Config(#[from] SimError),

    #[error("Invalid cell parameters: {0}")]
    Params(#[from] CellError),
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > CURRENT_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let config = &project.config;
    if config.name.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "config.name".to_string(),
            value: format!("{:?}", config.name),
            reason: "must not be empty".to_string(),
        });
    }
    if config
        .log
        .dir
        .as_ref()
        .is_some_and(|dir| dir.as_os_str().is_empty())
    {
        return Err(ValidationError::InvalidValue {
            field: "config.log.dir".to_string(),
            value: "\"\"".to_string(),
            reason: "omit the key to disable file logging".to_string(),
        });
    }
    config.validate()?;

    project.params.validate()?;
    Ok(())
}
