use thiserror::Error;

pub type LionResult<T> = Result<T, LionError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LionError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Out of range: {what} = {value} (expected {min}..={max})")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}
