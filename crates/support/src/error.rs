use std::fmt::Display;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormError>;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Form value is not a record: {0}")]
    NotARecord(String),

    #[error("Invalid {expected} value: {value:?}")]
    InvalidValue { value: String, expected: &'static str },

    #[error("Contract list mixes includes ({include}) and excludes ({exclude})")]
    MixedSelection { include: String, exclude: String },

    #[error("JSON error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl serde::de::Error for FormError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}
