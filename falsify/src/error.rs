//! Error types for invalid configuration and malformed generator input.

use std::fmt;

/// Errors raised to the caller before a check run starts. Everything that can
/// go wrong *during* a run is reported as a [`Report`](crate::report::Report)
/// value instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A `Bounds` was constructed with an empty range or an origin outside
    /// the declared range.
    InvalidBounds { message: String },

    /// A `Config` field has an unusable value.
    InvalidConfig {
        message: String,
        field: Option<String>,
    },

    /// A selection generator was given no items to select from.
    EmptySelection,

    /// `weighted` was given item and weight lists of different lengths.
    WeightMismatch { items: usize, weights: usize },

    /// A distribution generator was given an out-of-domain parameter.
    InvalidParameter {
        name: &'static str,
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidBounds { message } => {
                write!(f, "Invalid bounds: {}", message)
            }
            Error::InvalidConfig { message, field } => {
                write!(f, "Invalid configuration: {}", message)?;
                if let Some(field_name) = field {
                    write!(f, " (field: {})", field_name)?;
                }
                Ok(())
            }
            Error::EmptySelection => {
                write!(f, "Selection generator requires at least one item")
            }
            Error::WeightMismatch { items, weights } => {
                write!(
                    f,
                    "Item and weight counts differ: {} items, {} weights",
                    items, weights
                )
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "Invalid parameter for `{}`: {}", name, message)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create an invalid-bounds error.
    pub fn bounds(message: impl Into<String>) -> Self {
        Error::InvalidBounds {
            message: message.into(),
        }
    }

    /// Create a configuration error with field information.
    pub fn config(message: impl Into<String>, field: Option<impl Into<String>>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
            field: field.map(|f| f.into()),
        }
    }

    /// Create an invalid distribution/selection parameter error.
    pub fn parameter(name: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}
