//! Error types for the grouping models.

use crate::model::{ItemRole, ValueFamily};

/// Result type alias for grouping operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when configuring a grouping model or comparing values.
///
/// A rejected configuration leaves the model in its previous state and emits
/// no notification; the caller may retry with valid input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A column was given but no data provider is installed.
    #[error("no data provider installed")]
    NoProvider,

    /// Column index is not within the provider's columns.
    #[error("column {column} out of range (provider has {column_count} columns)")]
    ColumnOutOfRange { column: usize, column_count: usize },

    /// Column coincides with the pixmap column under the same role.
    #[error("column {column} is reserved for pixmaps under role {role:?}")]
    ReservedPixmapColumn { column: usize, role: ItemRole },

    /// Label index is not within the configured labels.
    #[error("label {index} out of range ({count} labels configured)")]
    LabelOutOfRange { index: usize, count: usize },

    /// The primary label cannot be removed.
    #[error("the primary label cannot be removed")]
    PrimaryLabel,

    /// Two non-null values of different families were compared.
    #[error("cannot compare {left} value with {right} value")]
    FamilyMismatch {
        left: ValueFamily,
        right: ValueFamily,
    },

    /// The value family has no ordering.
    #[error("{0} values have no ordering")]
    UnsupportedFamily(ValueFamily),

    /// Configuration (de)serialization failed.
    #[error("invalid grouping configuration: {0}")]
    Config(String),
}

impl Error {
    /// Create a column range error.
    pub fn column_out_of_range(column: usize, column_count: usize) -> Self {
        Self::ColumnOutOfRange {
            column,
            column_count,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(err.to_string())
    }
}
