#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

use std::fmt;

/// Result type with custom Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error information
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Error {
    /// Type of error and additional information
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub error_type: ErrorType,

    /// Where this error occurred
    pub location: String,
}

/// Possible error types
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    // ? Validation errors
    MissingRequiredField {
        field: String,
    },
    InvalidEnumValue {
        field: String,
        value: String,
    },
    InvalidDateFormat {
        field: String,
        value: String,
    },
    InvalidTimeFormat {
        field: String,
        value: String,
    },
    InvalidEmailFormat {
        value: String,
    },
    EmptyCollectionField {
        field: String,
    },

    // ? Integrity errors
    ReferentialIntegrityError {
        event_id: String,
    },
    UniquenessViolation {
        collection: String,
        field: String,
    },

    // ? General errors
    DatabaseError {
        operation: String,
        collection: String,
    },
    InternalError,
    NotFound,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::MissingRequiredField { field } => {
                write!(f, "missing required field `{field}`")
            }
            ErrorType::InvalidEnumValue { field, value } => {
                write!(f, "`{value}` is not a valid value for `{field}`")
            }
            ErrorType::InvalidDateFormat { field, value } => {
                write!(f, "could not parse `{value}` as a date for `{field}`")
            }
            ErrorType::InvalidTimeFormat { field, value } => {
                write!(f, "could not parse `{value}` as a time for `{field}`")
            }
            ErrorType::InvalidEmailFormat { value } => {
                write!(f, "`{value}` is not a valid email address")
            }
            ErrorType::EmptyCollectionField { field } => {
                write!(f, "`{field}` must contain at least one entry")
            }
            ErrorType::ReferentialIntegrityError { event_id } => {
                write!(f, "event `{event_id}` does not exist")
            }
            ErrorType::UniquenessViolation { collection, field } => {
                write!(f, "duplicate value for `{field}` in `{collection}`")
            }
            ErrorType::DatabaseError {
                operation,
                collection,
            } => write!(f, "database operation `{operation}` on `{collection}` failed"),
            ErrorType::InternalError => write!(f, "internal error"),
            ErrorType::NotFound => write!(f, "not found"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.error_type, self.location)
    }
}

impl std::error::Error for Error {}

#[macro_export]
macro_rules! create_error {
    ( $error: ident $( $tt:tt )? ) => {
        $crate::Error {
            error_type: $crate::ErrorType::$error $( $tt )?,
            location: format!("{}:{}:{}", file!(), line!(), column!()),
        }
    };
}

#[macro_export]
macro_rules! create_database_error {
    ( $operation: expr, $collection: expr ) => {
        create_error!(DatabaseError {
            operation: $operation.to_string(),
            collection: $collection.to_string()
        })
    };
}

#[macro_export]
macro_rules! query {
    ( $self: ident, $type: ident, $collection: expr, $($rest:expr),+ ) => {
        $self.$type($collection, $($rest),+).await
            .map_err(|_| create_database_error!(stringify!($type), $collection))
    };
}
