//! Gateway error taxonomy.

use crate::model::pet::PetValidationError;
use crate::repo::pet_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Operation kinds accepted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    TypeOf,
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::TypeOf => "type_of",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-level gateway failure.
#[derive(Debug)]
pub enum GatewayError {
    /// The URI matches neither the collection nor the item shape.
    UnrecognizedAddress { operation: Operation, uri: String },
    /// The URI shape does not accept this operation.
    UnsupportedOperation { operation: Operation, uri: String },
    /// Write payload rejected before touching the store.
    Validation(PetValidationError),
    Store(StoreError),
}

impl GatewayError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnrecognizedAddress { .. } => "unrecognized_address",
            Self::UnsupportedOperation { .. } => "unsupported_operation",
            Self::Validation(_) => "validation_failed",
            Self::Store(_) => "store_failed",
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedAddress { operation, uri } => {
                write!(f, "cannot {operation} unknown uri `{uri}`")
            }
            Self::UnsupportedOperation { operation, uri } => {
                write!(f, "{operation} is not supported for `{uri}`")
            }
            Self::Validation(err) => write!(f, "invalid `{}`: {err}", err.field()),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::UnrecognizedAddress { .. } | Self::UnsupportedOperation { .. } => None,
        }
    }
}

impl From<PetValidationError> for GatewayError {
    fn from(value: PetValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for GatewayError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
