//! Console-facing command errors.
//!
//! Each variant renders as exactly one output line.

use crate::model::value::FieldDiagnostic;
use crate::service::instance_service::ServiceError;
use crate::model::literal::LiteralError;
use crate::storage::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug)]
pub enum CommandError {
    MissingClassName,
    UnknownClass(String),
    MissingInstanceId,
    InstanceNotFound,
    MissingAttributeName,
    MissingAttributeValue,
    MalformedLiteral(LiteralError),
    InvalidParameters(Vec<FieldDiagnostic>),
    UnterminatedQuote,
    Storage(StorageError),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingClassName => write!(f, "** class name missing **"),
            Self::UnknownClass(_) => write!(f, "** class doesn't exist **"),
            Self::MissingInstanceId => write!(f, "** instance id missing **"),
            Self::InstanceNotFound => write!(f, "** no instance found **"),
            Self::MissingAttributeName => write!(f, "** attribute name missing **"),
            Self::MissingAttributeValue => write!(f, "** value missing **"),
            Self::MalformedLiteral(err) => write!(f, "** malformed literal: {err} **"),
            Self::InvalidParameters(rejected) => {
                write!(f, "** invalid parameter(s): ")?;
                for (index, diagnostic) in rejected.iter().enumerate() {
                    if index > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{diagnostic}")?;
                }
                write!(f, " **")
            }
            Self::UnterminatedQuote => write!(f, "** unterminated quote **"),
            Self::Storage(err) => write!(f, "** storage error: {err} **"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedLiteral(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LiteralError> for CommandError {
    fn from(value: LiteralError) -> Self {
        Self::MalformedLiteral(value)
    }
}

impl From<StorageError> for CommandError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<ServiceError> for CommandError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::NotFound(_) => Self::InstanceNotFound,
            ServiceError::Storage(err) => Self::Storage(err),
        }
    }
}

impl CommandError {
    /// Stable code for structured log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingClassName => "missing_class_name",
            Self::UnknownClass(_) => "unknown_class",
            Self::MissingInstanceId => "missing_instance_id",
            Self::InstanceNotFound => "instance_not_found",
            Self::MissingAttributeName => "missing_attribute_name",
            Self::MissingAttributeValue => "missing_attribute_value",
            Self::MalformedLiteral(_) => "malformed_literal",
            Self::InvalidParameters(_) => "invalid_parameters",
            Self::UnterminatedQuote => "unterminated_quote",
            Self::Storage(_) => "storage_failed",
        }
    }
}
