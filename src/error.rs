//! Contains the `Error` and `Result` types that `mongodb-write-core` uses.

pub(crate) mod bulk_write;

use std::{collections::HashSet, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    bson::{Bson, Document},
    bson_util,
    options::ServerAddress,
    results::WriteConcernResult,
};

pub use bulk_write::{BulkWriteError, BulkWriteFailure};

/// Error codes the server uses to report a unique index violation.
pub const DUPLICATE_KEY_ERROR_CODES: [i32; 3] = [11000, 11001, 12582];

/// The result type for all methods that can return an error in the `mongodb-write-core` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `mongodb-write-core` crate. The inner
/// [`ErrorKind`](enum.ErrorKind.html) is wrapped in a `Box` to keep the size of `Result` small.
#[derive(Clone, Debug, Error)]
#[error("Kind: {kind}, labels: {labels:?}, source: {source:?}")]
#[non_exhaustive]
pub struct Error {
    /// The type of error that occurred.
    pub kind: Box<ErrorKind>,

    labels: HashSet<String>,

    #[source]
    pub(crate) source: Option<Box<Error>>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, labels: Option<impl IntoIterator<Item = String>>) -> Self {
        let mut labels: HashSet<String> = labels
            .map(|labels| labels.into_iter().collect())
            .unwrap_or_default();
        if let Some(wc) = kind.get_write_concern_error() {
            labels.extend(wc.labels.clone());
        }
        Self {
            kind: Box::new(kind),
            labels,
            source: None,
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Error {
        ErrorKind::Internal {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn invalid_response(message: impl Into<String>) -> Error {
        ErrorKind::InvalidResponse {
            message: message.into(),
        }
        .into()
    }

    /// Creates an error reporting that a binding could not supply a connection.
    pub fn connection_unavailable(message: impl Into<String>) -> Error {
        ErrorKind::ConnectionUnavailable {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            message: message.into(),
        }
        .into()
    }

    /// Returns the labels for this error.
    pub fn labels(&self) -> &HashSet<String> {
        &self.labels
    }

    /// Whether this error contains the specified label.
    pub fn contains_label<T: AsRef<str>>(&self, label: T) -> bool {
        let label = label.as_ref();
        self.labels().contains(label)
            || self
                .source
                .as_ref()
                .map(|source| source.contains_label(label))
                .unwrap_or(false)
    }

    /// Splits a write-command batch failure and its labels off this error. Any other error is
    /// handed back unchanged.
    pub(crate) fn into_bulk_write_failure(
        self,
    ) -> std::result::Result<(BulkWriteFailure, HashSet<String>), Error> {
        match *self.kind {
            ErrorKind::BulkWrite(failure) => Ok((failure, self.labels)),
            kind => Err(Error {
                kind: Box::new(kind),
                ..self
            }),
        }
    }

    pub(crate) fn with_source<E: Into<Option<Error>>>(mut self, source: E) -> Self {
        self.source = source.into().map(Box::new);
        self
    }

    /// Whether this error was produced by a unique index violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::DuplicateKey(_))
    }

    /// Whether this error reports that the deployment cannot execute retryable writes.
    pub fn is_retryable_writes_not_supported(&self) -> bool {
        matches!(
            self.kind.as_ref(),
            ErrorKind::RetryableWritesNotSupported { .. }
        )
    }

    /// Gets the server-reported code from this error, if applicable.
    pub fn code(&self) -> Option<i32> {
        match self.kind.as_ref() {
            ErrorKind::Command(command_error) => Some(command_error.code),
            ErrorKind::DuplicateKey(e) | ErrorKind::WriteConcern(e) => e.code(),
            ErrorKind::BulkWrite(failure) => failure
                .write_errors
                .last()
                .map(|e| e.code)
                .or_else(|| failure.write_concern_error.as_ref().map(|e| e.code)),
            _ => None,
        }
        .or_else(|| self.source.as_ref().and_then(|s| s.code()))
    }

    /// Gets the server-reported message from this error, if applicable.
    pub fn message(&self) -> Option<String> {
        match self.kind.as_ref() {
            ErrorKind::Command(command_error) => Some(command_error.message.clone()),
            ErrorKind::DuplicateKey(e) | ErrorKind::WriteConcern(e) => {
                e.error_message().map(String::from)
            }
            ErrorKind::RetryableWritesNotSupported { message }
            | ErrorKind::InvalidArgument { message }
            | ErrorKind::InvalidResponse { message } => Some(message.clone()),
            _ => None,
        }
    }

    /// The legacy-shaped error reconstructed for a failed write, if this error carries one.
    pub fn legacy_write_error(&self) -> Option<&LegacyWriteError> {
        match self.kind.as_ref() {
            ErrorKind::DuplicateKey(e) | ErrorKind::WriteConcern(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(err: E) -> Self {
        Error::new(err.into(), None::<Option<String>>)
    }
}

impl From<crate::bson::de::Error> for ErrorKind {
    fn from(err: crate::bson::de::Error) -> Self {
        Self::BsonDeserialization(err)
    }
}

impl From<crate::bson::ser::Error> for ErrorKind {
    fn from(err: crate::bson::ser::Error) -> Self {
        Self::BsonSerialization(err)
    }
}

impl From<crate::bson::document::ValueAccessError> for ErrorKind {
    fn from(err: crate::bson::document::ValueAccessError) -> Self {
        Self::InvalidResponse {
            message: err.to_string(),
        }
    }
}

impl From<BulkWriteFailure> for ErrorKind {
    fn from(failure: BulkWriteFailure) -> Self {
        Self::BulkWrite(failure)
    }
}

impl From<CommandError> for ErrorKind {
    fn from(err: CommandError) -> Self {
        Self::Command(err)
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<std::io::ErrorKind> for ErrorKind {
    fn from(err: std::io::ErrorKind) -> Self {
        Self::Io(Arc::new(err.into()))
    }
}

/// The types of errors that can occur.
#[allow(missing_docs)]
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An invalid argument was provided.
    #[error("An invalid argument was provided: {message}")]
    #[non_exhaustive]
    InvalidArgument { message: String },

    /// Wrapper around `bson::de::Error`.
    #[error("{0}")]
    BsonDeserialization(crate::bson::de::Error),

    /// Wrapper around `bson::ser::Error`.
    #[error("{0}")]
    BsonSerialization(crate::bson::ser::Error),

    /// A batch of writes sent through the write-command protocol failed. Write operations
    /// translate this into [`ErrorKind::DuplicateKey`] or [`ErrorKind::WriteConcern`] before
    /// returning it.
    #[error("An error occurred when trying to execute a write command: {0:?}")]
    BulkWrite(BulkWriteFailure),

    /// The server returned an error to an attempted operation.
    #[error("Command failed: {0}")]
    Command(CommandError),

    /// A write violated a unique index.
    #[error("Duplicate key error: {0}")]
    DuplicateKey(LegacyWriteError),

    /// A write failed, or the server could not satisfy the requested write concern.
    #[error("Write concern error: {0}")]
    WriteConcern(LegacyWriteError),

    /// The deployment cannot track the transaction numbers that retryable writes require.
    #[error("{message}")]
    #[non_exhaustive]
    RetryableWritesNotSupported { message: String },

    #[error("Internal error: {message}")]
    #[non_exhaustive]
    Internal { message: String },

    /// Wrapper around [`std::io::Error`](https://doc.rust-lang.org/std/io/struct.Error.html).
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// The server returned an invalid reply to a database operation.
    #[error("The server returned an invalid reply to a database operation: {message}")]
    #[non_exhaustive]
    InvalidResponse { message: String },

    /// The connection binding could not supply a connection.
    #[error("{message}")]
    #[non_exhaustive]
    ConnectionUnavailable { message: String },
}

impl ErrorKind {
    fn get_write_concern_error(&self) -> Option<&WriteConcernError> {
        match self {
            ErrorKind::BulkWrite(BulkWriteFailure {
                write_concern_error,
                ..
            }) => write_concern_error.as_ref(),
            _ => None,
        }
    }
}

/// An error that occurred due to a database command failing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub struct CommandError {
    /// Identifies the type of error.
    pub code: i32,

    /// The name associated with the error code.
    #[serde(rename = "codeName", default)]
    pub code_name: String,

    /// A description of the error that occurred.
    #[serde(rename = "errmsg", default = "String::new")]
    pub message: String,
}

impl CommandError {
    /// Creates a command error with the given code, code name, and message.
    pub fn new(code: i32, code_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            code_name: code_name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Error code {} ({}): {}",
            self.code, self.code_name, self.message
        )
    }
}

/// An error that occurred due to not being able to satisfy a write concern.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub struct WriteConcernError {
    /// Identifies the type of write concern error.
    pub code: i32,

    /// The name associated with the error code.
    #[serde(rename = "codeName", default)]
    pub code_name: String,

    /// A description of the error that occurred.
    #[serde(alias = "errmsg", default = "String::new")]
    pub message: String,

    /// A document identifying the write concern setting related to the error.
    #[serde(rename = "errInfo", default)]
    pub details: Document,

    /// Labels categorizing the error.
    #[serde(rename = "errorLabels", default)]
    pub(crate) labels: Vec<String>,
}

impl WriteConcernError {
    /// Creates a write concern error with the given code, message, and details.
    pub fn new(code: i32, message: impl Into<String>, details: Document) -> Self {
        Self {
            code,
            code_name: String::new(),
            message: message.into(),
            details,
            labels: Vec::new(),
        }
    }
}

/// A write failure reshaped into the form the legacy write protocol reported it in: the
/// reconstructed getLastError response, the address of the server that reported it, and whatever
/// part of the write succeeded before the failure.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct LegacyWriteError {
    /// The legacy getLastError-shaped response document. Always contains `ok` and `n`; contains
    /// `err` and `code` when the server reported a write error or write concern error.
    pub response: Document,

    /// The address of the server that reported the failure.
    pub server_address: ServerAddress,

    /// The part of the write that succeeded before the failure.
    pub write_result: WriteConcernResult,
}

impl LegacyWriteError {
    /// The `code` field of the response, if any.
    pub fn code(&self) -> Option<i32> {
        self.response
            .get("code")
            .and_then(bson_util::get_int)
            .and_then(|code| i32::try_from(code).ok())
    }

    /// The `err` field of the response, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.response.get("err").and_then(Bson::as_str)
    }
}

impl fmt::Display for LegacyWriteError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{} (code {:?}) reported by {}",
            self.error_message().unwrap_or("no error message"),
            self.code(),
            self.server_address
        )
    }
}
