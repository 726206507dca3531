use serde::{Deserialize, Serialize};

use crate::{
    bson::Document,
    error::WriteConcernError,
    options::ServerAddress,
    results::BulkWriteResult,
};

/// An error for one request in a batch of writes.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct BulkWriteError {
    /// Index into the batch of the request that this error corresponds to.
    #[serde(default)]
    pub index: usize,

    /// Identifies the type of write error.
    pub code: i32,

    /// A description of the error that occurred.
    #[serde(rename = "errmsg", default = "String::new")]
    pub message: String,

    /// A document providing more information about the write error (e.g. details
    /// pertaining to document validation).
    #[serde(rename = "errInfo", default)]
    pub details: Document,
}

impl BulkWriteError {
    /// Creates an error for the request at `index`.
    pub fn new(index: usize, code: i32, message: impl Into<String>, details: Document) -> Self {
        Self {
            index,
            code,
            message: message.into(),
            details,
        }
    }
}

/// The failure report of a batch sent through the write-command protocol.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct BulkWriteFailure {
    /// The writes that succeeded before the failure.
    pub result: BulkWriteResult,

    /// The error(s) that occurred on account of a non write concern failure, in the order the
    /// server reported them.
    pub write_errors: Vec<BulkWriteError>,

    /// The error that occurred on account of write concern failure.
    pub write_concern_error: Option<WriteConcernError>,

    /// The address of the server that reported the failure.
    pub server_address: ServerAddress,
}

impl BulkWriteFailure {
    /// Creates a failure report for the given partial result and server address with no errors
    /// attached yet.
    pub fn new(result: BulkWriteResult, server_address: ServerAddress) -> Self {
        Self {
            result,
            write_errors: Vec::new(),
            write_concern_error: None,
            server_address,
        }
    }

    /// Attaches the per-request errors.
    pub fn with_write_errors(mut self, write_errors: Vec<BulkWriteError>) -> Self {
        self.write_errors = write_errors;
        self
    }

    /// Attaches the write concern error.
    pub fn with_write_concern_error(mut self, error: impl Into<Option<WriteConcernError>>) -> Self {
        self.write_concern_error = error.into();
        self
    }

    /// The most recently reported per-request error, if any.
    pub(crate) fn last_error(&self) -> Option<&BulkWriteError> {
        self.write_errors.last()
    }
}
