//! Contains the check that keeps retryable writes away from deployments that cannot support them.
//!
//! Retryable writes attach a transaction number to every write. Storage engines without
//! document-level locking (such as MMAPv1) cannot track transaction numbers and reject such writes
//! with error code 20. That rejection is replaced with an error telling the user how to turn
//! retryable writes off, with the server's error kept as its [`source`](std::error::Error::source).

use crate::error::{Error, ErrorKind};

/// The error code the server reports for an operation it does not allow.
pub const ILLEGAL_OPERATION_CODE: i32 = 20;

/// The message of the error returned when a deployment cannot execute retryable writes.
pub const RETRYABLE_WRITES_UNSUPPORTED_MESSAGE: &str = "This MongoDB deployment does not support \
                                                        retryable writes. Please add \
                                                        retryWrites=false to your connection \
                                                        string.";

/// Whether `error` is the server reporting that it cannot track transaction numbers.
pub fn is_transaction_numbers_unsupported(error: &Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Command(command_error) => {
            command_error.code == ILLEGAL_OPERATION_CODE
                && command_error.message.starts_with("Transaction numbers")
        }
        _ => false,
    }
}

/// Replaces the server's transaction-numbers rejection with
/// [`ErrorKind::RetryableWritesNotSupported`], chaining the rejection as the cause. Any other
/// error is returned unchanged.
pub(crate) fn convert_unsupported_error(error: Error) -> Error {
    if !is_transaction_numbers_unsupported(&error) {
        return error;
    }

    let converted = Error::new(
        ErrorKind::RetryableWritesNotSupported {
            message: RETRYABLE_WRITES_UNSUPPORTED_MESSAGE.to_string(),
        },
        None::<Vec<String>>,
    )
    .with_source(error);

    #[cfg(feature = "tracing-unstable")]
    crate::trace::retryable_writes_unsupported(&converted);

    converted
}
