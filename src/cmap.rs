//! Contains the traits through which write operations obtain connections and reach a server.
//!
//! Connection pooling, server selection, and wire encoding live outside of this crate. A driver
//! front end supplies them by implementing [`WriteBinding`] (for blocking callers) or
//! [`AsyncWriteBinding`] (for `async` and callback callers).
//!
//! Connections are owned values. Dropping a connection returns it to whatever it was acquired
//! from, so every acquired connection is released exactly once, including when an in-flight
//! `async` write is cancelled by dropping its future.

use crate::{
    error::Result,
    operation::WriteBatch,
    options::ServerAddress,
    results::{BulkWriteResult, WriteConcernResult},
    BoxFuture,
};

/// The first wire version that supports the `insert`, `update`, and `delete` write commands
/// (server 2.6).
pub const WRITE_COMMANDS_WIRE_VERSION: i32 = 2;

/// Contains information about a given server in a format digestible by a connection.
#[derive(Debug, Default, Clone, PartialEq)]
#[non_exhaustive]
pub struct StreamDescription {
    /// The address of the server.
    pub server_address: ServerAddress,

    /// The maximum wire version that the server understands.
    pub max_wire_version: Option<i32>,
}

impl StreamDescription {
    /// Describes a connection to the server at `server_address` that negotiated the given maximum
    /// wire version.
    pub fn new(server_address: ServerAddress, max_wire_version: impl Into<Option<i32>>) -> Self {
        Self {
            server_address,
            max_wire_version: max_wire_version.into(),
        }
    }

    /// Whether the server accepts batched write commands.
    pub fn supports_write_commands(&self) -> bool {
        self.max_wire_version
            .is_some_and(|version| version >= WRITE_COMMANDS_WIRE_VERSION)
    }

    /// Gets a description of a stream for a connection to a server with the provided
    /// maxWireVersion.
    #[cfg(test)]
    pub(crate) fn with_wire_version(max_wire_version: i32) -> Self {
        Self::new(ServerAddress::default(), max_wire_version)
    }
}

/// A connection to a server that blocks the calling thread while it performs I/O.
pub trait Connection {
    /// The description negotiated when this connection was established.
    fn stream_description(&self) -> &StreamDescription;

    /// Asks the server whether it can track the transaction numbers that retryable writes attach
    /// to each write. A deployment that cannot reports error code 20 with a message starting with
    /// `Transaction numbers`.
    ///
    /// The default implementation reports support.
    fn check_retryable_writes(&mut self) -> Result<()> {
        Ok(())
    }

    /// Sends the batch one request at a time through the legacy write protocol. For acknowledged
    /// batches each request is followed by a `getLastError` command; see
    /// [`operation::legacy`](crate::operation::legacy) for helpers that build and interpret it.
    fn execute_legacy_write(&mut self, batch: &WriteBatch) -> Result<WriteConcernResult>;

    /// Sends the batch as a single write command. A reply carrying write errors or a write concern
    /// error must be reported as an [`ErrorKind::BulkWrite`](crate::error::ErrorKind::BulkWrite)
    /// error; see [`operation::command`](crate::operation::command) for helpers that build and
    /// interpret the command.
    fn execute_command_write(&mut self, batch: &WriteBatch) -> Result<BulkWriteResult>;
}

/// A source of blocking connections.
pub trait WriteBinding {
    /// The connection type this binding hands out.
    type Connection: Connection;

    /// Checks out a connection suitable for writes.
    fn acquire_connection(&self) -> Result<Self::Connection>;
}

/// The asynchronous counterpart of [`Connection`].
pub trait AsyncConnection: Send {
    /// The description negotiated when this connection was established.
    fn stream_description(&self) -> &StreamDescription;

    /// See [`Connection::check_retryable_writes`].
    fn check_retryable_writes(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    /// See [`Connection::execute_legacy_write`].
    fn execute_legacy_write<'a>(
        &'a mut self,
        batch: &'a WriteBatch,
    ) -> BoxFuture<'a, Result<WriteConcernResult>>;

    /// See [`Connection::execute_command_write`].
    fn execute_command_write<'a>(
        &'a mut self,
        batch: &'a WriteBatch,
    ) -> BoxFuture<'a, Result<BulkWriteResult>>;
}

/// A source of asynchronous connections.
pub trait AsyncWriteBinding: Send + Sync {
    /// The connection type this binding hands out.
    type Connection: AsyncConnection;

    /// Checks out a connection suitable for writes.
    fn acquire_connection(&self) -> BoxFuture<'_, Result<Self::Connection>>;
}

#[cfg(test)]
mod test {
    use super::StreamDescription;

    #[test]
    fn write_commands_require_wire_version_two() {
        assert!(!StreamDescription::default().supports_write_commands());
        assert!(!StreamDescription::with_wire_version(0).supports_write_commands());
        assert!(!StreamDescription::with_wire_version(1).supports_write_commands());
        assert!(StreamDescription::with_wire_version(2).supports_write_commands());
        assert!(StreamDescription::with_wire_version(17).supports_write_commands());
    }
}
