use std::sync::{Arc, Mutex};

use futures_util::FutureExt;

use crate::{
    bson::Document,
    cmap::{AsyncConnection, AsyncWriteBinding, Connection, StreamDescription, WriteBinding},
    error::{Error, Result},
    operation::{
        command::{build_write_command, parse_write_command_response},
        legacy::{build_get_last_error, parse_get_last_error_response},
        WireProtocol,
        WriteBatch,
    },
    options::ServerAddress,
    results::{BulkWriteResult, WriteConcernResult},
    BoxFuture,
};

/// How the simulated server responds.
#[derive(Clone, Debug)]
pub(crate) struct ServerBehavior {
    /// The wire version negotiated by every connection.
    pub(crate) max_wire_version: Option<i32>,

    /// The reply to a write command, or to `getLastError` for legacy writes.
    pub(crate) reply: Document,

    /// Returned by the write itself instead of interpreting `reply`.
    pub(crate) write_error: Option<Error>,

    /// Returned by the retryable writes probe.
    pub(crate) retryable_writes_error: Option<Error>,

    /// Returned instead of a connection.
    pub(crate) acquire_error: Option<Error>,

    /// Writes never complete.
    pub(crate) hang: bool,

    /// Async writes panic.
    pub(crate) panic: bool,
}

impl ServerBehavior {
    pub(crate) fn replying(max_wire_version: i32, reply: Document) -> Self {
        Self {
            max_wire_version: Some(max_wire_version),
            reply,
            write_error: None,
            retryable_writes_error: None,
            acquire_error: None,
            hang: false,
            panic: false,
        }
    }

    pub(crate) fn failing_write(mut self, error: Error) -> Self {
        self.write_error = Some(error);
        self
    }

    pub(crate) fn failing_retryable_writes_check(mut self, error: Error) -> Self {
        self.retryable_writes_error = Some(error);
        self
    }

    pub(crate) fn failing_acquire(mut self, error: Error) -> Self {
        self.acquire_error = Some(error);
        self
    }

    pub(crate) fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub(crate) fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }
}

/// What the simulated server observed.
#[derive(Clone, Debug, Default)]
pub(crate) struct ServerLog {
    pub(crate) acquired: usize,
    pub(crate) released: usize,
    pub(crate) retryable_writes_checks: usize,
    pub(crate) protocols: Vec<WireProtocol>,
    pub(crate) commands: Vec<Document>,
}

/// A binding to a simulated server, usable from blocking and async code alike.
#[derive(Clone, Debug)]
pub(crate) struct MockBinding {
    behavior: ServerBehavior,
    log: Arc<Mutex<ServerLog>>,
}

impl MockBinding {
    pub(crate) fn new(behavior: ServerBehavior) -> Self {
        Self {
            behavior,
            log: Default::default(),
        }
    }

    pub(crate) fn log(&self) -> ServerLog {
        self.log.lock().unwrap().clone()
    }

    fn connect(&self) -> Result<MockConnection> {
        if let Some(ref error) = self.behavior.acquire_error {
            return Err(error.clone());
        }
        self.log.lock().unwrap().acquired += 1;
        Ok(MockConnection {
            description: StreamDescription::new(
                ServerAddress::default(),
                self.behavior.max_wire_version,
            ),
            behavior: self.behavior.clone(),
            log: self.log.clone(),
        })
    }
}

impl WriteBinding for MockBinding {
    type Connection = MockConnection;

    fn acquire_connection(&self) -> Result<MockConnection> {
        self.connect()
    }
}

impl AsyncWriteBinding for MockBinding {
    type Connection = MockConnection;

    fn acquire_connection(&self) -> BoxFuture<'_, Result<MockConnection>> {
        async move { self.connect() }.boxed()
    }
}

#[derive(Debug)]
pub(crate) struct MockConnection {
    description: StreamDescription,
    behavior: ServerBehavior,
    log: Arc<Mutex<ServerLog>>,
}

impl MockConnection {
    fn command_write(&mut self, batch: &WriteBatch) -> Result<BulkWriteResult> {
        let command = build_write_command(batch)?;
        {
            let mut log = self.log.lock().unwrap();
            log.protocols.push(WireProtocol::Command);
            log.commands.push(command);
        }

        if let Some(ref error) = self.behavior.write_error {
            return Err(error.clone());
        }
        parse_write_command_response(
            batch.kind(),
            self.behavior.reply.clone(),
            self.description.server_address.clone(),
        )
    }

    fn legacy_write(&mut self, batch: &WriteBatch) -> Result<WriteConcernResult> {
        self.log.lock().unwrap().protocols.push(WireProtocol::Legacy);

        if let Some(ref error) = self.behavior.write_error {
            return Err(error.clone());
        }
        if !batch.write_concern.is_acknowledged() {
            return Ok(WriteConcernResult::unacknowledged());
        }

        let command = build_get_last_error(&batch.write_concern)?;
        self.log.lock().unwrap().commands.push(command);
        parse_get_last_error_response(
            batch.kind(),
            self.behavior.reply.clone(),
            self.description.server_address.clone(),
        )
    }

    fn check(&mut self) -> Result<()> {
        self.log.lock().unwrap().retryable_writes_checks += 1;
        match self.behavior.retryable_writes_error {
            Some(ref error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.released += 1;
        }
    }
}

impl Connection for MockConnection {
    fn stream_description(&self) -> &StreamDescription {
        &self.description
    }

    fn check_retryable_writes(&mut self) -> Result<()> {
        self.check()
    }

    fn execute_legacy_write(&mut self, batch: &WriteBatch) -> Result<WriteConcernResult> {
        self.legacy_write(batch)
    }

    fn execute_command_write(&mut self, batch: &WriteBatch) -> Result<BulkWriteResult> {
        self.command_write(batch)
    }
}

impl AsyncConnection for MockConnection {
    fn stream_description(&self) -> &StreamDescription {
        &self.description
    }

    fn check_retryable_writes(&mut self) -> BoxFuture<'_, Result<()>> {
        async move { self.check() }.boxed()
    }

    fn execute_legacy_write<'a>(
        &'a mut self,
        batch: &'a WriteBatch,
    ) -> BoxFuture<'a, Result<WriteConcernResult>> {
        async move {
            if self.behavior.hang {
                futures_util::future::pending::<()>().await;
            }
            self.legacy_write(batch)
        }
        .boxed()
    }

    fn execute_command_write<'a>(
        &'a mut self,
        batch: &'a WriteBatch,
    ) -> BoxFuture<'a, Result<BulkWriteResult>> {
        async move {
            if self.behavior.hang {
                futures_util::future::pending::<()>().await;
            }
            if self.behavior.panic {
                panic!("simulated server crashed mid-write");
            }
            self.command_write(batch)
        }
        .boxed()
    }
}
