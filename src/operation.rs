//! Contains the write operations and the engine that runs them against a connection binding.

pub mod command;
mod delete;
mod insert;
pub mod legacy;
pub mod translate;
mod update;


use std::{fmt, panic::AssertUnwindSafe};

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    bson::{Bson, Document},
    cmap::{AsyncConnection, AsyncWriteBinding, Connection, StreamDescription, WriteBinding},
    error::{Error, Result},
    options::{WriteConcern, WriteOptions},
    results::{BulkWriteResult, WriteConcernResult},
    retry,
    runtime,
    BoxFuture,
    Namespace,
};

pub use delete::Delete;
pub use insert::Insert;
pub use translate::{translate_bulk_write_failure, translate_bulk_write_result, LegacyResponseBuilder};
pub use update::{Replace, Update};

/// The wire protocol a write is sent through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireProtocol {
    /// One message per request, each followed by `getLastError` when acknowledged.
    Legacy,

    /// A single batched `insert`, `update`, or `delete` command.
    Command,
}

/// Chooses the wire protocol for a write. The write-command protocol is used only when the write
/// concern is acknowledged and the server supports write commands; unacknowledged writes always
/// use the legacy protocol so that no reply is awaited.
pub fn select_protocol(
    write_concern: &WriteConcern,
    server_supports_write_commands: bool,
) -> WireProtocol {
    if write_concern.is_acknowledged() && server_supports_write_commands {
        WireProtocol::Command
    } else {
        WireProtocol::Legacy
    }
}

/// The kind of write an operation performs. Fixed for the lifetime of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteKind {
    /// Inserts new documents.
    Insert,

    /// Applies update operators or a pipeline to matching documents.
    Update,

    /// Replaces a matching document wholesale.
    Replace,

    /// Removes matching documents.
    Delete,
}

impl WriteKind {
    /// The name of the write command that carries this kind of write.
    pub fn command_name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update | Self::Replace => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for WriteKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "delete",
        };
        fmt.write_str(name)
    }
}

/// A document to insert.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct InsertRequest {
    /// The document to insert.
    pub document: Document,
}

impl InsertRequest {
    /// Creates a request to insert `document`.
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl From<Document> for InsertRequest {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}

/// Enum modeling the modifications to apply during an update.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum UpdateModifications {
    /// A document that contains only update operator expressions.
    Document(Document),

    /// An aggregation pipeline.
    Pipeline(Vec<Document>),
}

impl UpdateModifications {
    pub(crate) fn to_bson(&self) -> Bson {
        match self {
            UpdateModifications::Document(ref d) => Bson::Document(d.clone()),
            UpdateModifications::Pipeline(ref p) => {
                Bson::Array(p.iter().map(|d| Bson::Document(d.clone())).collect())
            }
        }
    }
}

impl From<Document> for UpdateModifications {
    fn from(item: Document) -> Self {
        UpdateModifications::Document(item)
    }
}

impl From<Vec<Document>> for UpdateModifications {
    fn from(item: Vec<Document>) -> Self {
        UpdateModifications::Pipeline(item)
    }
}

/// An update of the documents matching a filter.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[non_exhaustive]
pub struct UpdateRequest {
    /// Selects the documents to update.
    pub filter: Document,

    /// The modifications to apply.
    #[builder(setter(into))]
    pub update: UpdateModifications,

    /// Insert a document built from the filter and update when nothing matches.
    #[builder(default)]
    pub upsert: bool,

    /// Update every matching document rather than only the first.
    #[builder(default)]
    pub multi: bool,
}

/// A replacement of the first document matching a filter.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[non_exhaustive]
pub struct ReplaceRequest {
    /// Selects the document to replace.
    pub filter: Document,

    /// The new document. It must not contain update operators.
    pub replacement: Document,

    /// Insert the replacement when nothing matches.
    #[builder(default)]
    pub upsert: bool,
}

/// A removal of the documents matching a filter.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct DeleteRequest {
    /// Selects the documents to remove.
    pub filter: Document,

    /// The most documents to remove: 1 removes the first match, 0 removes every match.
    pub limit: u32,
}

impl DeleteRequest {
    /// Removes the first document matching `filter`.
    pub fn one(filter: Document) -> Self {
        Self { filter, limit: 1 }
    }

    /// Removes every document matching `filter`.
    pub fn many(filter: Document) -> Self {
        Self { filter, limit: 0 }
    }
}

/// The requests of a batch, all of one kind.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum WriteRequests {
    /// Documents to insert.
    Insert(Vec<InsertRequest>),

    /// Updates to apply.
    Update(Vec<UpdateRequest>),

    /// Replacements to apply.
    Replace(Vec<ReplaceRequest>),

    /// Removals to apply.
    Delete(Vec<DeleteRequest>),
}

impl WriteRequests {
    /// The kind of write these requests perform.
    pub fn kind(&self) -> WriteKind {
        match self {
            Self::Insert(_) => WriteKind::Insert,
            Self::Update(_) => WriteKind::Update,
            Self::Replace(_) => WriteKind::Replace,
            Self::Delete(_) => WriteKind::Delete,
        }
    }

    /// The number of requests.
    pub fn len(&self) -> usize {
        match self {
            Self::Insert(r) => r.len(),
            Self::Update(r) => r.len(),
            Self::Replace(r) => r.len(),
            Self::Delete(r) => r.len(),
        }
    }

    /// Whether there are no requests.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a connection needs to send a write through either protocol.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct WriteBatch {
    /// The collection written to.
    pub ns: Namespace,

    /// Whether the server stops at the first failed request.
    pub ordered: bool,

    /// The requested acknowledgement. An empty write concern means the server default.
    pub write_concern: WriteConcern,

    /// Opt out of document-level validation.
    pub bypass_document_validation: Option<bool>,

    /// The requests to send, in order.
    pub requests: WriteRequests,
}

impl WriteBatch {
    pub(crate) fn new(ns: Namespace, requests: WriteRequests, options: &WriteOptions) -> Result<Self> {
        if requests.is_empty() {
            return Err(Error::invalid_argument(format!(
                "{} requires at least one request",
                requests.kind()
            )));
        }

        let write_concern = options.write_concern.clone().unwrap_or_default();
        write_concern.validate()?;

        Ok(Self {
            ns,
            ordered: options.ordered.unwrap_or(true),
            write_concern,
            bypass_document_validation: options.bypass_document_validation,
            requests,
        })
    }

    /// The kind of write this batch performs.
    pub fn kind(&self) -> WriteKind {
        self.requests.kind()
    }
}

/// A write that can be executed through a blocking binding, awaited as a future, or run with a
/// completion callback. All three report the same result for the same server behavior.
///
/// Each execution acquires one connection, checks retryable write support when requested, chooses
/// the wire protocol from the write concern and the connection's negotiated wire version, runs the
/// write, and reshapes the outcome into a [`WriteConcernResult`] or a legacy-shaped [`Error`]. The
/// connection is dropped, and therefore released, before the result is reported.
pub trait WriteOperation: Send + Sync {
    /// The batch this operation sends.
    fn batch(&self) -> &WriteBatch;

    /// Whether retryable writes were requested.
    fn retry_writes(&self) -> bool;

    /// The collection written to.
    fn namespace(&self) -> &Namespace {
        &self.batch().ns
    }

    /// The requested acknowledgement.
    fn write_concern(&self) -> &WriteConcern {
        &self.batch().write_concern
    }

    /// Whether the server stops at the first failed request.
    fn is_ordered(&self) -> bool {
        self.batch().ordered
    }

    /// The kind of write this operation performs.
    fn kind(&self) -> WriteKind {
        self.batch().kind()
    }

    /// Executes the write, blocking the calling thread.
    fn execute<B>(&self, binding: &B) -> Result<WriteConcernResult>
    where
        B: WriteBinding + ?Sized,
        Self: Sized,
    {
        let batch = self.batch();
        let mut connection = binding.acquire_connection()?;

        let retrying = checks_retryable_writes(self);
        if retrying {
            connection
                .check_retryable_writes()
                .map_err(retry::convert_unsupported_error)?;
        }

        let outcome = match choose_protocol(batch, connection.stream_description()) {
            WireProtocol::Command => {
                complete_command_write(batch, connection.execute_command_write(batch))
            }
            WireProtocol::Legacy => connection.execute_legacy_write(batch),
        };
        drop(connection);

        complete(batch, retrying, outcome)
    }

    /// Executes the write as a future. Dropping the future before it completes releases the
    /// connection, if one was acquired.
    fn execute_async<'a, B>(&'a self, binding: &'a B) -> BoxFuture<'a, Result<WriteConcernResult>>
    where
        B: AsyncWriteBinding + ?Sized,
        Self: Sized,
    {
        async move {
            let batch = self.batch();
            let mut connection = binding.acquire_connection().await?;

            let retrying = checks_retryable_writes(self);
            if retrying {
                connection
                    .check_retryable_writes()
                    .await
                    .map_err(retry::convert_unsupported_error)?;
            }

            let outcome = match choose_protocol(batch, connection.stream_description()) {
                WireProtocol::Command => {
                    complete_command_write(batch, connection.execute_command_write(batch).await)
                }
                WireProtocol::Legacy => connection.execute_legacy_write(batch).await,
            };
            drop(connection);

            complete(batch, retrying, outcome)
        }
        .boxed()
    }

    /// Executes the write in the background on the current tokio runtime and passes the outcome
    /// to `callback`. The callback is invoked exactly once. If there is no runtime to run on, it is
    /// invoked immediately with an error. If the write panics, or the runtime shuts down before the
    /// write finishes, the callback receives an [`ErrorKind::Internal`](crate::error::ErrorKind)
    /// error; in the shutdown case it runs on the thread dropping the runtime.
    fn execute_with_callback<B, F>(self, binding: B, callback: F)
    where
        B: AsyncWriteBinding + 'static,
        F: FnOnce(Result<WriteConcernResult>) + Send + 'static,
        Self: Sized + 'static,
    {
        let callback = CompletionCallback::new(callback);
        match runtime::current() {
            Ok(handle) => runtime::execute(&handle, async move {
                let outcome = AssertUnwindSafe(self.execute_async(&binding))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| Err(Error::internal("write panicked before completing")));
                callback.complete(outcome);
            }),
            Err(error) => callback.complete(Err(error)),
        }
    }
}

/// Holds a completion callback until it has been invoked. A callback still held when this is
/// dropped is invoked with an error.
struct CompletionCallback<F>
where
    F: FnOnce(Result<WriteConcernResult>),
{
    callback: Option<F>,
}

impl<F> CompletionCallback<F>
where
    F: FnOnce(Result<WriteConcernResult>),
{
    fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    fn complete(mut self, outcome: Result<WriteConcernResult>) {
        if let Some(callback) = self.callback.take() {
            callback(outcome);
        }
    }
}

impl<F> Drop for CompletionCallback<F>
where
    F: FnOnce(Result<WriteConcernResult>),
{
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(Err(Error::internal(
                "write was abandoned before completing because its runtime shut down",
            )));
        }
    }
}

fn checks_retryable_writes(op: &impl WriteOperation) -> bool {
    op.retry_writes() && op.write_concern().is_acknowledged()
}

fn choose_protocol(batch: &WriteBatch, description: &StreamDescription) -> WireProtocol {
    let protocol = select_protocol(&batch.write_concern, description.supports_write_commands());

    #[cfg(feature = "tracing-unstable")]
    crate::trace::protocol_selected(batch, description, protocol);

    protocol
}

fn complete_command_write(
    batch: &WriteBatch,
    outcome: Result<BulkWriteResult>,
) -> Result<WriteConcernResult> {
    let kind = batch.kind();
    match outcome {
        Ok(result) => Ok(translate_bulk_write_result(&result, kind)),
        Err(error) => match error.into_bulk_write_failure() {
            Ok((failure, labels)) => Err(translate::translate_labeled_failure(failure, labels, kind)),
            Err(error) => Err(error),
        },
    }
}

#[cfg_attr(not(feature = "tracing-unstable"), allow(unused_variables))]
fn complete(
    batch: &WriteBatch,
    retrying: bool,
    outcome: Result<WriteConcernResult>,
) -> Result<WriteConcernResult> {
    let outcome = if retrying {
        outcome.map_err(retry::convert_unsupported_error)
    } else {
        outcome
    };

    #[cfg(feature = "tracing-unstable")]
    crate::trace::write_completed(batch, &outcome);

    outcome
}
