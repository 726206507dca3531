use crate::{
    bson::{Bson, Document},
    cmap::StreamDescription,
    error::{Error, Result},
    operation::{WireProtocol, WriteBatch, WriteKind},
    options::{ServerAddress, DEFAULT_PORT},
    results::WriteConcernResult,
};

pub(crate) const WRITE_TRACING_EVENT_TARGET: &str = "mongodb::write";

pub(crate) trait TracingRepresentation {
    type Representation;

    fn tracing_representation(&self) -> Self::Representation;
}

impl TracingRepresentation for Document {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        Bson::Document(self.clone())
            .into_relaxed_extjson()
            .to_string()
    }
}

impl TracingRepresentation for Error {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        self.to_string()
    }
}

impl TracingRepresentation for WireProtocol {
    type Representation = &'static str;

    fn tracing_representation(&self) -> &'static str {
        match self {
            WireProtocol::Legacy => "legacy",
            WireProtocol::Command => "command",
        }
    }
}

impl ServerAddress {
    pub(crate) fn port_tracing_representation(&self) -> Option<u16> {
        Some(self.port().unwrap_or(DEFAULT_PORT))
    }
}

pub(crate) fn protocol_selected(
    batch: &WriteBatch,
    description: &StreamDescription,
    protocol: WireProtocol,
) {
    tracing::debug!(
        target: WRITE_TRACING_EVENT_TARGET,
        namespace = %batch.ns,
        writeKind = %batch.kind(),
        requestCount = batch.requests.len(),
        acknowledged = batch.write_concern.is_acknowledged(),
        protocol = protocol.tracing_representation(),
        serverHost = description.server_address.host(),
        serverPort = description.server_address.port_tracing_representation(),
        maxWireVersion = description.max_wire_version,
        "Write protocol selected"
    );
}

pub(crate) fn write_completed(batch: &WriteBatch, outcome: &Result<WriteConcernResult>) {
    match outcome {
        Ok(result) => {
            tracing::debug!(
                target: WRITE_TRACING_EVENT_TARGET,
                namespace = %batch.ns,
                writeKind = %batch.kind(),
                acknowledged = result.was_acknowledged(),
                count = result.count(),
                updatedExisting = result.is_updated_existing(),
                "Write succeeded"
            );
        }
        Err(error) => {
            tracing::debug!(
                target: WRITE_TRACING_EVENT_TARGET,
                namespace = %batch.ns,
                writeKind = %batch.kind(),
                failure = error.tracing_representation(),
                "Write failed"
            );
        }
    }
}

pub(crate) fn failure_translated(kind: WriteKind, duplicate_key: bool, response: &Document) {
    tracing::debug!(
        target: WRITE_TRACING_EVENT_TARGET,
        writeKind = %kind,
        duplicateKey = duplicate_key,
        response = response.tracing_representation(),
        "Write command failure translated"
    );
}

pub(crate) fn retryable_writes_unsupported(error: &Error) {
    tracing::debug!(
        target: WRITE_TRACING_EVENT_TARGET,
        failure = error.tracing_representation(),
        "Deployment does not support retryable writes"
    );
}
