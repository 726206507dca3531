//! Helpers for connections that send batches through the write-command protocol.

#[cfg(test)]
mod test;

use serde::Deserialize;

use crate::{
    bson::{doc, Bson, Document},
    bson_util,
    error::{
        BulkWriteError,
        BulkWriteFailure,
        CommandError,
        Error,
        ErrorKind,
        Result,
        WriteConcernError,
    },
    operation::{WriteBatch, WriteKind, WriteRequests},
    options::ServerAddress,
    results::{BulkWriteResult, BulkWriteUpsert},
};

/// Builds the `insert`, `update`, or `delete` command that carries `batch`.
pub fn build_write_command(batch: &WriteBatch) -> Result<Document> {
    let name = batch.kind().command_name();
    let mut body = doc! {
        name: batch.ns.coll().to_string(),
    };

    match batch.requests {
        WriteRequests::Insert(ref requests) => {
            let documents: Vec<Bson> = requests
                .iter()
                .map(|r| Bson::Document(r.document.clone()))
                .collect();
            body.insert("documents", documents);
        }
        WriteRequests::Update(ref requests) => {
            let updates: Vec<Bson> = requests
                .iter()
                .map(|r| {
                    Bson::Document(doc! {
                        "q": r.filter.clone(),
                        "u": r.update.to_bson(),
                        "upsert": r.upsert,
                        "multi": r.multi,
                    })
                })
                .collect();
            body.insert("updates", updates);
        }
        WriteRequests::Replace(ref requests) => {
            let updates: Vec<Bson> = requests
                .iter()
                .map(|r| {
                    Bson::Document(doc! {
                        "q": r.filter.clone(),
                        "u": r.replacement.clone(),
                        "upsert": r.upsert,
                        "multi": false,
                    })
                })
                .collect();
            body.insert("updates", updates);
        }
        WriteRequests::Delete(ref requests) => {
            let deletes: Vec<Bson> = requests
                .iter()
                .map(|r| {
                    Bson::Document(doc! {
                        "q": r.filter.clone(),
                        "limit": i64::from(r.limit),
                    })
                })
                .collect();
            body.insert("deletes", deletes);
        }
    }

    body.insert("ordered", batch.ordered);

    if !batch.write_concern.is_empty() {
        body.insert("writeConcern", batch.write_concern.to_document()?);
    }

    if let Some(bypass_document_validation) = batch.bypass_document_validation {
        body.insert("bypassDocumentValidation", bypass_document_validation);
    }

    Ok(body)
}

/// A response body useful for deserializing command errors.
#[derive(Deserialize, Debug)]
struct CommandErrorBody {
    #[serde(rename = "errorLabels")]
    error_labels: Option<Vec<String>>,

    #[serde(flatten)]
    command_error: CommandError,
}

impl From<CommandErrorBody> for Error {
    fn from(command_error_response: CommandErrorBody) -> Error {
        Error::new(
            ErrorKind::Command(command_error_response.command_error),
            command_error_response.error_labels,
        )
    }
}

#[derive(Deserialize, Debug)]
struct WriteResponseBody {
    #[serde(default)]
    n: u64,

    #[serde(rename = "nModified")]
    n_modified: Option<u64>,

    upserted: Option<Vec<BulkWriteUpsert>>,

    #[serde(rename = "writeErrors")]
    write_errors: Option<Vec<BulkWriteError>>,

    #[serde(rename = "writeConcernError")]
    write_concern_error: Option<WriteConcernError>,

    #[serde(rename = "errorLabels")]
    labels: Option<Vec<String>>,
}

impl WriteResponseBody {
    fn result(&self, kind: WriteKind) -> BulkWriteResult {
        match kind {
            WriteKind::Insert => BulkWriteResult::empty().with_inserted_count(self.n),
            WriteKind::Update | WriteKind::Replace => {
                let upserts = self.upserted.clone().unwrap_or_default();
                // n counts upserted documents as well as matched ones.
                let matched_count = self.n.saturating_sub(upserts.len() as u64);
                BulkWriteResult::empty()
                    .with_matched_count(matched_count)
                    .with_modified_count(self.n_modified)
                    .with_upserts(upserts)
            }
            WriteKind::Delete => BulkWriteResult::empty().with_removed_count(self.n),
        }
    }
}

/// Interprets the server's reply to a write command built by [`build_write_command`].
///
/// A reply with `ok` other than 1 becomes an [`ErrorKind::Command`] error. A reply carrying write
/// errors or a write concern error becomes an [`ErrorKind::BulkWrite`] error holding the partial
/// result; the reply's `errorLabels` are attached to either.
pub fn parse_write_command_response(
    kind: WriteKind,
    response: Document,
    server_address: ServerAddress,
) -> Result<BulkWriteResult> {
    let ok = response.get("ok").and_then(bson_util::get_int);
    if ok != Some(1) {
        if !response.contains_key("code") {
            return Err(Error::invalid_response(format!(
                "write command failed without an error code: {}",
                response
            )));
        }
        let error_body: CommandErrorBody = crate::bson::from_document(response)?;
        return Err(error_body.into());
    }

    let body: WriteResponseBody = crate::bson::from_document(response)?;
    let result = body.result(kind);

    if body.write_errors.is_none() && body.write_concern_error.is_none() {
        return Ok(result);
    }

    let failure = BulkWriteFailure::new(result, server_address)
        .with_write_errors(body.write_errors.unwrap_or_default())
        .with_write_concern_error(body.write_concern_error);
    Err(Error::new(ErrorKind::BulkWrite(failure), body.labels))
}
