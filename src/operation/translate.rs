//! Reshapes write-command outcomes into the form the legacy write protocol reported them in.


use std::collections::HashSet;

use crate::{
    bson::{Bson, Document},
    bson_util,
    error::{BulkWriteFailure, Error, ErrorKind, LegacyWriteError, DUPLICATE_KEY_ERROR_CODES},
    operation::WriteKind,
    results::{BulkWriteResult, WriteConcernResult},
};

/// Converts the result of a successful write command into a [`WriteConcernResult`].
///
/// Inserts report a count of 0, deletes report the number of documents removed, and updates and
/// replacements report the number of documents matched plus the number upserted. An update or
/// replacement that upserted nothing is reported as having updated an existing document;
/// otherwise the first upserted `_id` is reported.
pub fn translate_bulk_write_result(result: &BulkWriteResult, kind: WriteKind) -> WriteConcernResult {
    match kind {
        WriteKind::Insert => WriteConcernResult::acknowledged(0, false, None),
        WriteKind::Delete => WriteConcernResult::acknowledged(result.removed_count, false, None),
        WriteKind::Update | WriteKind::Replace => {
            let upserted = u64::try_from(result.upserts.len()).unwrap_or(u64::MAX);
            let count = result.matched_count.saturating_add(upserted);
            match result.upserts.first() {
                None => WriteConcernResult::acknowledged(count, true, None),
                Some(upsert) => {
                    WriteConcernResult::acknowledged(count, false, Some(upsert.id.clone()))
                }
            }
        }
    }
}

/// Converts the failure report of a write command into the error the legacy protocol would have
/// produced.
///
/// When the most recently reported write error has a duplicate key code the result is an
/// [`ErrorKind::DuplicateKey`]; every other failure becomes an [`ErrorKind::WriteConcern`]. Both
/// carry a reconstructed `getLastError` response, the reporting server's address, and the
/// translated partial result.
pub fn translate_bulk_write_failure(failure: BulkWriteFailure, kind: WriteKind) -> Error {
    translate_labeled_failure(failure, HashSet::new(), kind)
}

pub(crate) fn translate_labeled_failure(
    failure: BulkWriteFailure,
    labels: HashSet<String>,
    kind: WriteKind,
) -> Error {
    let write_result = translate_bulk_write_result(&failure.result, kind);
    let response = legacy_response(&failure, kind, &write_result);
    let is_duplicate_key = failure
        .last_error()
        .is_some_and(|e| DUPLICATE_KEY_ERROR_CODES.contains(&e.code));

    #[cfg(feature = "tracing-unstable")]
    crate::trace::failure_translated(kind, is_duplicate_key, &response);

    let legacy = LegacyWriteError {
        response,
        server_address: failure.server_address,
        write_result,
    };
    let kind = if is_duplicate_key {
        ErrorKind::DuplicateKey(legacy)
    } else {
        ErrorKind::WriteConcern(legacy)
    };
    Error::new(kind, Some(labels))
}

fn legacy_response(
    failure: &BulkWriteFailure,
    kind: WriteKind,
    write_result: &WriteConcernResult,
) -> Document {
    let mut builder = LegacyResponseBuilder::new(write_result.count());
    if matches!(kind, WriteKind::Update | WriteKind::Replace) {
        builder =
            builder.update_outcome(write_result.is_updated_existing(), write_result.upserted_id());
    }
    if let Some(ref wc_error) = failure.write_concern_error {
        builder = builder.merge_details(&wc_error.details);
    }

    match (failure.last_error(), failure.write_concern_error.as_ref()) {
        (Some(last_error), _) => builder
            .error(&last_error.message, last_error.code)
            .merge_details(&last_error.details),
        (None, Some(wc_error)) => builder.error(&wc_error.message, wc_error.code),
        (None, None) => builder,
    }
    .build()
}

/// Builds a `getLastError`-shaped response document field by field, in insertion order.
///
/// A field set a second time keeps its original position and takes the new value.
#[derive(Clone, Debug, PartialEq)]
pub struct LegacyResponseBuilder {
    response: Document,
}

impl LegacyResponseBuilder {
    /// Starts a response with `ok: 1` and `n` set to `count`.
    pub fn new(count: u64) -> Self {
        let mut response = Document::new();
        response.insert("ok", 1);
        response.insert("n", bson_util::count_to_bson(count));
        Self { response }
    }

    /// Sets `updatedExisting`, followed by `upserted` when a document was upserted.
    pub fn update_outcome(mut self, updated_existing: bool, upserted_id: Option<&Bson>) -> Self {
        self.response.insert("updatedExisting", updated_existing);
        if let Some(id) = upserted_id {
            self.response.insert("upserted", id.clone());
        }
        self
    }

    /// Copies every field of `details` into the response.
    pub fn merge_details(mut self, details: &Document) -> Self {
        for (key, value) in details {
            self.response.insert(key.clone(), value.clone());
        }
        self
    }

    /// Sets the `err` and `code` fields.
    pub fn error(mut self, message: &str, code: i32) -> Self {
        self.response.insert("err", Bson::String(message.to_string()));
        self.response.insert("code", code);
        self
    }

    /// Returns the finished document.
    pub fn build(self) -> Document {
        self.response
    }
}
