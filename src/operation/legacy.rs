//! Helpers for connections that send batches through the legacy write protocol.
//!
//! The legacy protocol has no reply of its own. After each acknowledged request, the connection
//! sends a `getLastError` command and reads the outcome from its reply.

#[cfg(test)]
mod test;

use crate::{
    bson::{doc, Bson, Document},
    bson_util,
    error::{CommandError, Error, ErrorKind, LegacyWriteError, Result, DUPLICATE_KEY_ERROR_CODES},
    operation::WriteKind,
    options::{ServerAddress, WriteConcern},
    results::WriteConcernResult,
};

/// The code reported by `getLastError` when a failed write names no code of its own.
pub const UNKNOWN_ERROR_CODE: i32 = 8;

/// Builds the `getLastError` command that requests `write_concern` for the preceding write.
pub fn build_get_last_error(write_concern: &WriteConcern) -> Result<Document> {
    let mut command = doc! { "getlasterror": 1 };
    command.extend(write_concern.to_document()?);
    Ok(command)
}

/// Interprets a `getLastError` reply for a write of the given kind.
///
/// A reply reporting an error becomes an [`ErrorKind::DuplicateKey`] error when its code is a
/// duplicate key code, and an [`ErrorKind::WriteConcern`] error otherwise; either way the reply
/// itself is the error's response document. A reply with `ok` other than 1 becomes an
/// [`ErrorKind::Command`] error.
pub fn parse_get_last_error_response(
    kind: WriteKind,
    response: Document,
    server_address: ServerAddress,
) -> Result<WriteConcernResult> {
    if response.get("ok").and_then(bson_util::get_int) != Some(1) {
        let code = response
            .get("code")
            .and_then(bson_util::get_int)
            .and_then(|code| i32::try_from(code).ok())
            .unwrap_or(UNKNOWN_ERROR_CODE);
        let message = response
            .get_str("errmsg")
            .or_else(|_| response.get_str("err"))
            .unwrap_or_default();
        let code_name = response.get_str("codeName").unwrap_or_default();
        return Err(CommandError::new(code, code_name, message).into());
    }

    let write_result = write_result(kind, &response);

    // A successful write reports err: null.
    if !matches!(response.get("err"), Some(Bson::String(_))) {
        return Ok(write_result);
    }

    let code = response
        .get("code")
        .and_then(bson_util::get_int)
        .and_then(|code| i32::try_from(code).ok());

    let legacy = LegacyWriteError {
        response,
        server_address,
        write_result,
    };
    let error_kind = match code {
        Some(code) if DUPLICATE_KEY_ERROR_CODES.contains(&code) => ErrorKind::DuplicateKey(legacy),
        _ => ErrorKind::WriteConcern(legacy),
    };
    Err(Error::new(error_kind, None::<Vec<String>>))
}

fn write_result(kind: WriteKind, response: &Document) -> WriteConcernResult {
    let count = match kind {
        WriteKind::Insert => 0,
        _ => response
            .get("n")
            .and_then(bson_util::get_count)
            .unwrap_or(0),
    };
    let updated_existing = response.get_bool("updatedExisting").unwrap_or(false);
    let upserted_id = response.get("upserted").cloned();
    WriteConcernResult::acknowledged(count, updated_existing, upserted_id)
}
