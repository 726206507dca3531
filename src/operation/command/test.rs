use pretty_assertions::assert_eq;

use crate::{
    bson::doc,
    error::ErrorKind,
    operation::{
        command::{build_write_command, parse_write_command_response},
        DeleteRequest,
        ReplaceRequest,
        UpdateRequest,
        WriteBatch,
        WriteKind,
        WriteRequests,
    },
    options::{ServerAddress, WriteConcern, WriteOptions},
    results::{BulkWriteResult, BulkWriteUpsert},
    Namespace,
};

fn batch(requests: WriteRequests, options: WriteOptions) -> WriteBatch {
    WriteBatch::new(Namespace::new("db", "coll").unwrap(), requests, &options).unwrap()
}

#[test]
fn build_insert() {
    let batch = batch(
        WriteRequests::Insert(vec![doc! { "x": 1 }.into(), doc! { "x": 2 }.into()]),
        WriteOptions::default(),
    );

    assert_eq!(
        build_write_command(&batch).unwrap(),
        doc! {
            "insert": "coll",
            "documents": [{ "x": 1 }, { "x": 2 }],
            "ordered": true,
        }
    );
}

#[test]
fn build_update_with_options() {
    let options = WriteOptions::builder()
        .ordered(false)
        .write_concern(WriteConcern::majority())
        .bypass_document_validation(true)
        .build();
    let batch = batch(
        WriteRequests::Update(vec![
            UpdateRequest::builder()
                .filter(doc! { "x": 1 })
                .update(doc! { "$inc": { "x": 1 } })
                .multi(true)
                .build(),
            UpdateRequest::builder()
                .filter(doc! { "y": 1 })
                .update(vec![doc! { "$set": { "y": 2 } }])
                .upsert(true)
                .build(),
        ]),
        options,
    );

    let command = build_write_command(&batch).unwrap();
    assert_eq!(
        command,
        doc! {
            "update": "coll",
            "updates": [
                { "q": { "x": 1 }, "u": { "$inc": { "x": 1 } }, "upsert": false, "multi": true },
                { "q": { "y": 1 }, "u": [{ "$set": { "y": 2 } }], "upsert": true, "multi": false },
            ],
            "ordered": false,
            "writeConcern": { "w": "majority" },
            "bypassDocumentValidation": true,
        }
    );
    assert_eq!(command.keys().next().map(String::as_str), Some("update"));
}

#[test]
fn build_replace_and_delete() {
    let replace = batch(
        WriteRequests::Replace(vec![ReplaceRequest::builder()
            .filter(doc! { "_id": 1 })
            .replacement(doc! { "_id": 1, "name": "new" })
            .build()]),
        WriteOptions::default(),
    );
    assert_eq!(
        build_write_command(&replace).unwrap(),
        doc! {
            "update": "coll",
            "updates": [
                { "q": { "_id": 1 }, "u": { "_id": 1, "name": "new" }, "upsert": false, "multi": false },
            ],
            "ordered": true,
        }
    );

    let delete = batch(
        WriteRequests::Delete(vec![
            DeleteRequest::one(doc! { "a": 1 }),
            DeleteRequest::many(doc! {}),
        ]),
        WriteOptions::default(),
    );
    assert_eq!(
        build_write_command(&delete).unwrap(),
        doc! {
            "delete": "coll",
            "deletes": [
                { "q": { "a": 1 }, "limit": 1_i64 },
                { "q": {}, "limit": 0_i64 },
            ],
            "ordered": true,
        }
    );
}

#[test]
fn parse_success() {
    let address = ServerAddress::default();

    let result =
        parse_write_command_response(WriteKind::Insert, doc! { "ok": 1, "n": 3 }, address.clone())
            .unwrap();
    assert_eq!(result, BulkWriteResult::empty().with_inserted_count(3));

    let result = parse_write_command_response(
        WriteKind::Update,
        doc! {
            "ok": 1.0,
            "n": 3,
            "nModified": 1,
            "upserted": [{ "index": 2, "_id": "x" }],
        },
        address.clone(),
    )
    .unwrap();
    assert_eq!(
        result,
        BulkWriteResult::empty()
            .with_matched_count(2)
            .with_modified_count(1)
            .with_upserts(vec![BulkWriteUpsert::new(2, "x")])
    );

    let result =
        parse_write_command_response(WriteKind::Delete, doc! { "ok": 1, "n": 4_i64 }, address)
            .unwrap();
    assert_eq!(result, BulkWriteResult::empty().with_removed_count(4));
}

#[test]
fn parse_write_errors() {
    let address = ServerAddress::parse("localhost:27018").unwrap();
    let error = parse_write_command_response(
        WriteKind::Insert,
        doc! {
            "ok": 1,
            "n": 1,
            "writeErrors": [
                { "index": 1, "code": 11000, "errmsg": "E11000 duplicate key error" },
            ],
            "writeConcernError": {
                "code": 64,
                "codeName": "WriteConcernFailed",
                "errmsg": "waiting for replication timed out",
                "errInfo": { "wtimeout": true },
            },
            "errorLabels": ["RetryableWriteError"],
        },
        address.clone(),
    )
    .unwrap_err();

    assert!(error.contains_label("RetryableWriteError"));
    let failure = match *error.kind {
        ErrorKind::BulkWrite(failure) => failure,
        other => panic!("expected bulk write failure, got {:?}", other),
    };
    assert_eq!(failure.result.inserted_count, 1);
    assert_eq!(failure.server_address, address);
    assert_eq!(failure.write_errors.len(), 1);
    assert_eq!(failure.write_errors[0].index, 1);
    assert_eq!(failure.write_errors[0].code, 11000);
    assert_eq!(failure.write_errors[0].details, doc! {});
    let wc_error = failure.write_concern_error.unwrap();
    assert_eq!(wc_error.code, 64);
    assert_eq!(wc_error.code_name, "WriteConcernFailed");
    assert_eq!(wc_error.details, doc! { "wtimeout": true });
}

#[test]
fn parse_command_failure() {
    let error = parse_write_command_response(
        WriteKind::Update,
        doc! {
            "ok": 0,
            "code": 20,
            "codeName": "IllegalOperation",
            "errmsg": "Transaction numbers are only allowed on a replica set member or mongos",
            "errorLabels": ["NoWritesPerformed"],
        },
        ServerAddress::default(),
    )
    .unwrap_err();

    assert_eq!(error.code(), Some(20));
    assert!(error.contains_label("NoWritesPerformed"));
    match error.kind.as_ref() {
        ErrorKind::Command(command_error) => {
            assert_eq!(command_error.code_name, "IllegalOperation");
            assert!(command_error.message.starts_with("Transaction numbers"));
        }
        other => panic!("expected command error, got {:?}", other),
    }

    let error = parse_write_command_response(
        WriteKind::Insert,
        doc! { "ok": 0, "errmsg": "no code" },
        ServerAddress::default(),
    )
    .unwrap_err();
    assert!(matches!(
        error.kind.as_ref(),
        ErrorKind::InvalidResponse { .. }
    ));
}
