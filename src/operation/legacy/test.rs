use std::time::Duration;

use pretty_assertions::assert_eq;

use crate::{
    bson::{doc, Bson},
    error::ErrorKind,
    operation::{
        legacy::{build_get_last_error, parse_get_last_error_response},
        WriteKind,
    },
    options::{Acknowledgment, ServerAddress, WriteConcern},
    results::WriteConcernResult,
};

#[test]
fn build_command() {
    assert_eq!(
        build_get_last_error(&WriteConcern::default()).unwrap(),
        doc! { "getlasterror": 1 }
    );

    let write_concern = WriteConcern::builder()
        .w(Acknowledgment::Nodes(2))
        .w_timeout(Duration::from_millis(500))
        .journal(true)
        .build();
    assert_eq!(
        build_get_last_error(&write_concern).unwrap(),
        doc! { "getlasterror": 1, "w": 2, "wtimeout": 500, "j": true }
    );
}

#[test]
fn parse_success() {
    let address = ServerAddress::default();

    let result = parse_get_last_error_response(
        WriteKind::Update,
        doc! { "ok": 1, "n": 2, "updatedExisting": true, "err": Bson::Null },
        address.clone(),
    )
    .unwrap();
    assert_eq!(result, WriteConcernResult::acknowledged(2, true, None));

    let result = parse_get_last_error_response(
        WriteKind::Replace,
        doc! { "ok": 1.0, "n": 1, "updatedExisting": false, "upserted": "x" },
        address.clone(),
    )
    .unwrap();
    assert_eq!(
        result,
        WriteConcernResult::acknowledged(1, false, Some(Bson::String("x".to_string())))
    );

    let result = parse_get_last_error_response(
        WriteKind::Insert,
        doc! { "ok": 1, "n": 0, "err": Bson::Null },
        address.clone(),
    )
    .unwrap();
    assert_eq!(result.count(), 0);

    let result =
        parse_get_last_error_response(WriteKind::Delete, doc! { "ok": 1, "n": 7_i64 }, address)
            .unwrap();
    assert_eq!(result, WriteConcernResult::acknowledged(7, false, None));
}

#[test]
fn parse_duplicate_key() {
    let reply = doc! {
        "ok": 1,
        "n": 0,
        "err": "E11000 duplicate key error",
        "code": 11000,
    };
    let error = parse_get_last_error_response(WriteKind::Insert, reply.clone(), ServerAddress::default())
        .unwrap_err();

    assert!(error.is_duplicate_key());
    let legacy = error.legacy_write_error().unwrap();
    assert_eq!(legacy.response, reply);
    assert_eq!(legacy.code(), Some(11000));
    assert_eq!(legacy.error_message(), Some("E11000 duplicate key error"));
}

#[test]
fn parse_write_concern_failure() {
    let reply = doc! {
        "ok": 1,
        "n": 1,
        "updatedExisting": true,
        "err": "timeout",
        "code": 64,
        "wtimeout": true,
    };
    let error = parse_get_last_error_response(WriteKind::Update, reply.clone(), ServerAddress::default())
        .unwrap_err();

    assert!(matches!(error.kind.as_ref(), ErrorKind::WriteConcern(_)));
    let legacy = error.legacy_write_error().unwrap();
    assert_eq!(legacy.response, reply);
    assert_eq!(legacy.write_result, WriteConcernResult::acknowledged(1, true, None));

    let error = parse_get_last_error_response(
        WriteKind::Update,
        doc! { "ok": 1, "err": "no code" },
        ServerAddress::default(),
    )
    .unwrap_err();
    assert!(matches!(error.kind.as_ref(), ErrorKind::WriteConcern(_)));
    assert_eq!(error.code(), None);
}

#[test]
fn parse_command_failure() {
    let error = parse_get_last_error_response(
        WriteKind::Delete,
        doc! { "ok": 0, "errmsg": "not master", "code": 10107, "codeName": "NotWritablePrimary" },
        ServerAddress::default(),
    )
    .unwrap_err();

    match error.kind.as_ref() {
        ErrorKind::Command(command_error) => {
            assert_eq!(command_error.code, 10107);
            assert_eq!(command_error.code_name, "NotWritablePrimary");
            assert_eq!(command_error.message, "not master");
        }
        other => panic!("expected command error, got {:?}", other),
    }
}
