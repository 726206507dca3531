use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

use crate::{
    bson::{Bson, Document},
    error::{ErrorKind, Result},
};

/// Coerce numeric types into an `i64` if it would be lossless to do so. If this Bson is not numeric
/// or the conversion would be lossy (e.g. 1.5 -> 1), this returns `None`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn get_int(val: &Bson) -> Option<i64> {
    match *val {
        Bson::Int32(i) => Some(i64::from(i)),
        Bson::Int64(i) => Some(i),
        Bson::Double(f) if (f - (f as i64 as f64)).abs() <= f64::EPSILON => Some(f as i64),
        _ => None,
    }
}

/// Coerce a numeric field into a non-negative count.
pub(crate) fn get_count(val: &Bson) -> Option<u64> {
    get_int(val).and_then(|i| u64::try_from(i).ok())
}

/// Encodes a count the way the server does: as an int32 when it fits, otherwise as an int64.
pub(crate) fn count_to_bson(count: u64) -> Bson {
    match i32::try_from(count) {
        Ok(i) => Bson::Int32(i),
        Err(_) => Bson::Int64(i64::try_from(count).unwrap_or(i64::MAX)),
    }
}

pub(crate) fn serialize_duration_option_as_int_millis<S: Serializer>(
    val: &Option<Duration>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match val {
        Some(duration) if duration.as_millis() > i32::MAX as u128 => {
            serializer.serialize_i64(duration.as_millis() as i64)
        }
        Some(duration) => serializer.serialize_i32(duration.as_millis() as i32),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn deserialize_duration_option_from_u64_millis<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = Option::<u64>::deserialize(deserializer)?;
    Ok(millis.map(Duration::from_millis))
}

pub(crate) fn replacement_document_check(replacement: &Document) -> Result<()> {
    match replacement.keys().find(|key| key.starts_with('$')) {
        None => Ok(()),
        Some(key) => Err(ErrorKind::InvalidArgument {
            message: format!("replacement document must not contain update operators, found {key}"),
        }
        .into()),
    }
}

pub(crate) fn update_document_check(update: &Document) -> Result<()> {
    if update.is_empty() || update.keys().any(|key| !key.starts_with('$')) {
        return Err(ErrorKind::InvalidArgument {
            message: "update document must only contain update operators".to_string(),
        }
        .into());
    }
    Ok(())
}
