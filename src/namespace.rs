use std::fmt;

use serde::{
    de::{Error as SerdeDeError, Unexpected},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

use crate::error::{Error, Result};

/// The database and collection a write targets. Neither name is ever empty.
///
/// A namespace can only be obtained through [`Namespace::new`] or deserialization, both of which
/// reject empty names:
///
/// ```compile_fail
/// use mongodb_write_core::Namespace;
///
/// let ns = Namespace { db: String::new(), coll: String::new() };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    db: String,
    coll: String,
}

impl Namespace {
    /// Construct a `Namespace` with the given database and collection. Neither name may be empty.
    pub fn new(db: impl Into<String>, coll: impl Into<String>) -> Result<Self> {
        let (db, coll) = (db.into(), coll.into());
        if db.is_empty() {
            return Err(Error::invalid_argument("database name cannot be empty"));
        }
        if coll.is_empty() {
            return Err(Error::invalid_argument("collection name cannot be empty"));
        }
        Ok(Self { db, coll })
    }

    /// The name of the database.
    pub fn db(&self) -> &str {
        &self.db
    }

    /// The name of the collection.
    pub fn coll(&self) -> &str {
        &self.coll
    }

    pub(crate) fn from_str(s: &str) -> Option<Self> {
        let mut parts = s.split('.');

        let db = parts.next();
        let coll = parts.collect::<Vec<_>>().join(".");

        match (db, coll) {
            (Some(db), coll) if !db.is_empty() && !coll.is_empty() => Some(Self {
                db: db.to_string(),
                coll,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}.{}", self.db, self.coll)
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Self::from_str(&s).ok_or_else(|| {
            D::Error::invalid_value(Unexpected::Str(&s), &"a namespace of the form db.coll")
        })
    }
}

impl Serialize for Namespace {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::Namespace;

    #[test]
    fn new_rejects_empty_names() {
        assert!(Namespace::new("", "coll").is_err());
        assert!(Namespace::new("db", "").is_err());

        let ns = Namespace::new("db", "coll").unwrap();
        assert_eq!(ns.to_string(), "db.coll");
    }

    #[test]
    fn from_str_keeps_dotted_collection_names() {
        let ns = Namespace::from_str("db.system.views").unwrap();
        assert_eq!(ns.db(), "db");
        assert_eq!(ns.coll(), "system.views");

        assert!(Namespace::from_str("db").is_none());
        assert!(Namespace::from_str(".coll").is_none());
    }

    #[test]
    fn deserialize_rejects_empty_names() {
        for value in ["", ".", "db.", ".coll"] {
            let result: std::result::Result<Namespace, _> =
                crate::bson::from_bson(crate::bson::Bson::String(value.to_string()));
            assert!(result.is_err(), "{:?} should be rejected", value);
        }
    }

    #[test]
    fn serde_round_trips_as_string() {
        let ns = Namespace::new("db", "coll").unwrap();
        let bson = crate::bson::to_bson(&ns).unwrap();
        assert_eq!(bson.as_str(), Some("db.coll"));
        let parsed: Namespace = crate::bson::from_bson(bson).unwrap();
        assert_eq!(parsed, ns);
    }
}
