//! Write concerns and the acknowledgement they request.


use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::skip_serializing_none;
use typed_builder::TypedBuilder;

use crate::{
    bson::{serde_helpers, Document},
    bson_util,
    error::{ErrorKind, Result},
};

/// How much acknowledgement a write asks of the server.
///
/// Only acknowledged writes can use write commands; an unacknowledged write always goes over the
/// legacy protocol with no `getLastError` follow-up. An empty write concern defers to the server's
/// default, which is acknowledged.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[builder(field_defaults(default, setter(into)))]
#[non_exhaustive]
pub struct WriteConcern {
    /// The number or set of servers that must apply the write before it is acknowledged.
    pub w: Option<Acknowledgment>,

    /// How long the server waits for `w` to be satisfied before reporting a write concern error.
    /// The write itself is not undone when this expires.
    #[serde(rename = "wtimeout", alias = "wtimeoutMS")]
    #[serde(serialize_with = "bson_util::serialize_duration_option_as_int_millis")]
    #[serde(deserialize_with = "bson_util::deserialize_duration_option_from_u64_millis")]
    #[serde(default)]
    pub w_timeout: Option<Duration>,

    /// Whether the write must reach the on-disk journal. Requesting it makes even `w: 0`
    /// acknowledged.
    #[serde(rename = "j", alias = "journal")]
    pub journal: Option<bool>,
}

/// The `w` field of a [`WriteConcern`].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Acknowledgment {
    /// A number of servers. `Nodes(0)` asks for no acknowledgement at all.
    Nodes(u32),

    /// A majority of the replica set.
    Majority,

    /// A tag set name defined in the replica set configuration.
    Custom(String),
}

impl Acknowledgment {
    fn from_name(name: String) -> Self {
        match name.as_str() {
            "majority" => Acknowledgment::Majority,
            _ => Acknowledgment::Custom(name),
        }
    }
}

impl Serialize for Acknowledgment {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Acknowledgment::Majority => serializer.serialize_str("majority"),
            Acknowledgment::Nodes(n) => serde_helpers::serialize_u32_as_i32(n, serializer),
            Acknowledgment::Custom(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for Acknowledgment {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NodesOrName {
            Nodes(u32),
            Name(String),
        }
        Ok(match NodesOrName::deserialize(deserializer)? {
            NodesOrName::Nodes(n) => Acknowledgment::Nodes(n),
            NodesOrName::Name(name) => Acknowledgment::from_name(name),
        })
    }
}

impl WriteConcern {
    /// Acknowledged once `n` servers have applied the write.
    pub fn nodes(n: u32) -> Self {
        Acknowledgment::Nodes(n).into()
    }

    /// Acknowledged once a majority of the replica set has applied the write.
    pub fn majority() -> Self {
        Acknowledgment::Majority.into()
    }

    /// `w: 0`; the server reports nothing back.
    pub fn unacknowledged() -> Self {
        Self::nodes(0)
    }

    /// False exactly when `w` is 0 and the journal was not requested.
    pub fn is_acknowledged(&self) -> bool {
        self.w != Some(Acknowledgment::Nodes(0)) || self.journal == Some(true)
    }

    /// Whether no field is set, leaving the server's default in effect.
    pub fn is_empty(&self) -> bool {
        self.w.is_none() && self.w_timeout.is_none() && self.journal.is_none()
    }

    /// Rejects `w: 0` combined with `j: true`.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.w == Some(Acknowledgment::Nodes(0)) && self.journal == Some(true) {
            return Err(ErrorKind::InvalidArgument {
                message: "write concern cannot have w=0 and j=true".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// The write concern as it is sent inside a command.
    pub(crate) fn to_document(&self) -> Result<Document> {
        Ok(crate::bson::to_document(self)?)
    }
}

impl From<Acknowledgment> for WriteConcern {
    fn from(w: Acknowledgment) -> Self {
        WriteConcern {
            w: Some(w),
            ..Default::default()
        }
    }
}
