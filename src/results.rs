//! Contains the types of results returned by write operations.

use serde::{Deserialize, Serialize};

use crate::bson::Bson;

/// The outcome of a write, in the shape the legacy write protocol reported it.
///
/// For unacknowledged writes the server reports nothing, so `count`, `updated_existing`, and
/// `upserted_id` carry no information; check [`WriteConcernResult::was_acknowledged`] first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct WriteConcernResult {
    acknowledged: bool,
    count: u64,
    updated_existing: bool,
    upserted_id: Option<Bson>,
}

impl WriteConcernResult {
    /// Creates a result for a write the server acknowledged.
    pub fn acknowledged(count: u64, updated_existing: bool, upserted_id: Option<Bson>) -> Self {
        Self {
            acknowledged: true,
            count,
            updated_existing,
            upserted_id,
        }
    }

    /// Creates a result for a write the server did not acknowledge.
    pub fn unacknowledged() -> Self {
        Self {
            acknowledged: false,
            count: 0,
            updated_existing: false,
            upserted_id: None,
        }
    }

    /// Whether the server acknowledged the write.
    pub fn was_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// The number of documents affected. Inserts always report 0; deletes report the number of
    /// documents removed; updates and replacements report matched plus upserted documents.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether an update or replacement modified an existing document rather than upserting one.
    pub fn is_updated_existing(&self) -> bool {
        self.updated_existing
    }

    /// The `_id` of the document upserted by an update or replacement, if any.
    pub fn upserted_id(&self) -> Option<&Bson> {
        self.upserted_id.as_ref()
    }
}

/// A document upserted during a write command, identified by its index in the batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct BulkWriteUpsert {
    /// The index of the request in the batch.
    pub index: usize,

    /// The `_id` of the upserted document.
    #[serde(rename = "_id")]
    pub id: Bson,
}

impl BulkWriteUpsert {
    /// Creates an upsert record for the request at `index`.
    pub fn new(index: usize, id: impl Into<Bson>) -> Self {
        Self {
            index,
            id: id.into(),
        }
    }
}

/// The result of a batch sent through the write-command protocol.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct BulkWriteResult {
    /// The number of documents inserted.
    pub inserted_count: u64,

    /// The number of documents matched by updates and replacements.
    pub matched_count: u64,

    /// The number of documents modified by updates and replacements. Servers that do not report
    /// this leave it unset.
    pub modified_count: Option<u64>,

    /// The number of documents deleted.
    pub removed_count: u64,

    /// The documents upserted, in the order the server reported them.
    pub upserts: Vec<BulkWriteUpsert>,
}

impl BulkWriteResult {
    /// A result in which nothing was written.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the number of documents inserted.
    pub fn with_inserted_count(mut self, count: u64) -> Self {
        self.inserted_count = count;
        self
    }

    /// Sets the number of documents matched.
    pub fn with_matched_count(mut self, count: u64) -> Self {
        self.matched_count = count;
        self
    }

    /// Sets the number of documents modified.
    pub fn with_modified_count(mut self, count: impl Into<Option<u64>>) -> Self {
        self.modified_count = count.into();
        self
    }

    /// Sets the number of documents deleted.
    pub fn with_removed_count(mut self, count: u64) -> Self {
        self.removed_count = count;
        self
    }

    /// Sets the upserted documents.
    pub fn with_upserts(mut self, upserts: Vec<BulkWriteUpsert>) -> Self {
        self.upserts = upserts;
        self
    }
}
