use crate::{
    bson::Document,
    error::Result,
    operation::{InsertRequest, WriteBatch, WriteOperation, WriteRequests},
    options::WriteOptions,
    Namespace,
};

/// Inserts one or more documents into a collection.
#[derive(Clone, Debug)]
pub struct Insert {
    batch: WriteBatch,
    retry_writes: bool,
}

impl Insert {
    /// Creates an operation inserting `documents` into `ns`, in order.
    pub fn new(
        ns: Namespace,
        documents: Vec<Document>,
        options: impl Into<Option<WriteOptions>>,
    ) -> Result<Self> {
        let options = options.into().unwrap_or_default();
        let requests = documents.into_iter().map(InsertRequest::new).collect();
        Ok(Self {
            batch: WriteBatch::new(ns, WriteRequests::Insert(requests), &options)?,
            retry_writes: options.retry_writes.unwrap_or(false),
        })
    }
}

impl WriteOperation for Insert {
    fn batch(&self) -> &WriteBatch {
        &self.batch
    }

    fn retry_writes(&self) -> bool {
        self.retry_writes
    }
}
