use crate::{
    bson_util,
    error::Result,
    operation::{
        ReplaceRequest,
        UpdateModifications,
        UpdateRequest,
        WriteBatch,
        WriteOperation,
        WriteRequests,
    },
    options::WriteOptions,
    Namespace,
};

/// Applies update operators or pipelines to the documents matching one or more filters.
#[derive(Clone, Debug)]
pub struct Update {
    batch: WriteBatch,
    retry_writes: bool,
}

impl Update {
    /// Creates an operation applying `requests` to `ns`, in order. Update documents may only
    /// contain update operators.
    pub fn new(
        ns: Namespace,
        requests: Vec<UpdateRequest>,
        options: impl Into<Option<WriteOptions>>,
    ) -> Result<Self> {
        for request in &requests {
            if let UpdateModifications::Document(ref update) = request.update {
                bson_util::update_document_check(update)?;
            }
        }

        let options = options.into().unwrap_or_default();
        Ok(Self {
            batch: WriteBatch::new(ns, WriteRequests::Update(requests), &options)?,
            retry_writes: options.retry_writes.unwrap_or(false),
        })
    }
}

impl WriteOperation for Update {
    fn batch(&self) -> &WriteBatch {
        &self.batch
    }

    fn retry_writes(&self) -> bool {
        self.retry_writes
    }
}

/// Replaces the first document matching each of one or more filters.
#[derive(Clone, Debug)]
pub struct Replace {
    batch: WriteBatch,
    retry_writes: bool,
}

impl Replace {
    /// Creates an operation applying `requests` to `ns`, in order. Replacement documents must not
    /// contain update operators.
    pub fn new(
        ns: Namespace,
        requests: Vec<ReplaceRequest>,
        options: impl Into<Option<WriteOptions>>,
    ) -> Result<Self> {
        for request in &requests {
            bson_util::replacement_document_check(&request.replacement)?;
        }

        let options = options.into().unwrap_or_default();
        Ok(Self {
            batch: WriteBatch::new(ns, WriteRequests::Replace(requests), &options)?,
            retry_writes: options.retry_writes.unwrap_or(false),
        })
    }
}

impl WriteOperation for Replace {
    fn batch(&self) -> &WriteBatch {
        &self.batch
    }

    fn retry_writes(&self) -> bool {
        self.retry_writes
    }
}
