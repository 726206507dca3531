use crate::{
    error::{Error, Result},
    operation::{DeleteRequest, WriteBatch, WriteOperation, WriteRequests},
    options::WriteOptions,
    Namespace,
};

/// Removes the documents matching one or more filters from a collection.
#[derive(Clone, Debug)]
pub struct Delete {
    batch: WriteBatch,
    retry_writes: bool,
}

impl Delete {
    /// Creates an operation applying `requests` to `ns`, in order.
    pub fn new(
        ns: Namespace,
        requests: Vec<DeleteRequest>,
        options: impl Into<Option<WriteOptions>>,
    ) -> Result<Self> {
        if let Some(request) = requests.iter().find(|r| r.limit > 1) {
            return Err(Error::invalid_argument(format!(
                "delete limit must be 0 or 1, got {}",
                request.limit
            )));
        }

        let options = options.into().unwrap_or_default();
        Ok(Self {
            batch: WriteBatch::new(ns, WriteRequests::Delete(requests), &options)?,
            retry_writes: options.retry_writes.unwrap_or(false),
        })
    }
}

impl WriteOperation for Delete {
    fn batch(&self) -> &WriteBatch {
        &self.batch
    }

    fn retry_writes(&self) -> bool {
        self.retry_writes
    }
}
