use std::future::Future;

use tokio::runtime::Handle;

use crate::error::{Error, Result};

/// Gets a handle to the tokio runtime the caller is running on.
pub(crate) fn current() -> Result<Handle> {
    Handle::try_current().map_err(|e| {
        Error::internal(format!(
            "callback execution requires a tokio runtime, but none is running: {e}"
        ))
    })
}

/// Spawn a task in the background to run a future, without waiting for its output.
pub(crate) fn execute<F>(handle: &Handle, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    // Dropping the join handle detaches the task.
    drop(handle.spawn(fut));
}
