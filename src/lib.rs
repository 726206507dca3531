//! This crate contains the write-execution core shared by MongoDB driver front ends. It decides
//! whether a write is sent through the legacy per-document protocol or the batched write-command
//! protocol, executes it through a caller-supplied connection binding, and normalizes the outcome
//! into the legacy-shaped [`WriteConcernResult`](results::WriteConcernResult) or a legacy-shaped
//! [`Error`](error::Error).
//!
//! Connection acquisition, wire encoding, and server discovery are not provided here; they are
//! consumed through the traits in [`cmap`].
//!
//! # Execution styles
//!
//! Every write operation can be run in three ways with identical results:
//!
//! - blocking, via [`WriteOperation::execute`] and a [`cmap::WriteBinding`],
//! - as a future, via [`WriteOperation::execute_async`] and a [`cmap::AsyncWriteBinding`],
//! - with a completion callback, via [`WriteOperation::execute_with_callback`], which spawns the
//!   future onto the current [`tokio`] runtime and invokes the callback exactly once.
//!
//! ```no_run
//! # use mongodb_write_core::{cmap::WriteBinding, error::Result};
//! # fn run(binding: &impl WriteBinding) -> Result<()> {
//! use mongodb_write_core::{
//!     bson::doc,
//!     operation::{Insert, WriteOperation},
//!     options::{WriteConcern, WriteOptions},
//!     Namespace,
//! };
//!
//! let options = WriteOptions::builder()
//!     .write_concern(WriteConcern::majority())
//!     .build();
//! let insert = Insert::new(
//!     Namespace::new("mydb", "books")?,
//!     vec![doc! { "title": "1984" }],
//!     options,
//! )?;
//! let result = insert.execute(binding)?;
//! assert_eq!(result.count(), 0);
//! # Ok(())
//! # }
//! ```
//!
//! ### All Feature flags
//!
//! | Feature            | Description                                        | Extra dependencies | Default |
//! |:-------------------|:---------------------------------------------------|:-------------------|:--------|
//! | `tracing-unstable` | Emit [`tracing`](https://docs.rs/tracing) events.  | `tracing` 0.1      | no      |

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use ::bson;

mod bson_util;
pub mod cmap;
mod concern;
pub mod error;
mod namespace;
pub mod operation;
pub mod options;
pub mod results;
pub mod retry;
pub(crate) mod runtime;
#[cfg(feature = "tracing-unstable")]
mod trace;

pub use crate::{namespace::Namespace, operation::WriteOperation};

/// A boxed future.
pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;
