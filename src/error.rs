//! Error taxonomy for an ingestion pass
//!
//! Every variant aborts the pass it occurs in; nothing is retried.

use crate::remote::RemoteError;
use crate::storage::StoreError;
use thiserror::Error;

/// Errors that abort an ingestion pass
#[derive(Error, Debug)]
pub enum IngestError {
    /// An id carried a type prefix outside `t1`..`t6`
    #[error("unknown object kind '{prefix}' in id '{id}'")]
    UnknownObjectKind { id: String, prefix: String },

    /// Reading from or writing to the store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The remote source could not be reached or returned garbage
    #[error("remote fetch failed: {0}")]
    RemoteFetch(#[from] RemoteError),

    /// A comment tree exceeded the walker's depth or resolution bound
    #[error("comment tree of {post_id} exceeded expansion limit: {reason}")]
    ExpansionLimit { post_id: String, reason: String },
}

impl IngestError {
    /// Create an expansion limit error.
    pub fn expansion_limit(post_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExpansionLimit {
            post_id: post_id.into(),
            reason: reason.into(),
        }
    }
}
