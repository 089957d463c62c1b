//! Change detection for previously ingested posts

use crate::remote::Post;
use crate::storage::{ObjectStore, StoreError};

/// What the store knows about a post relative to its live state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostState {
    /// No comment count is recorded (never stored, or stored without one)
    Unrecorded,
    /// The live comment count differs from the recorded one
    Changed { recorded: i64 },
    /// Nothing changed since the post was last ingested
    Unchanged,
}

impl PostState {
    /// Whether the post has to be processed in this pass
    pub fn needs_revisit(&self) -> bool {
        !matches!(self, PostState::Unchanged)
    }
}

/// Compare the recorded comment count of a post with its live count
pub fn assess<S: ObjectStore + ?Sized>(store: &S, post: &Post) -> Result<PostState, StoreError> {
    Ok(match store.recorded_comment_count(&post.id)? {
        None => PostState::Unrecorded,
        Some(recorded) if recorded == post.comment_count => PostState::Unchanged,
        Some(recorded) => PostState::Changed { recorded },
    })
}

/// Whether a post must be (re)processed in this pass
pub fn needs_revisit<S: ObjectStore + ?Sized>(store: &S, post: &Post) -> Result<bool, StoreError> {
    assess(store, post).map(|state| state.needs_revisit())
}
