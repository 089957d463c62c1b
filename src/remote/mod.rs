//! Remote content source
//!
//! This module defines what the ingestion engine consumes:
//! - Posts listed from a target community
//! - Comment trees, which may contain "load more" placeholders
//! - Placeholder resolution
//!
//! Calls are blocking and issued one at a time by the engine.

mod mock;
mod reddit;

pub use mock::MockSource;
pub use reddit::RedditClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a remote source
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-success status
    #[error("{url} returned {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be understood
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The source is unavailable for another reason
    #[error("remote source unavailable: {0}")]
    Unavailable(String),
}

/// A top-level post as returned by the listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Fullname, e.g. `t3_abc123`
    pub id: String,
    pub title: String,
    pub url: String,
    pub created_time: DateTime<Utc>,
    /// Live number of comments at listing time
    pub comment_count: i64,
}

impl Post {
    /// Create a post created at the Unix epoch
    pub fn new(id: &str, title: &str, url: &str, comment_count: i64) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            created_time: DateTime::<Utc>::default(),
            comment_count,
        }
    }

    /// Set the creation time
    pub fn with_created_time(mut self, created_time: DateTime<Utc>) -> Self {
        self.created_time = created_time;
        self
    }

    /// The id without its type prefix, as used in URL paths
    pub fn short_id(&self) -> &str {
        strip_prefix(&self.id)
    }
}

/// A comment with its inline replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Fullname, e.g. `t1_def456`
    pub id: String,
    pub body: String,
    pub created_time: DateTime<Utc>,
    pub permalink: String,
    pub replies: Vec<CommentNode>,
}

impl Comment {
    /// Create a comment with no replies
    pub fn new(id: &str, body: &str) -> Self {
        Self {
            id: id.to_string(),
            body: body.to_string(),
            created_time: DateTime::<Utc>::default(),
            permalink: String::new(),
            replies: Vec::new(),
        }
    }

    /// Append a reply node
    pub fn with_reply(mut self, reply: impl Into<CommentNode>) -> Self {
        self.replies.push(reply.into());
        self
    }

    /// Set the permalink
    pub fn with_permalink(mut self, permalink: &str) -> Self {
        self.permalink = permalink.to_string();
        self
    }
}

/// Placeholder for comments the source did not return inline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoreMarker {
    /// Placeholder id
    pub id: String,
    /// Fullname of the post or comment the hidden comments hang off
    pub parent_id: String,
    /// Short ids of the hidden comments; empty for "continue this thread"
    pub children: Vec<String>,
    /// Number of hidden comments as reported by the source
    pub count: i64,
}

impl MoreMarker {
    /// Create a marker for the given hidden children
    pub fn new(id: &str, parent_id: &str, children: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            parent_id: parent_id.to_string(),
            children: children.iter().map(|c| c.to_string()).collect(),
            count: children.len() as i64,
        }
    }

    /// Whether this marks a thread continuation rather than a list of ids
    pub fn is_continuation(&self) -> bool {
        self.children.is_empty()
    }
}

/// A node of a comment tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommentNode {
    Comment(Comment),
    More(MoreMarker),
}

impl From<Comment> for CommentNode {
    fn from(comment: Comment) -> Self {
        CommentNode::Comment(comment)
    }
}

impl From<MoreMarker> for CommentNode {
    fn from(marker: MoreMarker) -> Self {
        CommentNode::More(marker)
    }
}

/// A source of posts and comment trees
pub trait RemoteSource {
    /// List the most recent posts of `target`, newest first
    fn list_recent_posts(&self, target: &str, limit: usize) -> Result<Vec<Post>, RemoteError>;

    /// Fetch the top-level comment nodes of a post
    fn fetch_comment_tree(&self, post: &Post) -> Result<Vec<CommentNode>, RemoteError>;

    /// Resolve a placeholder into the nodes it stands for.
    ///
    /// The returned nodes take the marker's place among its siblings and may
    /// themselves contain further placeholders.
    fn resolve_more(&self, post: &Post, marker: &MoreMarker)
        -> Result<Vec<CommentNode>, RemoteError>;
}

/// Drop the `tN_` prefix of a fullname, if present
pub fn strip_prefix(fullname: &str) -> &str {
    match fullname.split_once('_') {
        Some((prefix, rest)) if prefix.len() == 2 && prefix.starts_with('t') => rest,
        _ => fullname,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("t3_abc"), "abc");
        assert_eq!(strip_prefix("t1_a_b"), "a_b");
        assert_eq!(strip_prefix("abc"), "abc");
        assert_eq!(strip_prefix("_"), "_");
    }

    #[test]
    fn test_marker_continuation() {
        assert!(MoreMarker::new("t1__", "t1_p", &[]).is_continuation());
        assert!(!MoreMarker::new("t1_m", "t3_p", &["a", "b"]).is_continuation());
    }
}
