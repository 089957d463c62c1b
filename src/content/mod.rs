//! Content objects ingested from the remote source
//!
//! Every object the remote source hands us carries a fullname such as
//! `t3_abc123`. The two-character prefix determines the object kind.

pub mod tokenize;

pub use tokenize::{tokenize, Token};

use crate::error::IngestError;
use crate::remote::{Comment, Post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a content object, derived from its id prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Comment,
    Account,
    Link,
    Message,
    Subreddit,
    Award,
}

impl ObjectKind {
    /// All kinds, in prefix order (`t1` .. `t6`)
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Comment,
        ObjectKind::Account,
        ObjectKind::Link,
        ObjectKind::Message,
        ObjectKind::Subreddit,
        ObjectKind::Award,
    ];

    /// Map a type prefix (`t1`..`t6`) to its kind
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "t1" => Some(ObjectKind::Comment),
            "t2" => Some(ObjectKind::Account),
            "t3" => Some(ObjectKind::Link),
            "t4" => Some(ObjectKind::Message),
            "t5" => Some(ObjectKind::Subreddit),
            "t6" => Some(ObjectKind::Award),
            _ => None,
        }
    }

    /// Determine the kind of an object from its full id.
    ///
    /// Fails with [`IngestError::UnknownObjectKind`] when the id is too short
    /// or its prefix is not one of the recognized types.
    pub fn from_id(id: &str) -> Result<Self, IngestError> {
        let prefix = id.get(..2).unwrap_or(id);
        Self::from_prefix(prefix).ok_or_else(|| IngestError::UnknownObjectKind {
            id: id.to_string(),
            prefix: prefix.to_string(),
        })
    }

    /// Parse the name stored in the `kind` column
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Name stored in the `kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Comment => "Comment",
            ObjectKind::Account => "Account",
            ObjectKind::Link => "Link",
            ObjectKind::Message => "Message",
            ObjectKind::Subreddit => "Subreddit",
            ObjectKind::Award => "Award",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `objects` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentObject {
    /// Fullname assigned by the remote source (primary key)
    pub id: String,
    /// Kind derived from the id prefix
    pub kind: ObjectKind,
    /// Creation time reported by the remote source
    pub created_time: DateTime<Utc>,
    /// Title for links, body for comments
    pub text: String,
    /// URL for links, permalink for comments
    pub location: String,
    /// Number of replies, only recorded for links
    pub comment_count: Option<i64>,
}

impl ContentObject {
    /// Build the object stored for a post
    pub fn from_post(post: &Post) -> Result<Self, IngestError> {
        let kind = ObjectKind::from_id(&post.id)?;
        let comment_count = (kind == ObjectKind::Link).then_some(post.comment_count);

        Ok(Self {
            id: post.id.clone(),
            kind,
            created_time: post.created_time,
            text: post.title.clone(),
            location: post.url.clone(),
            comment_count,
        })
    }

    /// Build the object stored for a comment
    pub fn from_comment(comment: &Comment) -> Result<Self, IngestError> {
        Ok(Self {
            id: comment.id.clone(),
            kind: ObjectKind::from_id(&comment.id)?,
            created_time: comment.created_time,
            text: comment.body.clone(),
            location: comment.permalink.clone(),
            comment_count: None,
        })
    }

    /// Tokens of the object's text that are worth indexing
    pub fn index_tokens(&self) -> Vec<Token> {
        tokenize(&self.text)
            .into_iter()
            .filter(Token::is_indexable)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_id() {
        assert_eq!(ObjectKind::from_id("t1_abc").unwrap(), ObjectKind::Comment);
        assert_eq!(ObjectKind::from_id("t3_xyz").unwrap(), ObjectKind::Link);
        assert_eq!(ObjectKind::from_id("t6_award").unwrap(), ObjectKind::Award);

        for (n, kind) in (1..).zip(ObjectKind::ALL) {
            let id = format!("t{}_x", n);
            assert_eq!(ObjectKind::from_id(&id).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_error() {
        let err = ObjectKind::from_id("t9_abc").unwrap_err();
        assert!(matches!(
            err,
            IngestError::UnknownObjectKind { ref prefix, .. } if prefix == "t9"
        ));

        assert!(ObjectKind::from_id("").is_err());
        assert!(ObjectKind::from_id("t").is_err());
    }

    #[test]
    fn test_comment_count_only_for_links() {
        let post = Post::new("t3_p1", "Hello world", "https://example.com", 4);
        let object = ContentObject::from_post(&post).unwrap();
        assert_eq!(object.kind, ObjectKind::Link);
        assert_eq!(object.comment_count, Some(4));

        let comment = Comment::new("t1_c1", "A reply");
        let object = ContentObject::from_comment(&comment).unwrap();
        assert_eq!(object.kind, ObjectKind::Comment);
        assert_eq!(object.comment_count, None);
    }

    #[test]
    fn test_index_tokens_drop_empty() {
        let comment = Comment::new("t1_c1", "--- Buy XYZ!!! ---");
        let object = ContentObject::from_comment(&comment).unwrap();
        let words: Vec<_> = object
            .index_tokens()
            .into_iter()
            .map(|t| t.normalized)
            .collect();
        assert_eq!(words, vec!["buy", "xyz"]);
    }
}
