//! Comment tree expansion
//!
//! Fetches a post's comment tree, resolves every "load more" placeholder and
//! flattens the result in pre-order: a comment before its replies, siblings
//! in source order.

use crate::error::IngestError;
use crate::remote::{Comment, CommentNode, MoreMarker, Post, RemoteSource};

/// Bounds on how far a single tree is expanded.
///
/// Reply nesting is not bounded: the walk keeps its own stack, so arbitrarily
/// deep threads expand completely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkLimits {
    /// Placeholder resolutions allowed per post
    pub max_resolutions: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_resolutions: 1000,
        }
    }
}

/// Expands comment trees through a remote source
pub struct TreeWalker<'a, S: RemoteSource + ?Sized> {
    source: &'a S,
    limits: WalkLimits,
}

impl<'a, S: RemoteSource + ?Sized> TreeWalker<'a, S> {
    /// Create a walker over `source`
    pub fn new(source: &'a S, limits: WalkLimits) -> Self {
        Self { source, limits }
    }

    /// Fetch and fully expand the comment tree of `post`.
    ///
    /// The returned comments have their `replies` emptied; the tree shape is
    /// encoded by the order alone.
    pub fn expand(&self, post: &Post) -> Result<Vec<Comment>, IngestError> {
        let roots = self.source.fetch_comment_tree(post)?;

        let mut expansion = Expansion {
            walker: self,
            post,
            resolutions: 0,
            comments: Vec::new(),
        };
        expansion.flatten(roots)?;

        tracing::debug!(
            post = %post.id,
            comments = expansion.comments.len(),
            resolutions = expansion.resolutions,
            "expanded comment tree"
        );

        Ok(expansion.comments)
    }
}

/// State of one tree expansion
struct Expansion<'w, 'a, S: RemoteSource + ?Sized> {
    walker: &'w TreeWalker<'a, S>,
    post: &'w Post,
    resolutions: usize,
    comments: Vec<Comment>,
}

impl<S: RemoteSource + ?Sized> Expansion<'_, '_, S> {
    fn flatten(&mut self, roots: Vec<CommentNode>) -> Result<(), IngestError> {
        // One frame per nesting level, holding the siblings not yet visited
        let mut stack = vec![roots.into_iter()];

        while let Some(siblings) = stack.last_mut() {
            let Some(node) = siblings.next() else {
                stack.pop();
                continue;
            };

            match node {
                CommentNode::Comment(mut comment) => {
                    let replies = std::mem::take(&mut comment.replies);
                    self.comments.push(comment);
                    stack.push(replies.into_iter());
                }
                CommentNode::More(marker) => {
                    // Resolved nodes take the marker's place among its siblings
                    let resolved = self.resolve(&marker)?;
                    stack.push(resolved.into_iter());
                }
            }
        }

        Ok(())
    }

    fn resolve(&mut self, marker: &MoreMarker) -> Result<Vec<CommentNode>, IngestError> {
        if self.resolutions >= self.walker.limits.max_resolutions {
            return Err(IngestError::expansion_limit(
                &self.post.id,
                format!(
                    "more than {} placeholder resolutions",
                    self.walker.limits.max_resolutions
                ),
            ));
        }
        self.resolutions += 1;

        tracing::debug!(
            post = %self.post.id,
            placeholder = %marker.id,
            hidden = marker.count,
            "resolving placeholder"
        );

        Ok(self.walker.source.resolve_more(self.post, marker)?)
    }
}
