//! In-memory remote source for testing

use super::{CommentNode, MoreMarker, Post, RemoteError, RemoteSource};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// Mock remote source serving canned posts and comment trees
#[derive(Debug, Default)]
pub struct MockSource {
    posts: Vec<Post>,
    trees: HashMap<String, Vec<CommentNode>>,
    placeholders: HashMap<String, Vec<CommentNode>>,
    failing: HashSet<String>,
    listing_failure: Option<String>,
    tree_fetches: RefCell<Vec<String>>,
    resolutions: Cell<usize>,
}

impl MockSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a post and its top-level comment nodes
    pub fn add_post(&mut self, post: Post, tree: Vec<CommentNode>) {
        self.trees.insert(post.id.clone(), tree);
        self.posts.push(post);
    }

    /// Replace the comment tree of a post
    pub fn set_tree(&mut self, post_id: &str, tree: Vec<CommentNode>) {
        self.trees.insert(post_id.to_string(), tree);
    }

    /// Change the live comment count of a post
    pub fn set_comment_count(&mut self, post_id: &str, count: i64) {
        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            post.comment_count = count;
        }
    }

    /// Register what a placeholder resolves to
    pub fn add_placeholder(&mut self, marker_id: &str, nodes: Vec<CommentNode>) {
        self.placeholders.insert(marker_id.to_string(), nodes);
    }

    /// Make fetching the tree of a post, or resolving a placeholder, fail
    pub fn fail_on(&mut self, id: &str) {
        self.failing.insert(id.to_string());
    }

    /// Make the post listing fail
    pub fn fail_listing(&mut self, message: &str) {
        self.listing_failure = Some(message.to_string());
    }

    /// Posts whose comment tree was fetched, in call order
    pub fn tree_fetches(&self) -> Vec<String> {
        self.tree_fetches.borrow().clone()
    }

    /// Number of placeholder resolutions served
    pub fn resolutions(&self) -> usize {
        self.resolutions.get()
    }

    /// Forget recorded calls
    pub fn reset_calls(&self) {
        self.tree_fetches.borrow_mut().clear();
        self.resolutions.set(0);
    }
}

impl RemoteSource for MockSource {
    fn list_recent_posts(&self, _target: &str, limit: usize) -> Result<Vec<Post>, RemoteError> {
        if let Some(ref message) = self.listing_failure {
            return Err(RemoteError::Unavailable(message.clone()));
        }
        Ok(self.posts.iter().take(limit).cloned().collect())
    }

    fn fetch_comment_tree(&self, post: &Post) -> Result<Vec<CommentNode>, RemoteError> {
        self.tree_fetches.borrow_mut().push(post.id.clone());
        if self.failing.contains(&post.id) {
            return Err(RemoteError::Unavailable(format!("comments of {}", post.id)));
        }
        Ok(self.trees.get(&post.id).cloned().unwrap_or_default())
    }

    fn resolve_more(
        &self,
        _post: &Post,
        marker: &MoreMarker,
    ) -> Result<Vec<CommentNode>, RemoteError> {
        self.resolutions.set(self.resolutions.get() + 1);
        if self.failing.contains(&marker.id) {
            return Err(RemoteError::Unavailable(format!("placeholder {}", marker.id)));
        }
        self.placeholders
            .get(&marker.id)
            .cloned()
            .ok_or_else(|| RemoteError::Unavailable(format!("unknown placeholder {}", marker.id)))
    }
}
