//! Incremental ingestion engine
//!
//! One pass lists the recent posts of a target, decides per post whether
//! anything changed since the last pass, expands the comment trees that
//! need it, and stores every unseen object with its words. The whole pass
//! is a single transaction: it either commits completely or leaves the
//! store untouched.

pub mod change;
pub mod walker;

pub use change::{assess, needs_revisit, PostState};
pub use walker::{TreeWalker, WalkLimits};

use crate::config::Config;
use crate::content::ContentObject;
use crate::error::IngestError;
use crate::remote::{Post, RemoteSource};
use crate::storage::{Database, ObjectStore, PassTransaction, WordIndex};
use serde::Serialize;

/// Everything a pass needs besides the store and the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Community to list posts from
    pub target: String,
    /// Number of recent posts requested per pass
    pub post_limit: usize,
    /// Bounds for comment tree expansion
    pub limits: WalkLimits,
    /// Store the live comment count after revisiting a known post
    pub refresh_comment_counts: bool,
}

impl IngestConfig {
    /// Create a configuration with default settings
    pub fn new(target: &str) -> Self {
        Self::from_config(target, &Config::default())
    }

    /// Build the pass configuration from the configuration file
    pub fn from_config(target: &str, config: &Config) -> Self {
        Self {
            target: target.to_string(),
            post_limit: config.remote.post_limit,
            limits: WalkLimits {
                max_resolutions: config.ingest.max_resolutions,
            },
            refresh_comment_counts: config.ingest.refresh_comment_counts,
        }
    }
}

/// Outcome of a committed pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Posts returned by the listing
    pub posts_seen: usize,
    /// Posts whose comment count had not changed
    pub posts_skipped: usize,
    /// Known posts whose comment tree was walked again
    pub posts_revisited: usize,
    /// New post objects stored
    pub links_inserted: usize,
    /// New comment objects stored
    pub comments_inserted: usize,
    /// Word rows stored
    pub words_inserted: usize,
}

impl PassReport {
    /// Total new objects stored
    pub fn objects_inserted(&self) -> usize {
        self.links_inserted + self.comments_inserted
    }
}

/// The ingestion engine
pub struct Ingestor<'a, S: RemoteSource + ?Sized> {
    config: IngestConfig,
    db: &'a mut Database,
    source: &'a S,
}

impl<'a, S: RemoteSource + ?Sized> Ingestor<'a, S> {
    /// Create an engine over a store and a remote source
    pub fn new(config: IngestConfig, db: &'a mut Database, source: &'a S) -> Self {
        Self { config, db, source }
    }

    /// Run one pass over the target.
    ///
    /// Any error rolls back every write made during the pass.
    pub fn run_pass(&mut self) -> Result<PassReport, IngestError> {
        let config = &self.config;
        let source = self.source;

        tracing::info!(community = %config.target, limit = config.post_limit, "starting pass");

        let posts = source.list_recent_posts(&config.target, config.post_limit)?;
        tracing::info!("fetched {} posts", posts.len());

        let tx = self.db.begin_pass()?;

        match Self::ingest_posts(config, source, &tx, &posts) {
            Ok(report) => {
                tx.record_pass(&config.target, &report)?;
                tx.commit()?;

                tracing::info!(
                    community = %config.target,
                    posts = report.posts_seen,
                    skipped = report.posts_skipped,
                    objects = report.objects_inserted(),
                    words = report.words_inserted,
                    "pass committed"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("pass over {} failed, rolling back: {}", config.target, e);
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!("rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    fn ingest_posts(
        config: &IngestConfig,
        source: &S,
        tx: &PassTransaction<'_>,
        posts: &[Post],
    ) -> Result<PassReport, IngestError> {
        let mut report = PassReport::default();
        let walker = TreeWalker::new(source, config.limits);

        for post in posts {
            report.posts_seen += 1;
            Self::ingest_post(config, &walker, tx, post, &mut report)?;
        }

        Ok(report)
    }

    fn ingest_post(
        config: &IngestConfig,
        walker: &TreeWalker<'_, S>,
        tx: &PassTransaction<'_>,
        post: &Post,
        report: &mut PassReport,
    ) -> Result<(), IngestError> {
        let state = change::assess(tx, post)?;
        if !state.needs_revisit() {
            tracing::debug!(post = %post.id, "comment count unchanged, skipping");
            report.posts_skipped += 1;
            return Ok(());
        }

        let object = ContentObject::from_post(post)?;
        if store_object(tx, &object, report)? {
            report.links_inserted += 1;
            tracing::debug!(post = %post.id, "new post");
        } else {
            report.posts_revisited += 1;
            tracing::debug!(post = %post.id, state = ?state, live = post.comment_count, "revisiting post");
        }

        let comments = walker.expand(post)?;
        let mut new_comments = 0;
        for comment in &comments {
            let object = ContentObject::from_comment(comment)?;
            if store_object(tx, &object, report)? {
                new_comments += 1;
            }
        }
        report.comments_inserted += new_comments;

        if config.refresh_comment_counts {
            if let PostState::Changed { recorded } = state {
                tx.update_comment_count(&post.id, post.comment_count)?;
                tracing::debug!(
                    post = %post.id,
                    recorded,
                    live = post.comment_count,
                    "refreshed comment count"
                );
            }
        }

        tracing::debug!(
            post = %post.id,
            comments = comments.len(),
            new = new_comments,
            "post done"
        );
        Ok(())
    }
}

/// Store an object and its words if it is new; returns whether it was
fn store_object<T>(tx: &T, object: &ContentObject, report: &mut PassReport) -> Result<bool, IngestError>
where
    T: ObjectStore + WordIndex,
{
    if !tx.insert_if_absent(object)? {
        return Ok(false);
    }

    report.words_inserted += tx.insert_words(&object.id, &object.index_tokens())?;
    Ok(true)
}
