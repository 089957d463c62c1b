//! Blocking client for the public Reddit JSON API

use super::{Comment, CommentNode, MoreMarker, Post, RemoteError, RemoteSource};
use crate::config::RemoteConfig;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Largest page the listing endpoint serves
const LISTING_PAGE_SIZE: usize = 100;

/// Largest number of ids `morechildren` accepts per request
const MORE_CHILDREN_BATCH: usize = 100;

/// Remote source backed by Reddit's unauthenticated JSON endpoints
pub struct RedditClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl RedditClient {
    /// Create a client from configuration
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn get_json(&self, url: &str) -> Result<Value, RemoteError> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json().map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn resolve_children(
        &self,
        post: &Post,
        marker: &MoreMarker,
    ) -> Result<Vec<CommentNode>, RemoteError> {
        let mut things = Vec::new();

        for url in more_children_urls(&self.base_url, &post.id, &marker.children) {
            let body = self.get_json(&url)?;
            things.extend(parse_more_children(&url, body)?);
        }

        // Batches are grafted together; a child may hang off a comment
        // returned by another batch.
        Ok(graft(&marker.parent_id, things))
    }

    fn resolve_continuation(
        &self,
        post: &Post,
        marker: &MoreMarker,
    ) -> Result<Vec<CommentNode>, RemoteError> {
        let url = format!(
            "{}/comments/{}/_/{}.json?raw_json=1",
            self.base_url,
            post.short_id(),
            super::strip_prefix(&marker.parent_id)
        );
        let body = self.get_json(&url)?;
        continuation_replies(&url, body, &marker.parent_id)
    }
}

impl RemoteSource for RedditClient {
    fn list_recent_posts(&self, target: &str, limit: usize) -> Result<Vec<Post>, RemoteError> {
        paginate(limit, |page_size, after| {
            let url = listing_url(&self.base_url, target, page_size, after);
            let body = self.get_json(&url)?;
            parse_listing(&url, body)
        })
    }

    fn fetch_comment_tree(&self, post: &Post) -> Result<Vec<CommentNode>, RemoteError> {
        let url = format!(
            "{}/comments/{}.json?raw_json=1&limit=500",
            self.base_url,
            post.short_id()
        );
        let body = self.get_json(&url)?;
        parse_comment_page(&url, body)
    }

    fn resolve_more(
        &self,
        post: &Post,
        marker: &MoreMarker,
    ) -> Result<Vec<CommentNode>, RemoteError> {
        if marker.is_continuation() {
            self.resolve_continuation(post, marker)
        } else {
            self.resolve_children(post, marker)
        }
    }
}

fn listing_url(base_url: &str, target: &str, page_size: usize, after: Option<&str>) -> String {
    let mut url = format!(
        "{}/r/{}/new.json?raw_json=1&limit={}",
        base_url, target, page_size
    );
    if let Some(cursor) = after {
        url.push_str(&format!("&after={}", cursor));
    }
    url
}

/// Collect up to `limit` posts, following the `after` cursor page by page.
///
/// Stops early when the listing runs out of pages or returns an empty page.
fn paginate<F>(limit: usize, mut fetch_page: F) -> Result<Vec<Post>, RemoteError>
where
    F: FnMut(usize, Option<&str>) -> Result<(Vec<Post>, Option<String>), RemoteError>,
{
    let mut posts = Vec::new();
    let mut after: Option<String> = None;

    while posts.len() < limit {
        let page_size = (limit - posts.len()).min(LISTING_PAGE_SIZE);
        let (page, next) = fetch_page(page_size, after.as_deref())?;
        let fetched = page.len();
        posts.extend(page);

        match next {
            Some(cursor) if fetched > 0 => after = Some(cursor),
            _ => break,
        }
    }

    posts.truncate(limit);
    Ok(posts)
}

/// Parse a `/r/{target}/new` listing into posts and the next-page cursor
fn parse_listing(url: &str, body: Value) -> Result<(Vec<Post>, Option<String>), RemoteError> {
    let listing: Listing = decode(url, body)?;

    let posts = listing
        .data
        .children
        .into_iter()
        .map(|thing| decode::<RawLink>(url, thing.data).map(RawLink::into_post))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((posts, listing.data.after))
}

/// Parse a `/comments/{id}` page: `[post listing, comment listing]`
fn parse_comment_page(url: &str, body: Value) -> Result<Vec<CommentNode>, RemoteError> {
    let mut pages: Vec<Listing> = decode(url, body)?;
    if pages.len() < 2 {
        return Err(RemoteError::Decode {
            url: url.to_string(),
            message: format!("expected 2 listings, got {}", pages.len()),
        });
    }

    let comments = pages.swap_remove(1);
    comments
        .data
        .children
        .into_iter()
        .map(|thing| thing.into_node(url).map(|(_, node)| node))
        .collect()
}

/// Parse a `morechildren` response into `(parent_id, node)` pairs
fn parse_more_children(url: &str, body: Value) -> Result<Vec<(String, CommentNode)>, RemoteError> {
    let response: MoreChildrenResponse = decode(url, body)?;

    if let Some(error) = response.json.errors.first() {
        return Err(RemoteError::Decode {
            url: url.to_string(),
            message: error.to_string(),
        });
    }

    response
        .json
        .data
        .things
        .into_iter()
        .map(|thing| thing.into_node(url))
        .collect()
}

/// One `morechildren` request per batch of child ids
fn more_children_urls(base_url: &str, link_id: &str, children: &[String]) -> Vec<String> {
    children
        .chunks(MORE_CHILDREN_BATCH)
        .map(|batch| {
            format!(
                "{}/api/morechildren.json?api_type=json&raw_json=1&link_id={}&children={}",
                base_url,
                link_id,
                batch.join(",")
            )
        })
        .collect()
}

/// Pull the replies of `parent_id` out of a "continue this thread" page.
///
/// The page is rooted at the parent comment; its replies are what the
/// marker stood for.
fn continuation_replies(
    url: &str,
    body: Value,
    parent_id: &str,
) -> Result<Vec<CommentNode>, RemoteError> {
    parse_comment_page(url, body)?
        .into_iter()
        .find_map(|node| match node {
            CommentNode::Comment(c) if c.id == parent_id => Some(c.replies),
            _ => None,
        })
        .ok_or_else(|| RemoteError::Decode {
            url: url.to_string(),
            message: format!("thread page does not contain {}", parent_id),
        })
}

/// Rebuild a tree from a flat list of `(parent_id, node)` pairs.
///
/// Nodes hanging off `root` form the result, in source order. Nodes whose
/// parent is neither `root` nor in the list are appended to the top level.
fn graft(root: &str, things: Vec<(String, CommentNode)>) -> Vec<CommentNode> {
    let known: HashSet<String> = things
        .iter()
        .filter_map(|(_, node)| match node {
            CommentNode::Comment(c) => Some(c.id.clone()),
            CommentNode::More(_) => None,
        })
        .collect();

    let mut by_parent: HashMap<String, Vec<CommentNode>> = HashMap::new();
    for (parent, node) in things {
        let parent = if parent == root || known.contains(&parent) {
            parent
        } else {
            root.to_string()
        };
        by_parent.entry(parent).or_default().push(node);
    }

    attach(root, &mut by_parent)
}

fn attach(parent: &str, by_parent: &mut HashMap<String, Vec<CommentNode>>) -> Vec<CommentNode> {
    let mut nodes = by_parent.remove(parent).unwrap_or_default();
    for node in &mut nodes {
        if let CommentNode::Comment(comment) = node {
            let mut children = attach(&comment.id, by_parent);
            comment.replies.append(&mut children);
        }
    }
    nodes
}

fn decode<T: serde::de::DeserializeOwned>(url: &str, value: Value) -> Result<T, RemoteError> {
    serde_json::from_value(value).map_err(|e| RemoteError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn timestamp(created_utc: f64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(created_utc as i64, 0).unwrap_or_default()
}

// Reddit API types

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Thing>,
    #[serde(default)]
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: Value,
}

impl Thing {
    fn into_node(self, url: &str) -> Result<(String, CommentNode), RemoteError> {
        if self.kind == "more" {
            let raw: RawMore = decode(url, self.data)?;
            let parent = raw.parent_id.clone();
            return Ok((parent, CommentNode::More(raw.into_marker())));
        }

        // Anything else is treated as a comment; its id prefix is checked
        // when the object is stored.
        let raw: RawComment = decode(url, self.data)?;
        let parent = raw.parent_id.clone();
        Ok((parent, CommentNode::Comment(raw.into_comment(url)?)))
    }
}

#[derive(Debug, Deserialize)]
struct RawLink {
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    num_comments: i64,
}

impl RawLink {
    fn into_post(self) -> Post {
        Post {
            id: self.name,
            title: self.title,
            url: self.url,
            created_time: timestamp(self.created_utc),
            comment_count: self.num_comments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawComment {
    name: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    parent_id: String,
    /// Either an empty string or a nested listing
    #[serde(default)]
    replies: Value,
}

impl RawComment {
    fn into_comment(self, url: &str) -> Result<Comment, RemoteError> {
        let replies = match self.replies {
            Value::Object(_) => {
                let listing: Listing = decode(url, self.replies)?;
                listing
                    .data
                    .children
                    .into_iter()
                    .map(|thing| thing.into_node(url).map(|(_, node)| node))
                    .collect::<Result<Vec<_>, _>>()?
            }
            _ => Vec::new(),
        };

        Ok(Comment {
            id: self.name,
            body: self.body,
            created_time: timestamp(self.created_utc),
            permalink: self.permalink,
            replies,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawMore {
    name: String,
    #[serde(default)]
    parent_id: String,
    #[serde(default)]
    children: Vec<String>,
    #[serde(default)]
    count: i64,
}

impl RawMore {
    fn into_marker(self) -> MoreMarker {
        MoreMarker {
            id: self.name,
            parent_id: self.parent_id,
            children: self.children,
            count: self.count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<Value>,
    #[serde(default)]
    data: MoreChildrenData,
}

#[derive(Debug, Default, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<Thing>,
}
