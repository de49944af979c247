//! Per-run request state: what to fetch next for one collection.

use serde::Deserialize;
use url::Url;

use crate::endpoint::EndpointDescriptor;
use crate::error::SyncError;

/// Continuation parameter carrying the previous page's `next` token.
pub const OFFSET_PARAM: &str = "offset";

/// Static filters supplied at startup and sent with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// Only entities created at or after this epoch-millisecond timestamp.
    pub created_at_start: Option<i64>,
    /// Only entities archived at or after this epoch-millisecond timestamp.
    pub archived_at_start: Option<i64>,
    /// Impersonate this user id.
    pub perform_as: Option<String>,
}

impl QueryParams {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ts) = self.created_at_start {
            pairs.push(("created_at_start", ts.to_string()));
        }
        if let Some(ts) = self.archived_at_start {
            pairs.push(("archived_at_start", ts.to_string()));
        }
        if let Some(user) = &self.perform_as {
            pairs.push(("perform_as", user.clone()));
        }
        pairs
    }
}

/// Pagination position within one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Token for the next page; empty before the first fetch.
    pub next: String,
    pub has_more: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            next: String::new(),
            has_more: true,
        }
    }
}

/// The response wrapper every list endpoint returns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageEnvelope {
    /// Entity list, decoded later by the entity's decoder.
    pub data: serde_json::Value,
    #[serde(default)]
    pub next: String,
    #[serde(default, rename = "hasNext")]
    pub has_next: bool,
}

impl PageEnvelope {
    pub fn parse(body: &[u8]) -> Result<Self, SyncError> {
        serde_json::from_slice(body)
            .map_err(|e| SyncError::DecodeError(format!("invalid page envelope: {e}")))
    }
}

/// One collection being synchronized: descriptor, parent key, filters and cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncTarget {
    pub endpoint: EndpointDescriptor,
    pub parent_key: Option<String>,
    pub query: QueryParams,
    pub cursor: Cursor,
}

impl SyncTarget {
    pub fn new(endpoint: EndpointDescriptor, query: QueryParams) -> Self {
        Self {
            endpoint,
            parent_key: None,
            query,
            cursor: Cursor::default(),
        }
    }

    /// A copy addressed at `key`'s sub-resource with a fresh cursor.
    pub fn for_key(&self, key: &str) -> Self {
        Self {
            endpoint: self.endpoint,
            parent_key: Some(key.to_string()),
            query: self.query.clone(),
            cursor: Cursor::default(),
        }
    }

    /// Record the continuation state reported by a page.
    pub fn advance(&mut self, page: &PageEnvelope) {
        self.cursor.next = page.next.clone();
        self.cursor.has_more = page.has_next;
    }

    /// Full request URL: base + resolved path + filters + offset.
    pub fn url(&self, base: &Url) -> Result<Url, SyncError> {
        let segments = self.endpoint.path.segments(self.parent_key.as_deref())?;

        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::ConfigError(format!("base URL '{base}' cannot take a path")))?
            .pop_if_empty()
            .extend(&segments);

        let mut pairs = self.query.pairs();
        if !self.cursor.next.is_empty() {
            pairs.push((OFFSET_PARAM, self.cursor.next.clone()));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        Ok(url)
    }
}
