use std::fmt;

use serde::{Deserialize, Serialize};

use crate::LabelSelector;

/// Opaque continuation cursor issued by the backend.
///
/// Passed through verbatim in both directions; never parsed or built here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    /// Wrap a backend cursor. Empty strings mean "no further page" and yield `None`.
    pub fn from_backend(raw: Option<String>) -> Option<Self> {
        raw.filter(|s| !s.is_empty()).map(Self)
    }

    /// Wrap a cursor handed back by a caller. Empty strings mean "start from the beginning".
    pub fn from_caller(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        (!raw.is_empty()).then_some(Self(raw))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters of a single list call against the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub selector: LabelSelector,
    /// Maximum items per page; `None` lists everything.
    pub limit: Option<u32>,
    pub continue_token: Option<PageToken>,
}

impl ListQuery {
    pub fn new(selector: LabelSelector) -> Self {
        Self {
            selector,
            limit: None,
            continue_token: None,
        }
    }

    /// Set the page size. Zero means no limit.
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit.filter(|l| *l > 0);
        self
    }

    pub fn with_continue(mut self, token: Option<PageToken>) -> Self {
        self.continue_token = token;
        self
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` once the listing is exhausted.
    pub next: Option<PageToken>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<PageToken>) -> Self {
        Self { items, next }
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next: None,
        }
    }
}
