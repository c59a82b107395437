use serde::{Deserialize, Serialize};

use crate::Page;

/// Wire shape returned to API clients listing tasks.
///
/// `next_page_token` is an empty string once no further page exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListTasksResponse<T> {
    pub tasks: Vec<T>,
    #[serde(default)]
    pub next_page_token: String,
}

impl<T> ListTasksResponse<T> {
    /// Build from a page, summarizing each item with `f`.
    pub fn from_page<S>(page: Page<S>, f: impl FnMut(S) -> T) -> Self {
        let page = page.map(f);
        Self {
            tasks: page.items,
            next_page_token: page.next.map(|t| t.to_string()).unwrap_or_default(),
        }
    }
}
