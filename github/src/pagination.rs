//! Cursor pagination under a page ceiling
//!
//! [`paginate`] re-issues one query with an advancing `cursor` variable and
//! concatenates the `nodes` of every page in server order. It stops when the
//! server reports no further page or when `max_pages` pages have been fetched.
//! Hitting the ceiling is not an error: the partial result is returned with
//! `truncated` set and a warning logged.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::GithubResult;
use crate::queries::ActivityQuery;
use crate::transport::GraphqlTransport;

/// Pages fetched per query before giving up on completeness
pub const DEFAULT_MAX_PAGES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// One page of a GraphQL connection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

impl Page {
    /// A final page with no nodes
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Accumulated result of a pagination run
#[derive(Debug, Clone, Default)]
pub struct Paginated {
    /// Nodes of every fetched page, in server order
    pub nodes: Vec<Value>,
    /// Number of requests issued
    pub pages: usize,
    /// The ceiling was hit (or the cursor vanished) while more pages remained
    pub truncated: bool,
}

/// Fetch every page of `query` up to `max_pages`
///
/// `variables` must not contain `cursor`; it is managed here. Any transport
/// or page-shape error aborts the whole run.
pub async fn paginate<T>(
    transport: &T,
    query: &ActivityQuery,
    mut variables: Map<String, Value>,
    max_pages: usize,
) -> GithubResult<Paginated>
where
    T: GraphqlTransport + ?Sized,
{
    let document = query.document();
    let mut result = Paginated::default();
    let mut cursor: Option<String> = None;
    // Stays false when no page is requested.
    let mut has_next_page = false;

    while result.pages < max_pages {
        variables.insert(
            "cursor".to_string(),
            cursor.take().map(Value::String).unwrap_or(Value::Null),
        );

        debug!(query = query.name(), page = result.pages + 1, "requesting page");
        let data = transport.execute(document, &variables).await?;
        let page = query.extract_page(&data)?;

        result.pages += 1;
        result.nodes.extend(page.nodes);
        has_next_page = page.page_info.has_next_page;

        if !has_next_page {
            break;
        }
        match page.page_info.end_cursor {
            Some(next) => cursor = Some(next),
            None => {
                warn!(query = query.name(), "next page reported without a cursor, stopping");
                break;
            }
        }
    }

    if has_next_page {
        warn!(
            query = query.name(),
            max_pages,
            nodes = result.nodes.len(),
            "Reached maximum page limit, results are truncated"
        );
        result.truncated = true;
    }

    Ok(result)
}
