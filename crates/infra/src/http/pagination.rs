//! Cursor pagination over `paging.cursors.after`

use futures::stream::{self, Stream};
use graphgate_domain::Result;
use serde_json::Value;
use tracing::debug;

use super::client::GraphApiClient;
use super::request::GraphRequest;

/// The `after` cursor of a page, if another page follows.
///
/// Any present, non-null `after` continues the sequence, an empty string
/// included.
pub fn next_cursor(page: &Value) -> Option<String> {
    match page.pointer("/paging/cursors/after")? {
        Value::Null => None,
        Value::String(cursor) => Some(cursor.clone()),
        other => Some(other.to_string()),
    }
}

impl GraphApiClient {
    /// Lazily fetch decoded pages, following `paging.cursors.after`.
    ///
    /// Each page goes through [`GraphApiClient::execute`]. The stream ends
    /// after the first page without a cursor, or after yielding an error.
    pub fn paginate<'a>(
        &'a self,
        credential: &'a str,
        request: GraphRequest,
    ) -> impl Stream<Item = Result<Value>> + 'a {
        stream::unfold(Some(request), move |next| async move {
            let request = next?;
            let page = match self.execute(credential, request.clone()).await {
                Ok(response) => response.json(),
                Err(err) => Err(err),
            };
            match page {
                Ok(page) => {
                    let following = next_cursor(&page).map(|after| {
                        debug!(path = %request.normalized_path(), "following pagination cursor");
                        request.query("after", after)
                    });
                    Some((Ok(page), following))
                }
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}
