//! Resource Manager list pages.

use futures::Stream;
use serde::Deserialize;
use stratus_http_client::Url;

use super::ArmClient;
use crate::{AzureError, Result};

/// One page of a Resource Manager listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    /// Items on this page.
    #[serde(default = "Vec::new", deserialize_with = "super::null_as_default")]
    pub value: Vec<T>,
    /// Link to the next page, absent on the last one.
    #[serde(default)]
    pub next_link: Option<String>,
}

impl ArmClient {
    /// Stream a listing page by page, fetching lazily.
    pub(crate) fn pages<T>(&self, url: Url) -> impl Stream<Item = Result<Vec<T>>> + Send + '_
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        futures::stream::try_unfold(Some(url), move |next| async move {
            let Some(url) = next else {
                return Ok::<_, AzureError>(None);
            };
            let page: Page<T> = self.get_json(url).await?;
            let next = page.next_link.as_deref().map(Url::parse).transpose()?;
            Ok(Some((page.value, next)))
        })
    }
}
