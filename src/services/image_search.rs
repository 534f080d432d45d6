use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::BotError;
use crate::models::SearchResultItem;
use crate::services::error_body;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const UPLOAD_FILE_NAME: &str = "Any-Name-Works";

/// Visual search backend: finds products that look like a given image.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search_by_url(&self, image_url: &str) -> Result<Vec<SearchResultItem>, BotError>;

    async fn search_by_image(&self, image: Bytes) -> Result<Vec<SearchResultItem>, BotError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimilarProductsResponse {
    #[serde(default)]
    visually_similar_products: Option<Vec<SimilarProduct>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimilarProduct {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    host_page_display_url: Option<String>,
    #[serde(default)]
    host_page_url: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    web_search_url: Option<String>,
}

impl From<SimilarProduct> for SearchResultItem {
    fn from(p: SimilarProduct) -> Self {
        SearchResultItem {
            name: p.name.unwrap_or_default(),
            host_page_display_url: p.host_page_display_url.unwrap_or_default(),
            host_page_url: p.host_page_url.unwrap_or_default(),
            thumbnail_url: p.thumbnail_url.unwrap_or_default(),
            web_search_url: p.web_search_url.unwrap_or_default(),
        }
    }
}

/// Bing image search client asking for the `SimilarProducts` module.
pub struct BingImageSearch {
    client: Client,
    config: SearchConfig,
}

impl BingImageSearch {
    pub fn new(client: Client, config: SearchConfig) -> Self {
        BingImageSearch { client, config }
    }

    fn with_common_params(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(SUBSCRIPTION_KEY_HEADER, &self.config.api_key).query(&[
            ("modulesRequested", "SimilarProducts"),
            ("mkt", self.config.market.as_str()),
            ("form", "BCSPRD"),
        ])
    }

    async fn read_results(res: Response) -> Result<Vec<SearchResultItem>, BotError> {
        let status = res.status();
        if !status.is_success() {
            let text = error_body(res).await;
            tracing::warn!(%status, body = %text, "image search returned non-success status");
            return Err(BotError::SearchUnavailable(format!("search API returned {}", status)));
        }

        let body: SimilarProductsResponse = res
            .json()
            .await
            .map_err(|e| BotError::SearchUnavailable(format!("unreadable search response: {}", e)))?;

        Ok(body
            .visually_similar_products
            .unwrap_or_default()
            .into_iter()
            .map(SearchResultItem::from)
            .collect())
    }
}

#[async_trait]
impl ImageSearch for BingImageSearch {
    async fn search_by_url(&self, image_url: &str) -> Result<Vec<SearchResultItem>, BotError> {
        tracing::debug!(image_url, "searching similar products by url");
        let res = self
            .with_common_params(self.client.get(&self.config.api_url))
            .query(&[("imgUrl", image_url)])
            .send()
            .await
            .map_err(|e| BotError::SearchUnavailable(e.to_string()))?;

        Self::read_results(res).await
    }

    async fn search_by_image(&self, image: Bytes) -> Result<Vec<SearchResultItem>, BotError> {
        let size = image.len() as u64;
        tracing::debug!(size, "searching similar products by image upload");
        let form = reqwest::multipart::Form::new().part(
            "image",
            reqwest::multipart::Part::stream_with_length(image, size).file_name(UPLOAD_FILE_NAME),
        );

        let res = self
            .with_common_params(self.client.post(&self.config.api_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BotError::SearchUnavailable(e.to_string()))?;

        Self::read_results(res).await
    }
}
