use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::services::connector::{ConnectorClient, ReplyChannel};
use crate::services::credentials::AppCredentials;
use crate::services::image_search::{BingImageSearch, ImageSearch};
use crate::services::media::MediaFetcher;

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<dyn ImageSearch>,
    pub replies: Arc<dyn ReplyChannel>,
    pub media: Arc<MediaFetcher>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let client = Client::new();
        let credentials = Arc::new(AppCredentials::new(client.clone(), config.credentials.clone()));

        Self {
            search: Arc::new(BingImageSearch::new(client.clone(), config.search.clone())),
            replies: Arc::new(ConnectorClient::new(client.clone(), credentials.clone())),
            media: Arc::new(
                MediaFetcher::new(client, credentials, config.media_auth_domain.clone())
                    .with_max_bytes(config.max_attachment_bytes),
            ),
        }
    }
}
