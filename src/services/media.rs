use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use url::Url;

use crate::config::DEFAULT_MAX_ATTACHMENT_BYTES;
use crate::error::BotError;
use crate::models::Attachment;
use crate::services::credentials::AppCredentials;

/// Downloads attachment bytes, authenticating against the platform's own
/// media host when the attachment lives there.
pub struct MediaFetcher {
    client: Client,
    credentials: Arc<AppCredentials>,
    auth_domain: String,
    max_bytes: usize,
}

impl MediaFetcher {
    pub fn new(client: Client, credentials: Arc<AppCredentials>, auth_domain: String) -> Self {
        MediaFetcher {
            client,
            credentials,
            auth_domain,
            max_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn too_large(&self, size: u64) -> BotError {
        BotError::AttachmentFetchFailed(format!(
            "attachment of {} bytes exceeds the {} byte limit",
            size, self.max_bytes
        ))
    }

    fn needs_platform_auth(&self, url: &Url) -> bool {
        url.scheme() == "https"
            && url
                .host_str()
                .map(|host| host.ends_with(self.auth_domain.as_str()))
                .unwrap_or(false)
    }

    pub async fn fetch(&self, attachment: &Attachment) -> Result<Bytes, BotError> {
        let raw = attachment
            .content_url
            .as_deref()
            .ok_or_else(|| BotError::AttachmentFetchFailed("attachment has no content url".to_string()))?;
        let url = Url::parse(raw)
            .map_err(|e| BotError::AttachmentFetchFailed(format!("bad content url {}: {}", raw, e)))?;

        let mut req = self.client.get(url.clone());
        if self.needs_platform_auth(&url) {
            let token = self.credentials.token().await.map_err(|e| {
                BotError::AttachmentFetchFailed(format!("no token for platform media: {}", e))
            })?;
            if let Some(token) = token {
                req = req.header(AUTHORIZATION, format!("Bearer {}", token));
            }
            req = req.header(ACCEPT, "application/octet-stream");
        } else {
            req = req.header(ACCEPT, attachment.content_type.as_str());
        }

        let mut res = req
            .send()
            .await
            .map_err(|e| BotError::AttachmentFetchFailed(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(BotError::AttachmentFetchFailed(format!(
                "media host returned {} for {}",
                status,
                url.host_str().unwrap_or_default()
            )));
        }

        if let Some(len) = res.content_length() {
            if len > self.max_bytes as u64 {
                return Err(self.too_large(len));
            }
        }

        // Content-Length is optional, so the cap also applies per chunk.
        let mut body = BytesMut::new();
        while let Some(chunk) = res
            .chunk()
            .await
            .map_err(|e| BotError::AttachmentFetchFailed(e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large((body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }
        let body = body.freeze();
        tracing::debug!(size = body.len(), host = url.host_str().unwrap_or_default(), "fetched attachment");
        Ok(body)
    }
}
