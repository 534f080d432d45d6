use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::BotError;
use crate::models::Activity;
use crate::services::credentials::AppCredentials;
use crate::services::error_body;

/// Delivers outbound activities back into the conversation they answer.
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    async fn reply_to_activity(&self, reply: &Activity) -> Result<(), BotError>;
}

/// Bot Framework connector REST client.
pub struct ConnectorClient {
    client: Client,
    credentials: Arc<AppCredentials>,
}

/// `<serviceUrl>/v3/conversations/<conversation>/activities/<replyToId>`
pub fn reply_url(reply: &Activity) -> Result<Url, BotError> {
    let conversation = reply
        .conversation
        .as_ref()
        .map(|c| c.id.as_str())
        .ok_or_else(|| BotError::Delivery("reply has no conversation".to_string()))?;

    let mut url = Url::parse(&reply.service_url)
        .map_err(|e| BotError::Delivery(format!("bad service url {:?}: {}", reply.service_url, e)))?;

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| BotError::Delivery("service url cannot be a base".to_string()))?;
        segments
            .pop_if_empty()
            .extend(["v3", "conversations", conversation, "activities"]);
        if let Some(reply_to) = reply.reply_to_id.as_deref() {
            segments.push(reply_to);
        }
    }
    Ok(url)
}

impl ConnectorClient {
    pub fn new(client: Client, credentials: Arc<AppCredentials>) -> Self {
        ConnectorClient { client, credentials }
    }
}

#[async_trait]
impl ReplyChannel for ConnectorClient {
    async fn reply_to_activity(&self, reply: &Activity) -> Result<(), BotError> {
        let url = reply_url(reply)?;

        let mut req = self.client.post(url).json(reply);
        if let Some(token) = self
            .credentials
            .token()
            .await
            .map_err(|e| BotError::Delivery(e.to_string()))?
        {
            req = req.bearer_auth(token);
        }

        let res = req
            .send()
            .await
            .map_err(|e| BotError::Delivery(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let text = error_body(res).await;
            tracing::warn!(%status, body = %text, "connector rejected reply");
            return Err(BotError::Delivery(format!("connector returned {}", status)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn inbound(service_url: &str) -> Activity {
        serde_json::from_value(json!({
            "type": "message",
            "id": "act 1",
            "serviceUrl": service_url,
            "from": {"id": "user-1"},
            "recipient": {"id": "bot-1"},
            "conversation": {"id": "29:conv/1"}
        }))
        .unwrap()
    }

    #[test]
    fn reply_url_encodes_segments() {
        let reply = inbound("https://smba.example.net/apis/").create_reply("hi");
        let url = reply_url(&reply).unwrap();
        assert_eq!(
            url.as_str(),
            "https://smba.example.net/apis/v3/conversations/29:conv%2F1/activities/act%201"
        );
    }

    #[test]
    fn reply_without_conversation_is_rejected() {
        let mut reply = inbound("https://smba.example.net/").create_reply("hi");
        reply.conversation = None;
        assert!(matches!(reply_url(&reply), Err(BotError::Delivery(_))));
    }

    #[actix_web::test]
    async fn posts_reply_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/conversations/conv-9/activities/msg-1"))
            .and(body_partial_json(json!({
                "type": "message",
                "text": "Ping successful!",
                "replyToId": "msg-1",
                "recipient": {"id": "user-1"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "r-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut activity = inbound(&server.uri());
        activity.id = Some("msg-1".to_string());
        activity.conversation.as_mut().unwrap().id = "conv-9".to_string();

        let connector = ConnectorClient::new(
            Client::new(),
            Arc::new(AppCredentials::new(Client::new(), None)),
        );
        connector
            .reply_to_activity(&activity.create_reply("Ping successful!"))
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn rejected_reply_is_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let connector = ConnectorClient::new(
            Client::new(),
            Arc::new(AppCredentials::new(Client::new(), None)),
        );
        let err = connector
            .reply_to_activity(&inbound(&server.uri()).create_reply("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Delivery(_)));
    }
}
