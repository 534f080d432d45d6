use serde::{Deserialize, Serialize};

use super::{Attachment, SearchResultItem};

pub const HERO_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.hero";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CardImage {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CardAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub title: String,
    pub value: String,
}

impl CardAction {
    pub fn open_url(title: &str, url: &str) -> Self {
        CardAction {
            action_type: "openUrl".to_string(),
            title: title.to_string(),
            value: url.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HeroCard {
    pub title: String,
    pub subtitle: String,
    pub images: Vec<CardImage>,
    pub buttons: Vec<CardAction>,
}

impl From<&SearchResultItem> for HeroCard {
    fn from(item: &SearchResultItem) -> Self {
        HeroCard {
            title: item.name.clone(),
            subtitle: item.host_page_display_url.clone(),
            images: vec![CardImage { url: item.thumbnail_url.clone() }],
            buttons: vec![
                CardAction::open_url("Buy", &item.host_page_url),
                CardAction::open_url("Search more", &item.web_search_url),
            ],
        }
    }
}

impl HeroCard {
    pub fn into_attachment(self) -> Attachment {
        Attachment {
            content_type: HERO_CARD_CONTENT_TYPE.to_string(),
            content_url: None,
            content: Some(serde_json::json!(self)),
            name: None,
        }
    }
}
