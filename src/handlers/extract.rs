//! Locating the image a message refers to.
//!
//! Extractors run in priority order (attachment, wrapped link, bare URL) and
//! the first match wins.

use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;
use url::Url;

use crate::error::BotError;
use crate::models::{Activity, Attachment};

/// Some clients (Skype) deliver a pasted link as a single HTML anchor.
static ANCHOR_TAG: Lazy<Regex> = lazy_regex!(r#"(?i)^<a href="([^"]*)">[^<]*</a>$"#);

#[derive(Debug, PartialEq)]
pub enum ImageRef<'a> {
    Attachment(&'a Attachment),
    Url(String),
}

pub fn anchor_href(text: &str) -> Option<String> {
    ANCHOR_TAG
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// The text itself when it is a well-formed absolute URL with a host.
/// Host-less schemes such as `data:` and `mailto:` are not accepted.
pub fn absolute_url(text: &str) -> Option<String> {
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return None;
    }
    Url::parse(text)
        .ok()
        .filter(Url::has_host)
        .map(|_| text.to_string())
}

pub fn extract_image_ref(activity: &Activity) -> Result<ImageRef<'_>, BotError> {
    let text = activity.text.as_deref();

    activity
        .first_image_attachment()
        .map(ImageRef::Attachment)
        .or_else(|| text.and_then(anchor_href).map(ImageRef::Url))
        .or_else(|| text.and_then(absolute_url).map(ImageRef::Url))
        .ok_or_else(|| BotError::InvalidInput("Not a valid image/image URL.".to_string()))
}
