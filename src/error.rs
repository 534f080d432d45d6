use thiserror::Error;

/// Failures of the similarity pipeline and its outbound calls.
///
/// Nothing here ever turns into a non-200 response: the message handler maps
/// each variant to a chat reply or a log line.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("image search unavailable: {0}")]
    SearchUnavailable(String),

    #[error("attachment fetch failed: {0}")]
    AttachmentFetchFailed(String),

    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("reply delivery failed: {0}")]
    Delivery(String),
}

impl BotError {
    /// Whether the user should see the introduction text rather than the
    /// generic retry-later message.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
