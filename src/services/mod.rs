pub mod connector;
pub mod credentials;
pub mod image_search;
pub mod media;

use reqwest::Response;

/// Longest slice of an error body that ends up in the logs.
const MAX_LOGGED_BODY: usize = 512;

fn truncate_for_log(mut text: String) -> String {
    if text.len() > MAX_LOGGED_BODY {
        let mut cut = MAX_LOGGED_BODY;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

/// Reads a non-success response body for logging, capped at `MAX_LOGGED_BODY`.
pub(crate) async fn error_body(res: Response) -> String {
    truncate_for_log(res.text().await.unwrap_or_default())
}
