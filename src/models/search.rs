use serde::{Deserialize, Serialize};

/// One visually similar product returned by the image search API.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SearchResultItem {
    pub name: String,
    pub host_page_display_url: String,
    /// Where the product can be bought.
    pub host_page_url: String,
    pub thumbnail_url: String,
    pub web_search_url: String,
}
