pub mod activity;
pub mod card;
pub mod search;

pub use activity::{Activity, ActivityType, Attachment};
pub use card::HeroCard;
pub use search::SearchResultItem;
