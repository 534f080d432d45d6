use std::panic::AssertUnwindSafe;

use actix_web::{web, HttpResponse};
use futures_util::FutureExt;

use crate::error::BotError;
use crate::handlers::extract::{extract_image_ref, ImageRef};
use crate::models::{Activity, ActivityType, HeroCard, SearchResultItem};
use crate::state::AppState;

pub const MAX_CARDS: usize = 5;

pub const FOUND_TEXT: &str = "Yay! I found some visually similar products along with their buying site link.";
pub const NOT_FOUND_TEXT: &str =
    "Alas! I couldn't find visually similar products. Please try with another image/image URL.";
pub const INTRO_TEXT: &str = "I am PicNShop- an intelligent bot! \
    Send me an image/image URL and I will suggest visually similar products along with their buying site link.";
pub const ERROR_TEXT: &str = "Oops! Something went wrong. Try again later.";
pub const WELCOME_TEXT: &str = "Welcome New User!";
pub const TYPING_TEXT: &str = "I am more of a visual bot. Please send an image/image URL.";
pub const PING_TEXT: &str = "Ping successful!";

/// Webhook entry point. Always answers 200; outcomes reach the user as chat
/// replies.
pub async fn receive_activity(data: web::Json<Activity>, state: web::Data<AppState>) -> HttpResponse {
    handle_activity(state.get_ref(), data.into_inner()).await;
    HttpResponse::Ok().finish()
}

pub async fn handle_activity(state: &AppState, activity: Activity) {
    tracing::info!(
        activity_type = ?activity.activity_type,
        activity_id = activity.id.as_deref().unwrap_or_default(),
        channel = activity.channel_id.as_deref().unwrap_or_default(),
        "received activity"
    );

    let reply = match activity.activity_type {
        ActivityType::Message => Some(similar_products_reply(state, &activity).await),
        ActivityType::ConversationUpdate => activity
            .bot_was_added()
            .then(|| activity.create_reply(WELCOME_TEXT)),
        ActivityType::Typing => Some(activity.create_reply(TYPING_TEXT)),
        ActivityType::Ping => Some(activity.create_reply(PING_TEXT)),
        ActivityType::DeleteUserData | ActivityType::ContactRelationUpdate | ActivityType::Unknown => None,
    };

    if let Some(reply) = reply {
        if let Err(e) = state.replies.reply_to_activity(&reply).await {
            tracing::error!(error = %e, service_url = %reply.service_url, "failed to deliver reply");
        }
    }
}

async fn similar_products_reply(state: &AppState, activity: &Activity) -> Activity {
    let outcome = AssertUnwindSafe(find_similar_products(state, activity))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(items)) if items.is_empty() => activity.create_reply(NOT_FOUND_TEXT),
        Ok(Ok(items)) => carousel_reply(activity, &items),
        Ok(Err(e)) if e.is_user_error() => {
            tracing::info!(error = %e, "message carried no usable image");
            activity.create_reply(INTRO_TEXT)
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "similar product lookup failed");
            activity.create_reply(ERROR_TEXT)
        }
        Err(_) => {
            tracing::error!("similar product lookup panicked");
            activity.create_reply(ERROR_TEXT)
        }
    }
}

async fn find_similar_products(state: &AppState, activity: &Activity) -> Result<Vec<SearchResultItem>, BotError> {
    match extract_image_ref(activity)? {
        ImageRef::Attachment(attachment) => {
            let image = state.media.fetch(attachment).await?;
            state.search.search_by_image(image).await
        }
        ImageRef::Url(url) => state.search.search_by_url(&url).await,
    }
}

pub fn carousel_reply(activity: &Activity, items: &[SearchResultItem]) -> Activity {
    let mut reply = activity.create_reply(FOUND_TEXT);
    reply.attachment_layout = Some("carousel".to_string());
    reply.attachments = items
        .iter()
        .take(MAX_CARDS)
        .map(|item| HeroCard::from(item).into_attachment())
        .collect();
    reply
}
