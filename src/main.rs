mod config;
mod error;
mod handlers;
mod models;
mod services;
mod state;

use actix_web::middleware::NormalizePath;
use actix_web::{web, App, HttpServer};
use config::Config;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    if config.credentials.is_none() {
        tracing::warn!("MICROSOFT_APP_ID/MICROSOFT_APP_PASSWORD not set; replies are sent unauthenticated");
    }
    tracing::info!(port = config.port, search_api = %config.search.api_url, "starting similar product bot");

    let app_state = web::Data::new(AppState::new(&config));

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .app_data(app_state.clone())
            .route("/health", web::get().to(handlers::health_check))
            .route("/api/messages", web::post().to(handlers::messages::receive_activity))
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
