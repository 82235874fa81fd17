use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use crate::bot::session::Sessions;
use crate::platform::{HttpPlatform, PlatformApi};

mod bot;
mod db;
mod error;
mod logging;
mod platform;
mod services;
mod webhook;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub platform: Arc<dyn PlatformApi>,
    pub sessions: Sessions,
    /// Immutable authorization list, fixed at startup.
    pub admins: Arc<Vec<i64>>,
    pub webhook_secret: Arc<String>,
}

fn admin_ids_from_env() -> Vec<i64> {
    let mut admins: Vec<i64> = std::env::var("ADMIN_IDS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect();

    if let Ok(owner) = std::env::var("OWNER_ID") {
        if let Ok(owner_id) = owner.trim().parse::<i64>() {
            if !admins.contains(&owner_id) {
                admins.push(owner_id);
            }
        }
    }

    admins
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    logging::setup();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://gift_roulette.db".to_string());
    let bot_token = std::env::var("BOT_TOKEN").expect("BOT_TOKEN must be set");
    let api_url = std::env::var("PLATFORM_API_URL")
        .unwrap_or_else(|_| "https://api.telegram.org".to_string());
    let webhook_secret = std::env::var("WEBHOOK_SECRET").expect("WEBHOOK_SECRET must be set");

    let admins = admin_ids_from_env();
    if admins.is_empty() {
        info!("No admin ids configured; the admin panel is unreachable");
    }

    let pool = db::connect(&database_url).await?;

    let state = AppState {
        pool,
        platform: Arc::new(HttpPlatform::new(api_url, bot_token)),
        sessions: Sessions::new(),
        admins: Arc::new(admins),
        webhook_secret: Arc::new(webhook_secret),
    };

    let app = Router::new()
        .route("/webhook", post(webhook::webhook_handler))
        .route("/api/health_check", get(webhook::health_check))
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
