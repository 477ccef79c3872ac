use std::error::Error;
use std::sync::Arc;

use ps_common::config::PortalConfig;
use ps_portal::db::connect_and_migrate;
use ps_portal::routes::build_router;
use ps_portal::services::email::{EmailDispatcher, StubMailer, WebhookMailer};
use ps_portal::services::payout::PayoutService;
use ps_portal::services::referral::ReferralService;
use ps_portal::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = PortalConfig::from_env()?;
    let pool = connect_and_migrate(&config.database_url).await?;

    let mailer: Arc<dyn EmailDispatcher> = match config.email_webhook_url.clone() {
        Some(url) => Arc::new(WebhookMailer::new(url, reqwest::Client::new())),
        None => {
            tracing::warn!("no email webhook configured, invite emails are recorded in memory");
            Arc::new(StubMailer::new())
        }
    };

    let referral = ReferralService::new(pool.clone(), config.invite_base_url.clone(), mailer);
    let payout = PayoutService::new(pool.clone());
    let state = AppState::new(config.clone(), pool, referral, payout);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, "partner portal listening");
    axum::serve(listener, app).await?;

    Ok(())
}
