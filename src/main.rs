use batepapo::{AppState, app, config::Config, reaper, store};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("batepapo=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    let db_pool = store::connect(&config.database_url).await?;

    reaper::spawn(
        db_pool.clone(),
        config.reaper_period,
        config.reaper_threshold_ms,
    );

    let app = app(AppState { db_pool });
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
