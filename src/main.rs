use anyhow::Context;

use cinesync::{
    api::{create_router, AppState},
    logging, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(&config.log_filter);

    // Initialize stub state with the seed catalog
    let state = AppState::new();

    // Create the router with all routes
    let app = create_router(state);

    // Start the server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "Stub recommendation service listening");

    axum::serve(listener, app).await?;
    Ok(())
}
