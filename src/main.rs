use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use android_uiauto::api::{create_router, AppState};
use android_uiauto::{Config, Driver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    let driver = Driver::new(config.driver.clone())?;
    if let Some(device) = config.driver.device.as_deref() {
        if let Err(e) = driver.connect(device).await {
            tracing::warn!("Could not connect to device '{}': {}", device, e);
        }
    }

    let state = Arc::new(AppState::new(driver.clone()));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(
        mode = ?config.driver.mode,
        "android-uiauto control plane starting on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("Shutting down");
    driver.cleanup().await;
    Ok(())
}
