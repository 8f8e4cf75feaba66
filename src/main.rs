use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailsense::{create_router, services::GeminiClassifier, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsense=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting MailSense email classifier service");
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);
    tracing::info!("Classifier model: {}", config.gemini_model);

    let classifier = GeminiClassifier::new(config.gemini())
        .context("Failed to build Gemini client")?;

    let addr = format!("{}:{}", config.server_host, config.listen_port());
    let app = create_router(AppState::new(config, Arc::new(classifier)));

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
