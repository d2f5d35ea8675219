// Contact API entry point
use portfolio_api::{router, ApiSettings, ContactService};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting portfolio contact API...");

    let settings = ApiSettings::from_env();
    let addr = format!("{}:{}", settings.host, settings.port);

    let service = ContactService::from_settings(&settings)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Contact API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(service)).await?;

    Ok(())
}
