use std::sync::Arc;

use anyhow::Context;

use stockroom_infra::config::AppConfig;
use stockroom_infra::seed::seed_sample_data;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr;
    let seed = config.seed_sample_data;

    let services = stockroom_api::app::build_services(config)
        .await
        .context("failed to open ledger store")?;

    if seed {
        seed_sample_data(services.store.as_ref())
            .await
            .context("failed to seed sample data")?;
    }

    let app = stockroom_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
