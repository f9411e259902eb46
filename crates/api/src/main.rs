use vestry_api::app;
use vestry_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vestry_observability::init();

    let config = ApiConfig::from_env();
    let addr = config.addr.clone();

    let app = app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
