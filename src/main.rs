use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use mediscribe::auth::jwt::JwtService;
use mediscribe::config::AppConfig;
use mediscribe::db;
use mediscribe::external::{AssemblyAiClient, GroqClient};
use mediscribe::routes;
use mediscribe::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        "loaded mediscribe configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    let jwt = JwtService::from_config(&config);

    let http = reqwest::Client::new();
    let transcriber = Arc::new(AssemblyAiClient::new(
        http.clone(),
        config.assemblyai_api_key.clone(),
        config.assemblyai_endpoint.clone(),
    ));
    let enhancer = Arc::new(GroqClient::new(
        http,
        config.groq_api_key.clone(),
        config.groq_endpoint.clone(),
        config.groq_model.clone(),
    ));

    let listen_addr: SocketAddr =
        format!("{}:{}", config.server_host, config.server_port).parse()?;

    let state = AppState::new(pool, config, jwt, transcriber, enhancer);
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, router).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
