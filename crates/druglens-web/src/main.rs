//! DrugLens Web Server
//!
//! Run with: cargo run -p druglens-web

use anyhow::Context;
use druglens_config::Config;
use druglens_web::{build_router, AppContext};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("DrugLens starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Model loading is blocking file and tensor work.
    let startup = tokio::task::spawn_blocking(|| -> druglens_common::Result<_> {
        let config = Config::load()?;
        let addr = config.server.socket_addr();
        Ok((AppContext::initialize(&config)?, addr))
    });
    let (context, addr) = startup.await?.context("starting DrugLens")?;

    let app = build_router(context);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
