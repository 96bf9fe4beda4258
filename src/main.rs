//! `dirmvc` server
//!
//! Serves the configured directory trees. Without controllers every route
//! renders its view with the path parameters alone, which is enough to
//! preview a tree of templates.
//!
//! Environment:
//! - `HOST` / `PORT` (default `127.0.0.1:3000`)
//! - `MVC_MOUNTS`: JSON object of named mounts, e.g.
//!   `{"site": {"path": "./demos/mvc", "baseRoute": "/"}}`
//! - `MVC_PATH` / `MVC_BASE_ROUTE`: a single mount when `MVC_MOUNTS` is unset
//! - `RUST_LOG`: tracing filter

use anyhow::Context;
use dirmvc::{ConfigService, MvcApplication, shutdown_signal};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dirmvc=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ConfigService::from_env();
    let mounts = config
        .mvc_config()
        .context("invalid mount configuration")?;
    let cwd = std::env::current_dir().context("cannot read the working directory")?;

    let app = MvcApplication::builder()
        .build(&mounts, &cwd)
        .context("failed to build the route tree")?
        .layer(TraceLayer::new_for_http());

    let address = format!(
        "{}:{}",
        config.get_or("HOST", "127.0.0.1"),
        config.get_or("PORT", "3000")
    );
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("cannot bind {address}"))?;
    tracing::info!(address = %listener.local_addr()?, "dirmvc listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}
