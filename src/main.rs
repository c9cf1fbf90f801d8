use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use lifecyclebot::config::Config;
use lifecyclebot::github::{GithubClient, webhook};
use lifecyclebot::handlers;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Opt {
    /// Path to the bot configuration file.
    #[arg(long, default_value = "lifecyclebot.toml")]
    config: PathBuf,

    /// Port the webhook endpoint listens on.
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opt = Opt::parse();
    let config = Config::load(&opt.config)?;
    let ctx = Arc::new(handlers::Context {
        github: Box::new(GithubClient::new_from_env()),
        config,
    });

    let app = axum::Router::new()
        .route(
            "/",
            axum::routing::get(|| async { "Lifecyclebot is watching for comments." }),
        )
        .route("/github-hook", axum::routing::post(webhook))
        .with_state(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], opt.port));
    tracing::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
