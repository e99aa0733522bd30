use anyhow::Result;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use telusur_core::EngineConfig;
use telusur_server::build_app;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Model artifact written by `telusur-indexer build`
    #[arg(long, default_value = "ir_model.bin")]
    model: String,
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stopword list; overrides the config file
    #[arg(long)]
    stopwords: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(path) = args.stopwords {
        config.stopwords_path = path;
    }
    let app: Router = build_app(args.model.clone(), config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, model = %args.model, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
