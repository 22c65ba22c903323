use anyhow::{Context, Result};
use clap::Parser;
use server::build_app;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

/// HTTP lookups over a built positional index
#[derive(Parser)]
#[command(name = "invert-server")]
struct Args {
    /// Directory holding the catalogs and postings file
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let app = build_app(&args.index)
        .with_context(|| format!("loading index from {}", args.index.display()))?;
    let listener = TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("binding {}:{}", args.host, args.port))?;
    tracing::info!(addr = %listener.local_addr()?, "serving lookups");
    axum::serve(listener, app).await?;
    Ok(())
}
