use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nutrition_lens::{AppConfig, HttpPredictor};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// TOML file overriding rewrites and remote image patterns
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_logging();

    let mut config = AppConfig::from_env()?;
    if let Some(path) = &args.config {
        config = config.merge_file(path)?;
    }
    if !config.is_image_allowed(&format!("{}/", config.backend_origin)) {
        warn!(
            origin = %config.backend_origin,
            "backend origin is not in the remote image allow-list, images will be blocked"
        );
    }

    let predictor = HttpPredictor::new(config.predict_url());
    info!(endpoint = %predictor.endpoint(), origin = %config.backend_origin, "prediction backend configured");
    for rule in &config.rewrites {
        info!(source = %rule.source, destination = %rule.destination, "rewrite rule");
    }

    let app = nutrition_lens::app(config, Arc::new(predictor))?;

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;

    info!("Server running on http://{}", args.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
