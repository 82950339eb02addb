use anyhow::Result;
use market_tracker::{config::Config, fetch, publish, transform};
use reqwest::Client;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    let cfg = Config::default();
    let client = Client::new();

    // ─── 2) fetch ────────────────────────────────────────────────────
    let raw = fetch::fetch_market_data(&client, &cfg.source_url).await?;

    // ─── 3) transform ────────────────────────────────────────────────
    let cleaned = transform::transform(&raw)?;

    // ─── 4) publish ──────────────────────────────────────────────────
    publish::write_csv(&cleaned, &cfg.output_path)?;
    let store = publish::GcsStore::new().await?;
    publish::upload_file(&store, &cfg.output_path, &cfg.bucket, &cfg.object_key).await?;

    info!("all done");
    Ok(())
}
