//! Task assistant intent driver.
//!
//! Reads one utterance per stdin line and writes the resolved `IntentResult`
//! as one JSON line on stdout. Logs go to stderr.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use ta_intent::{IntentResolver, ResolverConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ta-intent starting");

    // ── Load config ─────────────────────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let config = ResolverConfig::from_file(&path)?;
            tracing::info!(path = %path, "config loaded");
            config
        }
        None => {
            tracing::info!("no config path given, using defaults");
            ResolverConfig::default()
        }
    };

    let resolver = IntentResolver::from_config(&config);

    // ── Resolve stdin lines ─────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let result = resolver.resolve(text).await;
        let mut encoded = serde_json::to_string(&result)?;
        encoded.push('\n');
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
