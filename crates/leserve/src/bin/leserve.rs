//! leserve binary entry point

use anyhow::{Context, Result};
use clap::Parser;
use leserve::{LeServeServer, ServerConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// LeServe - Article search and recommendation server
#[derive(Parser, Debug)]
#[command(name = "leserve")]
#[command(author = "LeIndex Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve hybrid lexical/vector article search and recommendations", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short = 'c', env = "LESERVE_CONFIG")]
    config: Option<PathBuf>,

    /// Host address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Corpus CSV file (replaces the candidate list)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Lexical index directory (replaces the candidate list)
    #[arg(long)]
    index: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Initialize logging
///
/// `RUST_LOG` wins when set; otherwise the configured level applies.
fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(corpus) = cli.corpus {
        config.corpus_paths = vec![corpus];
    }
    if let Some(index) = cli.index {
        config.index_paths = vec![index];
    }

    init_logging(&config.log_level, cli.verbose);

    info!("LeServe starting");
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);
    info!("  Corpus candidates: {:?}", config.corpus_paths);
    info!("  Index candidates: {:?}", config.index_paths);

    let server = LeServeServer::new(config).context("Failed to initialize server")?;

    info!("Server starting on: {}", server.server_url());
    info!("Press Ctrl+C to stop");

    server.start().await.context("Server terminated with an error")?;

    Ok(())
}
