//! Server instance management

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use lerecherche::{Corpus, LexicalIndex, LexicalStatus, SearchEngine};

use crate::config::ServerConfig;
use crate::handlers::{create_router, AppState};

/// LeServe HTTP server
///
/// Startup is staged: the corpus and vector spaces are built before the
/// listener opens, while the lexical index opens on a background task and
/// becomes visible to requests once ready.
pub struct LeServeServer {
    /// Server configuration
    config: ServerConfig,

    /// Shared retrieval engine
    engine: Arc<SearchEngine>,
}

impl LeServeServer {
    /// Load the corpus and build the vector spaces
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    ///
    /// # Returns
    ///
    /// `Result<LeServeServer, ServerError>` - Server ready to start, or the
    /// fatal startup error
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let (corpus, path) = Corpus::discover(&config.corpus_paths, &config.public_base_url)?;
        info!("Corpus loaded from {} ({} articles)", path.display(), corpus.len());

        Self::with_corpus(config, corpus)
    }

    /// Build a server around an already loaded corpus
    pub fn with_corpus(config: ServerConfig, corpus: Corpus) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let engine = SearchEngine::new(
            corpus,
            LexicalIndex::new(config.lexical_config()),
            config.scoring.clone(),
        )
        .with_lexical_timeout(config.lexical_timeout());

        engine.build_vectors().map_err(|e| {
            error!("Vector space initialization failed: {}", e);
            ServerError::VectorSpace(e)
        })?;
        info!("Vector search ready");

        Ok(Self {
            config,
            engine: Arc::new(engine),
        })
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        self.config.socket_addr().map_err(ServerError::Config)
    }

    /// Open the lexical index on a blocking task
    pub fn spawn_lexical_init(&self) -> tokio::task::JoinHandle<LexicalStatus> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || {
            let status = engine.initialize_lexical();
            match status {
                LexicalStatus::Available => info!("Lexical search ready"),
                _ => warn!("Lexical search unavailable; serving vector search only"),
            }
            status
        })
    }

    /// Router with shared state attached
    pub fn router(&self) -> axum::Router {
        create_router(AppState::new(Arc::clone(&self.engine), self.config.clone()))
    }

    /// Start server
    ///
    /// Serves until Ctrl+C or SIGTERM, then drains in-flight requests.
    pub async fn start(&self) -> Result<(), ServerError> {
        let addr = self.socket_addr()?;

        self.spawn_lexical_init();
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| {
                error!("Failed to bind to {}: {:?}", addr, source);
                ServerError::Bind { addr, source }
            })?;

        info!("Server listening on: {}", self.server_url());

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(Self::wait_for_shutdown())
        .await
        .map_err(ServerError::Serve)?;

        info!("Server stopped");
        Ok(())
    }

    /// Wait for shutdown signal
    ///
    /// Resolves on Ctrl+C or, on Unix, SIGTERM
    pub async fn wait_for_shutdown() {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => {
                    error!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix;
            match unix::signal(unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("Received TERM signal");
                }
                Err(e) => {
                    error!("Failed to install TERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    /// Shared retrieval engine
    #[must_use]
    pub fn engine(&self) -> Arc<SearchEngine> {
        Arc::clone(&self.engine)
    }

    /// Get server URL
    #[must_use]
    pub fn server_url(&self) -> String {
        self.config.server_url()
    }
}

/// Fatal startup and serving errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration failed validation
    #[error("Invalid config: {0}")]
    Config(String),

    /// No corpus could be loaded
    #[error(transparent)]
    Corpus(#[from] lerecherche::corpus::Error),

    /// Vector spaces could not be built
    #[error("Vector space initialization failed: {0}")]
    VectorSpace(lerecherche::space::Error),

    /// The listener could not bind
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The server loop failed
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}
