mod chat;
mod config;
mod conversation;
mod errors;
mod llm_client;
mod resume;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::chat::SessionManager;
use crate::config::Config;
use crate::conversation::{ConversationFiles, ConversationStore, StoreLimits};
use crate::llm_client::LlmClient;
use crate::resume::PdfResumeExtractor;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume chat API v{}", env!("CARGO_PKG_VERSION"));

    if config.openrouter_api_key.is_none() {
        warn!("OPENROUTER_API_KEY is not set; requests must supply their own credential");
    }

    // One HTTP client for both resume downloads and upstream calls
    let http = reqwest::Client::new();

    let limits = StoreLimits {
        max_messages: config.max_messages,
        max_conversations: config.max_conversations,
    };
    let store = match &config.conversation_dir {
        Some(dir) => {
            info!("Persisting conversations to {}", dir.display());
            let files = ConversationFiles::open(dir).with_context(|| {
                format!("Failed to open conversation directory {}", dir.display())
            })?;
            ConversationStore::with_files(limits, files)
        }
        None => {
            info!("Conversations are held in memory only");
            ConversationStore::in_memory(limits)
        }
    };
    info!(
        "Conversation limits: {} messages, {} conversations",
        limits.max_messages, limits.max_conversations
    );

    let sessions = SessionManager::new(
        config.resume_source.clone(),
        Arc::new(PdfResumeExtractor::new(http.clone())),
        store,
        LlmClient::new(http),
    );
    info!(
        "Chat relay initialized (model: {}, endpoint: {})",
        config.model, config.openrouter_endpoint
    );

    let state = AppState {
        config: config.clone(),
        sessions: Arc::new(sessions),
    };

    // The widget is embedded on arbitrary pages, hence permissive CORS
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
