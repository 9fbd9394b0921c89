use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notebook_server::ai::{AiGateway, GeminiModel, SharedModel};
use notebook_server::config::Config;
use notebook_server::server::{self, AppState};
use notebook_server::storage::FileStorage;
use notebook_server::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notebook_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    let storage = Arc::new(FileStorage::new(&config.uploads_dir));
    storage.init().await?;

    let model: SharedModel = Arc::new(GeminiModel::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    ));

    let state = AppState {
        files: Arc::new(MemoryStore::new()),
        sessions: Arc::new(MemoryStore::new()),
        gateway: Arc::new(AiGateway::new(model)),
        storage,
    };

    let app = server::router(state);

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{addr}");
    info!("endpoints: GET /api/health");
    info!("endpoints: POST /api/files/upload, GET /api/files, GET /api/files/{{id}}, GET /api/files/{{id}}/content, DELETE /api/files/{{id}}, GET /api/files/tags/all");
    info!("endpoints: POST /api/chat, POST /api/chat/export");
    info!("endpoints: POST /api/sessions, GET /api/sessions, GET /api/sessions/{{id}}, DELETE /api/sessions/{{id}}");

    axum::serve(listener, app).await?;
    Ok(())
}
