//! Education directory server.
//!
//! Reads settings from the environment (and `.env`), prepares the document store and serves
//! the API. Run with `cargo run -p edu_server`; `STORE=memory` needs no database.

use edu_directory::{
    app, entities, AppState, DocumentStore, MemoryStore, PgDocumentStore, Settings, StaticTokenPolicy,
    StoreKind,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("edu_directory=info,edu_server=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let store: Arc<dyn DocumentStore> = match settings.store {
        StoreKind::Postgres => Arc::new(PgDocumentStore::connect(&settings).await?),
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    store.ensure_tables(&entities::ALL).await?;

    let policy = Arc::new(StaticTokenPolicy::new(&settings.admin_tokens, &settings.user_tokens));
    let state = AppState::new(store, policy);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
