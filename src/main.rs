use mock_exam_backend::{
    config::{get_config, init_config, StorageBackend},
    database::{
        pool::{create_pool, run_migrations},
        ExamStore, MemoryStore, PgStore,
    },
    middleware::cors::frontend_cors,
    routes, AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    init_config()?;
    let config = get_config();

    let store: Arc<dyn ExamStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = create_pool().await?;
            run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; attempts and answers are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let app_state = AppState::new(store, config.jwt_secret.clone());
    let app = routes::app_router(app_state, config.public_rps)
        .layer(frontend_cors())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
