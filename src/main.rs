use todoboard::application::{board_service::BoardService, renderer::Renderer, todo_service::TodoServiceImpl};
use todoboard::config::Config;
use todoboard::domain::{command_store::CommandStore, repository::TodoRepository};
use todoboard::http::routing::{self, board, todos};
use todoboard::infrastructure::{db::connect_pool, sqlite_command_store::SqliteCommandStore, sqlite_repo::SqliteTodoRepository};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let pool = connect_pool(&config.database_url).await?;
    let repo = SqliteTodoRepository::with_pool(pool.clone());
    repo.init().await?;
    let store = SqliteCommandStore::with_pool(pool, config.feed_capacity);
    store.init().await?;

    let todos_router = todos::router(todos::AppState { service: TodoServiceImpl::new(repo) });
    let board_router = board::router(board::BoardState {
        service: BoardService::new(store),
        renderer: Renderer::default(),
        width: config.board_width,
        height: config.board_height,
    });
    let router = routing::app(todos_router.merge(board_router));

    let addr = config.bind_addr;
    tracing::info!(%addr, database_url = %config.database_url, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
