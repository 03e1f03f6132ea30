use axum::{extract::State, routing::{get, post}, Router, Json};
use axum::http::{header, StatusCode};
use axum::response::{sse::{Event, KeepAlive, Sse}, IntoResponse};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;

use crate::application::{board_service::BoardService, renderer::Renderer};
use crate::domain::{command::{CommandDocument, RecordId}, command_store::CommandStore};
use crate::http::types::ApiError;

#[derive(Clone)]
pub struct BoardState<S: CommandStore + Clone> {
    pub service: BoardService<S>,
    pub renderer: Renderer,
    pub width: u32,
    pub height: u32,
}

pub fn router<S: CommandStore + Clone>(state: BoardState<S>) -> Router {
    Router::new()
        .route("/board/commands", post(append_command::<S>).get(list_commands::<S>))
        .route("/board/commands/batch-delete", post(delete_commands::<S>))
        .route("/board/clear", post(clear_board::<S>))
        .route("/board/feed", get(feed::<S>))
        .route("/board/snapshot.png", get(snapshot::<S>))
        .with_state(state)
}

async fn append_command<S: CommandStore + Clone>(State(state): State<BoardState<S>>, Json(doc): Json<CommandDocument>) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = state.service.append(doc.command).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

async fn list_commands<S: CommandStore + Clone>(State(state): State<BoardState<S>>) -> Result<Json<serde_json::Value>, ApiError> {
    let records = state.service.history().await?;
    Ok(Json(serde_json::json!({ "items": records })))
}

#[derive(Deserialize)]
struct BatchDelete { ids: Vec<RecordId> }

async fn delete_commands<S: CommandStore + Clone>(State(state): State<BoardState<S>>, Json(body): Json<BatchDelete>) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state.service.store().delete_batch(&body.ids).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

async fn clear_board<S: CommandStore + Clone>(State(state): State<BoardState<S>>) -> Result<StatusCode, ApiError> {
    state.service.clear_board().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Snapshot of the collection followed by live changes, one SSE event per
/// change, named after its kind.
async fn feed<S: CommandStore + Clone>(State(state): State<BoardState<S>>) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let subscription = state.service.subscribe().await?;
    tracing::info!("board feed client connected");
    let events = subscription
        .into_stream()
        .map(|change| Event::default().event(change.kind.as_str()).json_data(change.record));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn snapshot<S: CommandStore + Clone>(State(state): State<BoardState<S>>) -> Result<impl IntoResponse, ApiError> {
    let history = state.service.history().await?;
    let surface = state.renderer.replay(state.width, state.height, history.iter().map(|r| &r.command));
    let png = surface.encode_png()?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
