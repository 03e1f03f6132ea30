use todoboard::application::{board_service::BoardService, renderer::Renderer};
use todoboard::domain::command_store::CommandStore;
use todoboard::http::{routing, routing::board};
use todoboard::infrastructure::sqlite_command_store::SqliteCommandStore;
use axum::body::to_bytes;
use axum::Router;
use serde_json::json;

async fn app() -> Router {
    let store = SqliteCommandStore::connect("sqlite::memory:").await.unwrap();
    store.init().await.unwrap();
    routing::app(board::router(board::BoardState {
        service: BoardService::new(store),
        renderer: Renderer::default(),
        width: 64,
        height: 48,
    }))
}

#[tokio::test]
async fn acceptance_append_then_read_back() {
    let app = app().await;
    let line = json!({ "type": "line", "x": 10, "y": 20, "px": 5, "py": 15 });

    let res = request(&app, "POST", "/board/commands", Some(json!({ "command": line }))).await;
    assert_eq!(res.status(), 201);
    let id = read_json(res).await["id"].as_str().unwrap().to_string();

    let res = request(&app, "GET", "/board/commands", None).await;
    assert_eq!(res.status(), 200);
    let items = read_json(res).await["items"].as_array().unwrap().clone();
    assert_eq!(items, vec![json!({ "id": id, "command": { "type": "line", "x": 10.0, "y": 20.0, "px": 5.0, "py": 15.0 } })]);
}

#[tokio::test]
async fn acceptance_clear_leaves_single_clear_record() {
    let app = app().await;
    for n in 0..3 {
        let line = json!({ "type": "line", "x": n, "y": n, "px": 0, "py": 0 });
        let res = request(&app, "POST", "/board/commands", Some(json!({ "command": line }))).await;
        assert_eq!(res.status(), 201);
    }

    let res = request(&app, "POST", "/board/clear", None).await;
    assert_eq!(res.status(), 204);

    let res = request(&app, "GET", "/board/commands", None).await;
    let items = read_json(res).await["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["command"], json!({ "type": "clear" }));
}

#[tokio::test]
async fn acceptance_batch_delete_skips_unknown_ids() {
    let app = app().await;
    let res = request(&app, "POST", "/board/commands", Some(json!({ "command": { "type": "clear" } }))).await;
    let id = read_json(res).await["id"].as_str().unwrap().to_string();

    let body = json!({ "ids": [id, "6f1c2a52-3f55-4c1e-9a57-2b8f8a1d9e10"] });
    let res = request(&app, "POST", "/board/commands/batch-delete", Some(body)).await;
    assert_eq!(res.status(), 200);
    assert_eq!(read_json(res).await["deleted"], 1);

    let res = request(&app, "GET", "/board/commands", None).await;
    assert!(read_json(res).await["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn acceptance_rejects_unknown_command_types() {
    let app = app().await;
    let res = request(&app, "POST", "/board/commands", Some(json!({ "command": { "type": "erase" } }))).await;
    assert!(res.status().is_client_error());

    let res = request(&app, "GET", "/board/commands", None).await;
    assert!(read_json(res).await["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn acceptance_snapshot_is_png() {
    let app = app().await;
    let line = json!({ "type": "line", "x": 10, "y": 20, "px": 5, "py": 15 });
    request(&app, "POST", "/board/commands", Some(json!({ "command": line }))).await;

    let res = request(&app, "GET", "/board/snapshot.png", None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    let bytes = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

async fn read_json(res: hyper::Response<axum::body::Body>) -> serde_json::Value {
    serde_json::from_slice(&to_bytes(res.into_body(), 1024 * 1024).await.unwrap()).unwrap()
}

async fn request(app: &Router, method: &str, path: &str, body: Option<serde_json::Value>) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use axum::http::{Request, Method};
    use tower::ServiceExt;

    let req = Request::builder().method(Method::from_bytes(method.as_bytes()).unwrap()).uri(path);
    let req = match body {
        Some(json) => req.header("content-type", "application/json").body(Body::from(json.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}
