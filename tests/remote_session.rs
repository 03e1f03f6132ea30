use std::time::Duration;

use todoboard::application::{board_service::BoardService, board_session::BoardSession, renderer::Renderer};
use todoboard::domain::command::{ChangeKind, Command};
use todoboard::domain::command_store::CommandStore;
use todoboard::http::{routing, routing::board};
use todoboard::infrastructure::{remote_store::RemoteCommandStore, sqlite_command_store::SqliteCommandStore};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn serve() -> String {
    let store = SqliteCommandStore::connect("sqlite::memory:").await.unwrap();
    store.init().await.unwrap();
    let app = routing::app(board::router(board::BoardState {
        service: BoardService::new(store),
        renderer: Renderer::default(),
        width: 64,
        height: 64,
    }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

async fn client(url: &str) -> BoardSession<RemoteCommandStore> {
    let store = RemoteCommandStore::new(url, 64);
    store.init().await.unwrap();
    let mut session = BoardSession::new(BoardService::new(store), Renderer::default(), 64, 64);
    session.start().await.unwrap();
    session
}

#[tokio::test]
async fn strokes_and_clears_reach_every_client() {
    let url = serve().await;
    let mut alice = client(&url).await;
    let mut bob = client(&url).await;

    alice.pointer_mut().press(5.0, 15.0);
    alice.draw();
    alice.pointer_mut().drag(10.0, 20.0);
    alice.draw();
    alice.flush().await;
    assert!(alice.take_alert().is_none());

    for _ in 0..2 {
        let event = timeout(WAIT, bob.next_change()).await.unwrap().unwrap();
        assert_eq!(event.kind, ChangeKind::Added);
    }
    assert_eq!(bob.surface().as_raw(), alice.surface().as_raw());

    // the originator's echo redraws the same pixels
    let before = alice.surface().clone();
    for _ in 0..2 {
        timeout(WAIT, alice.next_change()).await.unwrap().unwrap();
    }
    assert_eq!(alice.surface(), &before);

    bob.clear();
    bob.flush().await;
    assert!(bob.take_alert().is_none());
    loop {
        let event = timeout(WAIT, alice.next_change()).await.unwrap().unwrap();
        if event.kind == ChangeKind::Added && event.record.command == Command::Clear { break; }
    }
    assert!(alice.surface().is_blank());

    let history = bob.service().history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].command, Command::Clear);
}

#[tokio::test]
async fn late_joiner_sees_existing_strokes() {
    let url = serve().await;
    let seed = RemoteCommandStore::new(&url, 8);
    seed.append(Command::Line { x: 10.0, y: 20.0, px: 5.0, py: 15.0 }).await.unwrap();

    let mut late = client(&url).await;
    let event = timeout(WAIT, late.next_change()).await.unwrap().unwrap();
    assert_eq!(event.record.command, Command::Line { x: 10.0, y: 20.0, px: 5.0, py: 15.0 });
    assert!(!late.surface().is_blank());
}

#[tokio::test]
async fn unreachable_server_raises_write_alert() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let store = RemoteCommandStore::new(url, 8);
    let mut session = BoardSession::new(BoardService::new(store), Renderer::default(), 16, 16);
    session.pointer_mut().press(2.0, 2.0);
    session.draw();
    session.flush().await;
    assert!(session.take_alert().is_some());
    assert!(!session.surface().is_blank());
}
