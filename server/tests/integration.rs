//! Integration tests for the multicam server.
//!
//! These tests start a real server instance and connect via WebSocket
//! to verify end-to-end behavior.

use futures_util::{SinkExt, StreamExt};
use multicam_server::protocol::{ClientMsg, EventWire, ServerMsg, WelcomeMsg, PROTOCOL_VERSION};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};

type Ws = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Start a test server on a random available port and return the WebSocket URL.
async fn start_test_server() -> String {
    use multicam_server::config::ServerConfig;
    use multicam_server::session_loop::{run_session_loop, SessionBroadcast, SessionCommand};
    use multicam_server::ws::AppState;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ServerConfig {
        listen_addr: addr.to_string(),
        frame_rate_hz: 60,
        rng_seed: 12345,
        ..Default::default()
    };

    let (session_tx, session_rx) = mpsc::channel::<SessionCommand>(256);
    let (broadcast_tx, _) = broadcast::channel::<SessionBroadcast>(64);

    let app_state = AppState {
        session_tx,
        broadcast_tx: broadcast_tx.clone(),
        container_half_size: config.scene.container_half_size(),
    };

    tokio::spawn(async move {
        run_session_loop(session_rx, broadcast_tx, config).await;
    });

    let app = axum::Router::new()
        .route("/ws", axum::routing::get(multicam_server::ws::ws_handler))
        .with_state(app_state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("ws://{}/ws", addr)
}

async fn connect(url: &str) -> Ws {
    let (ws, _) = connect_async(url).await.expect("Failed to connect");
    ws
}

/// Read the next text message and parse as ServerMsg.
async fn recv_msg(ws: &mut Ws) -> ServerMsg {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(text.as_str()).expect("Failed to parse server message");
            }
            Some(Ok(_)) => continue, // Skip ping/pong
            Some(Err(e)) => panic!("WebSocket error: {}", e),
            None => panic!("WebSocket closed unexpectedly"),
        }
    }
}

async fn recv_welcome(ws: &mut Ws) -> WelcomeMsg {
    match recv_msg(ws).await {
        ServerMsg::Welcome(welcome) => welcome,
        other => panic!("Expected Welcome, got {:?}", other),
    }
}

async fn send(ws: &mut Ws, msg: &ClientMsg) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(Message::Text(json.into())).await.unwrap();
}

/// Read frames until an event matches `pred`, or give up after `timeout`.
async fn wait_for_event<F>(ws: &mut Ws, timeout: Duration, mut pred: F) -> Option<EventWire>
where
    F: FnMut(&EventWire) -> bool,
{
    let search = async {
        loop {
            if let ServerMsg::Frame(frame) = recv_msg(ws).await {
                if let Some(event) = frame.events.into_iter().find(|e| pred(e)) {
                    return event;
                }
            }
        }
    };
    tokio::time::timeout(timeout, search).await.ok()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_connect_and_receive_welcome() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;

    let welcome = recv_welcome(&mut ws).await;
    assert_eq!(welcome.protocol_version, PROTOCOL_VERSION);
    assert!(welcome.self_id > 0, "self_id should be positive");
    assert_eq!(welcome.bodies.len(), 12);
    assert_eq!(welcome.obstacle.radius, 2.5);
    assert!(
        welcome
            .viewports
            .iter()
            .any(|v| v.id == welcome.viewport_id && v.owner_id == welcome.self_id),
        "viewports should include our own"
    );
}

#[tokio::test]
async fn test_multiple_clients_get_unique_ids() {
    let url = start_test_server().await;

    let mut ws1 = connect(&url).await;
    let mut ws2 = connect(&url).await;

    let w1 = recv_welcome(&mut ws1).await;
    let w2 = recv_welcome(&mut ws2).await;

    assert_ne!(w1.self_id, w2.self_id, "Each client should get a unique ID");
    assert_ne!(w1.viewport_id, w2.viewport_id);
}

#[tokio::test]
async fn test_frames_carry_body_positions() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let _welcome = recv_welcome(&mut ws).await;

    let moved = wait_for_event(&mut ws, Duration::from_secs(2), |e| {
        matches!(e, EventWire::BodyMoved(_))
    })
    .await;
    assert!(moved.is_some(), "Bodies should move within a few frames");
}

#[tokio::test]
async fn test_cell_offset_broadcasts_grid_shape() {
    let url = start_test_server().await;
    let mut ws1 = connect(&url).await;
    let w1 = recv_welcome(&mut ws1).await;
    let mut ws2 = connect(&url).await;
    let _w2 = recv_welcome(&mut ws2).await;

    send(
        &mut ws2,
        &ClientMsg::SetCellOffset {
            axis: "X".to_string(),
            value: 1,
        },
    )
    .await;

    // Client 1's viewport is told the grid grew, even though it didn't move
    let event = wait_for_event(&mut ws1, Duration::from_secs(2), |e| match e {
        EventWire::ProjectionChanged(v) => v.id == w1.viewport_id && v.layout.grid_full_width == 2,
        _ => false,
    })
    .await;
    assert!(event.is_some(), "Expected 2x1 grid broadcast to client 1");
}

#[tokio::test]
async fn test_invalid_axis_is_ignored() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let welcome = recv_welcome(&mut ws).await;

    send(
        &mut ws,
        &ClientMsg::SetCellOffset {
            axis: "Z".to_string(),
            value: 3,
        },
    )
    .await;

    let event = wait_for_event(&mut ws, Duration::from_millis(300), |e| match e {
        EventWire::ProjectionChanged(v) => v.id == welcome.viewport_id && v.layout.grid_full_width != 1,
        _ => false,
    })
    .await;
    assert!(event.is_none(), "Invalid axis must not change the grid");

    // Connection is still usable
    send(&mut ws, &ClientMsg::Reset).await;
    let recolored = wait_for_event(&mut ws, Duration::from_secs(2), |e| {
        matches!(e, EventWire::ObstacleRecolored(r) if r.color == 0xaaaaaa)
    })
    .await;
    assert!(recolored.is_some());
}

#[tokio::test]
async fn test_drag_is_clamped_to_container() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let _welcome = recv_welcome(&mut ws).await;

    send(
        &mut ws,
        &ClientMsg::DragObstacle {
            pos: [50.0, -50.0, -4.0],
        },
    )
    .await;

    let event = wait_for_event(&mut ws, Duration::from_secs(2), |e| {
        matches!(e, EventWire::ObstacleMoved(_))
    })
    .await;
    match event {
        Some(EventWire::ObstacleMoved(m)) => assert_eq!(m.pos, [4.0, -4.0, -4.0]),
        other => panic!("Expected ObstacleMoved, got {:?}", other),
    }
}

#[tokio::test]
async fn test_disconnect_removes_viewport() {
    let url = start_test_server().await;
    let mut ws1 = connect(&url).await;
    let _w1 = recv_welcome(&mut ws1).await;
    let mut ws2 = connect(&url).await;
    let w2 = recv_welcome(&mut ws2).await;

    ws2.close(None).await.unwrap();
    drop(ws2);

    let removed = wait_for_event(&mut ws1, Duration::from_secs(2), |e| match e {
        EventWire::ViewportRemoved(r) => r.viewport_id == w2.viewport_id,
        _ => false,
    })
    .await;
    match removed {
        Some(EventWire::ViewportRemoved(r)) => assert_eq!(r.owner_id, w2.self_id),
        other => panic!("Expected ViewportRemoved, got {:?}", other),
    }
}

#[tokio::test]
async fn test_oversized_message_closes_connection() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let _welcome = recv_welcome(&mut ws).await;

    let huge = format!(
        "{{\"type\":\"reset\",\"padding\":\"{}\"}}",
        "x".repeat(2000)
    );
    ws.send(Message::Text(huge.into())).await.unwrap();

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                Some(Ok(_)) => continue, // frames already in flight
            }
        }
    })
    .await
    .unwrap_or(false);
    assert!(closed, "Server should close the connection");
}
