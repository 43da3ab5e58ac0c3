use axum::routing::get;
use axum::Router;
use multicam_server::config::ServerConfig;
use multicam_server::session_loop::{run_session_loop, SessionBroadcast, SessionCommand};
use multicam_server::ws::{ws_handler, AppState};
use tokio::sync::{broadcast, mpsc};
use tower_http::cors::CorsLayer;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = ServerConfig::from_env();

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        tracing::error!(%e, "invalid server configuration");
        std::process::exit(1);
    }

    let listen_addr = config.listen_addr.clone();
    let container_half_size = config.scene.container_half_size();

    let (session_tx, session_rx) = mpsc::channel::<SessionCommand>(256);
    let (broadcast_tx, _) = broadcast::channel::<SessionBroadcast>(64);

    let bc_tx = broadcast_tx.clone();
    tokio::spawn(async move {
        run_session_loop(session_rx, bc_tx, config).await;
    });

    let app_state = AppState {
        session_tx,
        broadcast_tx,
        container_half_size,
    };
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%e, addr = %listen_addr, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!("multicam server listening on {}", listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(%e, "server error");
        std::process::exit(1);
    }
}
