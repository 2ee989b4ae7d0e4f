use axum::routing::get;
use axum::Router;
use tokio::sync::{broadcast, mpsc};
use tower_http::cors::CorsLayer;
use wheel_server::config::ServerConfig;
use wheel_server::spin_loop::{run_spin_loop, WheelBroadcast, WheelCommand};
use wheel_server::ws::{ws_handler, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid server configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let listen_addr = config.listen_addr.clone();

    let (wheel_tx, wheel_rx) = mpsc::channel::<WheelCommand>(256);
    // Sized for a full spin of frames at the default tick rate
    let (broadcast_tx, _) = broadcast::channel::<WheelBroadcast>(512);

    // Spawn spin loop
    let bc_tx = broadcast_tx.clone();
    tokio::spawn(async move {
        run_spin_loop(wheel_rx, bc_tx, config).await;
    });

    let app_state = AppState {
        wheel_tx,
        broadcast_tx,
    };
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    tracing::info!("Starting wheel server on {}", listen_addr);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {}: {}", listen_addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
