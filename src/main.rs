use log::info;
use tokio::net::TcpListener;

use nadlanka_chat::integration::Config;
use nadlanka_chat::state::AppState;

#[tokio::main]
async fn main() {
    let config = Config::default();

    let state = AppState::init(&config)
        .await
        .expect("Failed to initialize app state");

    let addr = config.env.addr();
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    info!("Listening on {addr}");

    axum::serve(listener, nadlanka_chat::app(state, &config))
        .await
        .expect("Failed to start server");
}
