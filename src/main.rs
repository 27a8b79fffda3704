mod backend;
mod pages;
mod routes;
mod services;
mod state;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let config = backend::config::BackendConfig::from_env().expect("backend config invalid");
    let kind = config.kind();
    let backend = backend::connect(config).expect("backend client init failed");
    tracing::info!(backend = ?kind, "backend initialized");

    let state = state::AppState::new(backend, state::Settings::from_env());
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "medlink listening");
    axum::serve(listener, app).await.expect("server failed");
}
