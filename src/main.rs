// --- Grafo curricular - servidor HTTP ---

use eduplan::{run_server, AppConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eduplan=info,actix_web=info")))
        .init();

    tracing::info!("=== Grafo curricular (API) ===");
    run_server(config).await
}
