use churchflow_api::{config, server};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting ChurchFlow API in {:?} mode", config.environment);

    if let Err(e) = server::serve(config.server.port).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
