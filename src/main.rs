use medassist_agent::handlers::create_router;
use medassist_agent::init::app_init;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("🚀 Starting Medical Assistant API...");
    dotenv::dotenv().ok();
    let (config, state) = app_init().await?;
    log::info!("✅ Application state initialized");
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("");
    log::info!("🎉 Server started!");
    log::info!("📍 http://{}", addr);
    log::info!("💬 Ask: http://{}/ask", addr);
    log::info!("❤️  Health: http://{}/health", addr);
    log::info!("");
    log::info!("📚 PubMed: {}", config.pubmed.base_url);
    log::info!("💊 openFDA: {}", config.openfda.base_url);
    log::info!("🧠 Model: {}", config.genai.text_model);
    log::info!(
        "🧭 Planner: {:?}, failure policy: {:?}",
        config.planner,
        config.failure_policy
    );
    log::info!("⚡ rig + PubMed + openFDA (no persistence, no retries)");
    log::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
