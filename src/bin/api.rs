use fund_terminology_assistant::{
    api::{start_server, ApiState},
    completion::generator_from_config,
    config::AppConfig,
    funds::FundsApiClient,
    glossary::Glossary,
    memory::SessionStore,
    reconciler::AnswerReconciler,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    info!("Fund Terminology Assistant - API Server");
    info!("Port: {}", config.port);
    info!("Fund service: {}", config.funds_api_base_url);

    if !config.completion_configured() {
        warn!("GROQ_API_KEY not set; answering from the verified glossary only");
    }

    // Create components
    let glossary = Glossary::load(config.glossary_path.as_deref())?;
    let generator = generator_from_config(&config)?;
    let reconciler = AnswerReconciler::new(glossary, generator.clone())
        .with_timeout(config.completion_timeout);

    let state = ApiState {
        sessions: Arc::new(
            SessionStore::new(Arc::new(reconciler))
                .with_limits(config.session_idle_timeout, config.max_sessions),
        ),
        funds: FundsApiClient::from_config(&config)?,
        generator,
    };

    info!("Assistant initialized");

    // Start API server
    start_server(state, config.port).await?;

    Ok(())
}
