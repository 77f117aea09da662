use backend::{app, config::ServiceConfig, logging::init_logging};
use tracing::info;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let figment = ServiceConfig::figment();
    let config = ServiceConfig::from_figment(&figment)?;
    init_logging(config.log_format, &config.log_filter)?;

    info!(
        allowed_origin = %config.allowed_origin,
        max_mutations = config.max_mutations_per_window,
        "🚀 Starting voting registry"
    );

    let _rocket = app::build(figment, config).launch().await?;
    info!("👋 Voting registry stopped");
    Ok(())
}
