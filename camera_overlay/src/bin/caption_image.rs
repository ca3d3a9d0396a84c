use camera_overlay::{config, start_caption, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = config::get_configuration()?;
    telemetry::init_tracing(&config.log_level);

    start_caption(config).await?;

    Ok(())
}
