use crate::{camera::CameraClient, config::Config, pipeline};
use std::error::Error;
use vision_client::MoondreamClient;

/// Runs the camera pipeline once.
///
/// Pipeline failures are printed and logged but do not fail the process;
/// only client setup errors are returned.
pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let camera = match CameraClient::new(&config.camera) {
        Ok(camera) => camera,
        Err(e) => {
            tracing::error!("Failed to initialize camera client: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let model = match MoondreamClient::new(&config.inference) {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("Failed to initialize inference client: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let pipeline = pipeline::Pipeline::new(
        camera,
        model,
        config.pipeline.clone(),
        config.camera.snapshot.clone(),
        config.overlay.get_style(),
    );

    let mut stdout = std::io::stdout();
    match pipeline.run(&config.camera.camera_id, &mut stdout).await {
        Ok(report) => tracing::info!(
            "Pipeline finished for camera {}: {} boxes, {} points",
            report.camera_id,
            report.detections.boxes.len(),
            report.detections.points.len()
        ),
        Err(e) => tracing::error!("Pipeline aborted: {}", e),
    }

    Ok(())
}

/// Captions the configured local image once.
pub async fn start_caption(config: Config) -> Result<(), Box<dyn Error>> {
    let model = match MoondreamClient::new(&config.inference) {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("Failed to initialize inference client: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let mut stdout = std::io::stdout();
    if let Err(e) = pipeline::caption_local_image(
        &model,
        &config.caption.image_path,
        config.caption.length,
        &mut stdout,
    )
    .await
    {
        tracing::error!("Captioning aborted: {}", e);
    }

    Ok(())
}
