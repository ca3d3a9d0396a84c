use crate::{
    camera::{CameraClient, FetchError},
    config::{PipelineConfig, SnapshotStorage},
    overlay::{render_overlay_with_style, OverlayStyle},
    storage::{self, PersistError},
};
use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::instrument;
use vision_client::{CaptionLength, InferenceError, NormalizedBox, NormalizedPoint, VisionModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Caption,
    Query,
    Detect,
    Point,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Caption => "caption",
            Stage::Query => "query",
            Stage::Detect => "detect",
            Stage::Point => "point",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to load image {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Inference {stage} failed: {source}")]
    Inference {
        stage: Stage,
        #[source]
        source: InferenceError,
    },
    #[error("Persist failed: {0}")]
    Persist(#[from] PersistError),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Detections {
    pub boxes: Vec<NormalizedBox>,
    pub points: Vec<NormalizedPoint>,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub camera_id: String,
    pub caption: String,
    pub answer: String,
    pub detections: Detections,
    pub snapshot_path: Option<PathBuf>,
    pub overlay_path: PathBuf,
}

// Results already written to `out` stay there; the error line is best effort.
fn stage_failed<W: Write>(out: &mut W, stage: Stage, source: InferenceError) -> PipelineError {
    tracing::error!("Inference {} failed: {}", stage, source);
    let _ = writeln!(out, "Error during {}: {}", stage, source);
    PipelineError::Inference { stage, source }
}

/// Fetch, describe, detect, draw and save, one step after the other.
pub struct Pipeline<M: VisionModel> {
    camera: CameraClient,
    model: M,
    settings: PipelineConfig,
    snapshot_storage: Option<SnapshotStorage>,
    style: OverlayStyle,
}

impl<M: VisionModel> Pipeline<M> {
    pub fn new(
        camera: CameraClient,
        model: M,
        settings: PipelineConfig,
        snapshot_storage: Option<SnapshotStorage>,
        style: OverlayStyle,
    ) -> Self {
        Self {
            camera,
            model,
            settings,
            snapshot_storage,
            style,
        }
    }

    #[instrument(skip(self, out))]
    pub async fn run<W: Write>(
        &self,
        camera_id: &str,
        out: &mut W,
    ) -> Result<PipelineReport, PipelineError> {
        let outcome = match self
            .camera
            .fetch_and_save(camera_id, self.snapshot_storage.as_ref())
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to fetch image for camera {}: {}", camera_id, e);
                writeln!(out, "Failed to fetch image for camera {}: {}", camera_id, e)?;
                return Err(e.into());
            }
        };

        let snapshot_path = match outcome.saved {
            Some(Ok(path)) => Some(path),
            Some(Err(e)) => {
                writeln!(out, "Warning: could not save snapshot: {}", e)?;
                None
            }
            None => None,
        };
        let image = &outcome.snapshot.image;

        let caption = self
            .model
            .caption(image, self.settings.caption_length)
            .await
            .map_err(|e| stage_failed(&mut *out, Stage::Caption, e))?
            .caption;
        writeln!(out, "Caption: {}", caption)?;

        let answer = self
            .model
            .query(image, &self.settings.question)
            .await
            .map_err(|e| stage_failed(&mut *out, Stage::Query, e))?
            .answer;
        writeln!(out, "Question: {}", self.settings.question)?;
        writeln!(out, "Answer: {}", answer)?;

        let boxes = self
            .model
            .detect(image, &self.settings.detect_label)
            .await
            .map_err(|e| stage_failed(&mut *out, Stage::Detect, e))?
            .objects;
        writeln!(
            out,
            "Detected {} '{}' object(s)",
            boxes.len(),
            self.settings.detect_label
        )?;

        let points = self
            .model
            .point(image, &self.settings.point_label)
            .await
            .map_err(|e| stage_failed(&mut *out, Stage::Point, e))?
            .points;
        writeln!(
            out,
            "Found {} '{}' point(s)",
            points.len(),
            self.settings.point_label
        )?;

        let overlay = render_overlay_with_style(&image.to_rgb8(), &boxes, &points, &self.style);
        let overlay_path = self.settings.output_path.clone();
        if let Err(e) = storage::save_jpeg(&overlay_path, &overlay).await {
            tracing::error!("Failed to save annotated image: {}", e);
            writeln!(out, "Failed to save annotated image: {}", e)?;
            return Err(e.into());
        }
        tracing::info!("Saved annotated image to {}", overlay_path.display());
        writeln!(out, "Saved annotated image to {}", overlay_path.display())?;

        Ok(PipelineReport {
            camera_id: camera_id.to_string(),
            caption,
            answer,
            detections: Detections { boxes, points },
            snapshot_path,
            overlay_path,
        })
    }
}

/// Captions an image read from disk and writes the caption to `out`.
#[instrument(skip(model, out))]
pub async fn caption_local_image<M: VisionModel, W: Write>(
    model: &M,
    path: &Path,
    length: CaptionLength,
    out: &mut W,
) -> Result<String, PipelineError> {
    let image = match image::open(path) {
        Ok(image) => image,
        Err(source) => {
            tracing::error!("Failed to load image {}: {}", path.display(), source);
            writeln!(out, "Failed to load image {}: {}", path.display(), source)?;
            return Err(PipelineError::Load {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let caption = model
        .caption(&image, length)
        .await
        .map_err(|e| stage_failed(&mut *out, Stage::Caption, e))?
        .caption;
    writeln!(out, "{}", caption)?;

    Ok(caption)
}
