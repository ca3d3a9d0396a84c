use crate::{
    error::InferenceError,
    types::{CaptionLength, CaptionResponse, DetectResponse, PointResponse, QueryResponse},
};
use async_trait::async_trait;
use image::DynamicImage;

/// Remote vision-language model consumed by the pipeline.
///
/// Every call is a single request with no retry; failures are surfaced as-is.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn caption(
        &self,
        image: &DynamicImage,
        length: CaptionLength,
    ) -> Result<CaptionResponse, InferenceError>;

    async fn query(
        &self,
        image: &DynamicImage,
        question: &str,
    ) -> Result<QueryResponse, InferenceError>;

    /// An empty `objects` list means nothing matched `label`.
    async fn detect(
        &self,
        image: &DynamicImage,
        label: &str,
    ) -> Result<DetectResponse, InferenceError>;

    async fn point(&self, image: &DynamicImage, label: &str)
        -> Result<PointResponse, InferenceError>;
}
