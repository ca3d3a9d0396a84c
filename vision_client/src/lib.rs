mod error;
mod moondream;
mod types;
mod vision_model;

pub mod config;

pub use config::InferenceConfig;
pub use error::InferenceError;
pub use moondream::{encode_image, MoondreamClient};
pub use types::{
    CaptionLength, CaptionResponse, DetectResponse, NormalizedBox, NormalizedPoint, PointResponse,
    QueryResponse,
};
pub use vision_model::VisionModel;
