use serde::{Deserialize, Serialize};

/// Box in normalized coordinates, each edge a fraction of the image width or height.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct NormalizedBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionLength {
    Short,
    #[default]
    Normal,
    Long,
}

impl CaptionLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionLength::Short => "short",
            CaptionLength::Normal => "normal",
            CaptionLength::Long => "long",
        }
    }
}

impl TryFrom<String> for CaptionLength {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "normal" => Ok(Self::Normal),
            "long" => Ok(Self::Long),
            other => Err(format!(
                "{} is not a supported caption length. Use `short`, `normal` or `long`.",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptionResponse {
    pub caption: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectResponse {
    pub objects: Vec<NormalizedBox>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointResponse {
    pub points: Vec<NormalizedPoint>,
}
