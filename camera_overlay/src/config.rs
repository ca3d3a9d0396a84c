use crate::overlay::OverlayStyle;
use image::Rgb;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use vision_client::{CaptionLength, InferenceConfig};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub camera: CameraConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub caption: CaptionConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

fn deserialize_caption_length<'de, D>(deserializer: D) -> Result<CaptionLength, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default = "default_camera_base_url")]
    pub base_url: String,
    pub camera_id: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub snapshot: Option<SnapshotStorage>,
}

fn default_camera_base_url() -> String {
    "https://webcams.nyctmc.org".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

impl CameraConfig {
    pub fn get_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Where fetched snapshots are kept: `<base_dir>/<subdir>/<camera_id>.jpg`.
#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotStorage {
    pub base_dir: PathBuf,
    pub subdir: String,
}

impl SnapshotStorage {
    pub fn get_path(&self, camera_id: &str) -> PathBuf {
        self.base_dir
            .join(&self.subdir)
            .join(format!("{}.jpg", camera_id))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    pub question: String,
    pub detect_label: String,
    pub point_label: String,
    #[serde(
        default = "default_pipeline_caption_length",
        deserialize_with = "deserialize_caption_length"
    )]
    pub caption_length: CaptionLength,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_pipeline_caption_length() -> CaptionLength {
    CaptionLength::Normal
}

fn default_output_path() -> PathBuf {
    PathBuf::from("images/nyctmc_with_detections.jpg")
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaptionConfig {
    #[serde(default = "default_caption_image_path")]
    pub image_path: PathBuf,
    #[serde(
        default = "default_caption_length",
        deserialize_with = "deserialize_caption_length"
    )]
    pub length: CaptionLength,
}

fn default_caption_image_path() -> PathBuf {
    PathBuf::from("images/frieren.jpg")
}

fn default_caption_length() -> CaptionLength {
    CaptionLength::Short
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            image_path: default_caption_image_path(),
            length: default_caption_length(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ColorConfig {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl From<ColorConfig> for Rgb<u8> {
    fn from(color: ColorConfig) -> Self {
        Rgb([color.red, color.green, color.blue])
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    #[serde(default = "default_box_color")]
    pub box_color: ColorConfig,
    #[serde(default = "default_point_color")]
    pub point_color: ColorConfig,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,
    #[serde(default = "default_point_radius")]
    pub point_radius: u32,
}

fn default_box_color() -> ColorConfig {
    ColorConfig {
        red: 255,
        green: 0,
        blue: 0,
    }
}

fn default_point_color() -> ColorConfig {
    ColorConfig {
        red: 0,
        green: 0,
        blue: 255,
    }
}

fn default_stroke_width() -> u32 {
    3
}

fn default_point_radius() -> u32 {
    4
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            box_color: default_box_color(),
            point_color: default_point_color(),
            stroke_width: default_stroke_width(),
            point_radius: default_point_radius(),
        }
    }
}

impl OverlayConfig {
    pub fn get_style(&self) -> OverlayStyle {
        OverlayStyle {
            box_color: self.box_color.into(),
            stroke_width: self.stroke_width,
            point_color: self.point_color.into(),
            point_radius: self.point_radius,
        }
    }
}

/// Selects `configuration/<name>.yaml` on top of `base.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        [Self::Local, Self::Production]
            .into_iter()
            .find(|env| s.trim().eq_ignore_ascii_case(env.as_str()))
            .ok_or_else(|| format!("APP_ENVIRONMENT `{}` must be `local` or `production`", s))
    }
}

/// Minimum level for our own spans; dependencies are pinned in `telemetry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|level| s.trim().eq_ignore_ascii_case(level.as_str()))
            .ok_or_else(|| {
                format!(
                    "log_level `{}` must be one of `debug`, `info`, `warn` or `error`",
                    s
                )
            })
    }
}

/// Loads `configuration/` from the working directory.
///
/// Call `dotenvy::dotenv()` first so that `.env` entries are visible here.
pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;
    get_configuration_from(&base_path.join("configuration"))
}

pub fn get_configuration_from(configuration_directory: &Path) -> Result<Config, config::ConfigError> {
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("inference.api_key", std::env::var("MOONDREAM_API_KEY").ok())?
        .set_override_option(
            "inference.endpoint",
            std::env::var("MOONDREAM_ENDPOINT").ok(),
        )?
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;

    Ok(config)
}
