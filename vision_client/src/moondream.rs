use crate::{
    config::InferenceConfig,
    error::InferenceError,
    types::{CaptionLength, CaptionResponse, DetectResponse, PointResponse, QueryResponse},
    vision_model::VisionModel,
};
use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use std::{io::Cursor, time::Duration};
use tracing::instrument;

const AUTH_HEADER: &str = "X-Moondream-Auth";

#[derive(Serialize)]
struct CaptionRequest<'a> {
    image_url: &'a str,
    length: CaptionLength,
    stream: bool,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    image_url: &'a str,
    question: &'a str,
    stream: bool,
}

#[derive(Serialize)]
struct ObjectRequest<'a> {
    image_url: &'a str,
    object: &'a str,
}

/// Encodes an image as a base64 JPEG data URL.
pub fn encode_image(image: &DynamicImage) -> Result<String, InferenceError> {
    let mut buf: Vec<u8> = Vec::new();
    // JPEG has no alpha channel
    image
        .to_rgb8()
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)?;
    Ok(format!(
        "data:image/jpeg;base64,{}",
        BASE64_STANDARD.encode(&buf)
    ))
}

/// HTTP client for the Moondream API, hosted or local.
#[derive(Debug, Clone)]
pub struct MoondreamClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl MoondreamClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let endpoint = config.get_endpoint().to_string();
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty());

        if !config.is_local() && api_key.is_none() {
            return Err(InferenceError::MissingApiKey(endpoint));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(InferenceError::ClientBuild)?;

        tracing::info!("Moondream client targeting {}", endpoint);

        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    async fn post<B, R>(&self, route: &str, body: &B) -> Result<R, InferenceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, route);

        let mut request = self.http.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header(AUTH_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|source| InferenceError::Transport {
                endpoint: url.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| InferenceError::Transport {
                endpoint: url.clone(),
                source,
            })?;

        tracing::debug!("{} responded with {} ({} bytes)", url, status, text.len());

        match status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(InferenceError::Unauthorized {
                    endpoint: url,
                    status,
                })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(InferenceError::RateLimited { endpoint: url })
            }
            _ => {
                return Err(InferenceError::Service {
                    endpoint: url,
                    status,
                    body: text,
                })
            }
        }

        serde_json::from_str(&text)
            .map_err(|source| InferenceError::MalformedResponse { endpoint: url, source })
    }
}

#[async_trait]
impl VisionModel for MoondreamClient {
    #[instrument(skip(self, image))]
    async fn caption(
        &self,
        image: &DynamicImage,
        length: CaptionLength,
    ) -> Result<CaptionResponse, InferenceError> {
        tracing::debug!("Requesting {} caption", length.as_str());
        let image_url = encode_image(image)?;
        let request = CaptionRequest {
            image_url: &image_url,
            length,
            stream: false,
        };
        self.post("caption", &request).await
    }

    #[instrument(skip(self, image))]
    async fn query(
        &self,
        image: &DynamicImage,
        question: &str,
    ) -> Result<QueryResponse, InferenceError> {
        let image_url = encode_image(image)?;
        let request = QueryRequest {
            image_url: &image_url,
            question,
            stream: false,
        };
        self.post("query", &request).await
    }

    #[instrument(skip(self, image))]
    async fn detect(
        &self,
        image: &DynamicImage,
        label: &str,
    ) -> Result<DetectResponse, InferenceError> {
        let image_url = encode_image(image)?;
        let request = ObjectRequest {
            image_url: &image_url,
            object: label,
        };
        let response: DetectResponse = self.post("detect", &request).await?;

        tracing::debug!("Detected {} objects for {}", response.objects.len(), label);
        for (i, object) in response.objects.iter().enumerate() {
            tracing::debug!(
                "Object {}: bbox=({:.3}, {:.3}, {:.3}, {:.3})",
                i,
                object.x_min,
                object.y_min,
                object.x_max,
                object.y_max
            );
        }

        Ok(response)
    }

    #[instrument(skip(self, image))]
    async fn point(
        &self,
        image: &DynamicImage,
        label: &str,
    ) -> Result<PointResponse, InferenceError> {
        let image_url = encode_image(image)?;
        let request = ObjectRequest {
            image_url: &image_url,
            object: label,
        };
        self.post("point", &request).await
    }
}
