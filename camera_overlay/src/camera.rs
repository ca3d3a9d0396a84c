use crate::{
    config::{CameraConfig, SnapshotStorage},
    storage::{self, PersistError},
};
use bytes::Bytes;
use image::DynamicImage;
use reqwest::StatusCode;
use std::{path::PathBuf, time::Duration};
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build http client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("Request for camera {camera_id} failed: {source}")]
    Request {
        camera_id: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Camera {camera_id} responded with status {status}")]
    Status {
        camera_id: String,
        status: StatusCode,
    },
    #[error("Failed to decode image from camera {camera_id}: {source}")]
    Decode {
        camera_id: String,
        #[source]
        source: image::ImageError,
    },
}

/// A camera frame as served, plus its decoded form.
#[derive(Debug, Clone)]
pub struct CameraSnapshot {
    pub camera_id: String,
    pub bytes: Bytes,
    pub image: DynamicImage,
}

impl CameraSnapshot {
    /// Writes the original JPEG bytes to `<base_dir>/<subdir>/<camera_id>.jpg`.
    pub async fn persist(&self, storage: &SnapshotStorage) -> Result<PathBuf, PersistError> {
        let path = storage.get_path(&self.camera_id);
        storage::save_bytes(&path, &self.bytes).await?;
        Ok(path)
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub snapshot: CameraSnapshot,
    /// `None` when no storage was requested.
    pub saved: Option<Result<PathBuf, PersistError>>,
}

#[derive(Debug, Clone)]
pub struct CameraClient {
    http: reqwest::Client,
    base_url: String,
}

impl CameraClient {
    pub fn new(camera_config: &CameraConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(camera_config.timeout_secs))
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: camera_config.get_base_url().to_string(),
        })
    }

    pub fn image_url(&self, camera_id: &str) -> String {
        format!("{}/api/cameras/{}/image", self.base_url, camera_id)
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self, camera_id: &str) -> Result<CameraSnapshot, FetchError> {
        let response = self
            .http
            .get(self.image_url(camera_id))
            .send()
            .await
            .map_err(|source| FetchError::Request {
                camera_id: camera_id.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                camera_id: camera_id.to_string(),
                status,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Request {
                camera_id: camera_id.to_string(),
                source,
            })?;

        let image = image::load_from_memory(&bytes).map_err(|source| FetchError::Decode {
            camera_id: camera_id.to_string(),
            source,
        })?;

        tracing::info!(
            "Fetched {}x{} image from camera {}",
            image.width(),
            image.height(),
            camera_id
        );

        Ok(CameraSnapshot {
            camera_id: camera_id.to_string(),
            bytes,
            image,
        })
    }

    /// Fetches a snapshot and, when `storage` is given, writes it to disk.
    ///
    /// A failed write is reported in [`FetchOutcome::saved`] and never discards
    /// the fetched snapshot.
    pub async fn fetch_and_save(
        &self,
        camera_id: &str,
        storage: Option<&SnapshotStorage>,
    ) -> Result<FetchOutcome, FetchError> {
        let snapshot = self.fetch(camera_id).await?;

        let saved = match storage {
            Some(storage) => {
                let result = snapshot.persist(storage).await;
                match &result {
                    Ok(path) => tracing::info!("Saved snapshot to {}", path.display()),
                    Err(e) => tracing::warn!("Failed to save snapshot: {}", e),
                }
                Some(result)
            }
            None => None,
        };

        Ok(FetchOutcome { snapshot, saved })
    }
}
