use image::{ImageFormat, RgbImage};
use std::{
    io::Cursor,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

async fn ensure_parent(path: &Path) -> Result<(), PersistError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| PersistError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

/// Writes `bytes` to `path`, creating missing directories.
pub async fn save_bytes(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    ensure_parent(path).await?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| PersistError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Encodes `image` as JPEG and writes it to `path`.
pub async fn save_jpeg(path: &Path, image: &RgbImage) -> Result<(), PersistError> {
    let mut buf: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|source| PersistError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    save_bytes(path, &buf).await
}
