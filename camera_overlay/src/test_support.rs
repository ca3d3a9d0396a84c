use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::{io::Cursor, time::Duration};

pub const CAMERA_ID: &str = "cam-1";
pub const BROKEN_CAMERA_ID: &str = "broken";
/// Answers only after `SLOW_CAMERA_DELAY`.
pub const SLOW_CAMERA_ID: &str = "slow";
pub const SLOW_CAMERA_DELAY: Duration = Duration::from_secs(3);
pub const WIDTH: u32 = 80;
pub const HEIGHT: u32 = 60;

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([40, 40, 40]));
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

async fn camera_image(Path(camera_id): Path<String>) -> impl IntoResponse {
    match camera_id.as_str() {
        CAMERA_ID => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/jpeg")],
            jpeg_bytes(WIDTH, HEIGHT),
        )
            .into_response(),
        BROKEN_CAMERA_ID => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/jpeg")],
            b"definitely not a jpeg".to_vec(),
        )
            .into_response(),
        SLOW_CAMERA_ID => {
            tokio::time::sleep(SLOW_CAMERA_DELAY).await;
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "image/jpeg")],
                jpeg_bytes(WIDTH, HEIGHT),
            )
                .into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serves `/api/cameras/{id}/image` on an ephemeral port and returns the base URL.
pub async fn spawn_camera_server() -> String {
    let router = Router::new().route("/api/cameras/{camera_id}/image", get(camera_image));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL nothing listens on.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:1";
