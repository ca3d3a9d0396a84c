mod storage;

pub mod app;
pub mod camera;
pub mod config;
pub mod overlay;
pub mod pipeline;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use app::{start_app, start_caption};
pub use storage::PersistError;
