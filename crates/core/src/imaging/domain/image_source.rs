use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
#[error("could not read image {path}: {reason}")]
pub struct ImageDecodeError {
    pub path: String,
    pub reason: String,
}

/// Loads alarm images by the path the caller supplied.
pub trait ImageSource: Send + Sync {
    fn load(&self, image_path: &str) -> Result<Frame, ImageDecodeError>;
}
