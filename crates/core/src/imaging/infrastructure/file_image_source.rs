use crate::imaging::domain::image_source::{ImageDecodeError, ImageSource};
use crate::shared::frame::Frame;

/// Reads images from a local mount of the recording server.
///
/// Alarm paths are absolute on the recording server, so the mount point
/// is prefixed verbatim rather than joined.
pub struct FileImageSource {
    mount_point: String,
}

impl FileImageSource {
    pub fn new(mount_point: impl Into<String>) -> Self {
        Self {
            mount_point: mount_point.into(),
        }
    }

    pub fn resolve(&self, image_path: &str) -> String {
        format!("{}{}", self.mount_point, image_path)
    }
}

impl ImageSource for FileImageSource {
    fn load(&self, image_path: &str) -> Result<Frame, ImageDecodeError> {
        let full_path = self.resolve(image_path);
        let decoded = image::open(&full_path).map_err(|e| ImageDecodeError {
            path: full_path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Frame::from_rgb_image(decoded.into_rgb8()))
    }
}
