use crate::shared::backend::BackendError;
use crate::shared::bounding_box::PixelRect;
use crate::shared::frame::{ChannelOrder, Frame};

/// Face window in `(top, right, bottom, left)` order, pixel units of the
/// image handed to the encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceLocation {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl From<PixelRect> for FaceLocation {
    fn from(r: PixelRect) -> Self {
        Self {
            top: r.top,
            right: r.right,
            bottom: r.bottom,
            left: r.left,
        }
    }
}

impl From<FaceLocation> for PixelRect {
    fn from(f: FaceLocation) -> Self {
        PixelRect {
            left: f.left,
            top: f.top,
            right: f.right,
            bottom: f.bottom,
        }
    }
}

/// Domain interface for computing face encodings.
pub trait FaceEncoder: Send + Sync {
    /// Channel ordering the encoder expects its input image in.
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    /// One encoding per entry of `faces`, each resampled `jitters` times.
    fn encode(
        &self,
        image: &Frame,
        faces: &[FaceLocation],
        jitters: u32,
    ) -> Result<Vec<Vec<f32>>, BackendError>;
}
