use crate::shared::backend::BackendError;
use crate::shared::bounding_box::NormalizedBox;
use crate::shared::frame::Frame;

/// One raw object candidate, boxes relative to the detector input.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectCandidate {
    pub class_id: i64,
    pub score: f32,
    pub bbox: NormalizedBox,
}

/// Domain interface for object detection.
///
/// Loaded once and shared read-only between concurrent batches.
pub trait ObjectDetector: Send + Sync {
    /// Square input size the frame must be resized to before `detect`.
    fn input_size(&self) -> u32;

    /// Returns at most `top_k` candidates scoring at least `score_floor`,
    /// in the backend's order.
    fn detect(
        &self,
        input: &Frame,
        score_floor: f32,
        top_k: usize,
    ) -> Result<Vec<ObjectCandidate>, BackendError>;
}
