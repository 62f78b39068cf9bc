use crate::shared::backend::BackendError;
use crate::shared::bounding_box::NormalizedBox;
use crate::shared::frame::Frame;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceCandidate {
    pub score: f32,
    pub bbox: NormalizedBox,
}

/// Domain interface for face detection inside a person region.
pub trait FaceDetector: Send + Sync {
    fn input_size(&self) -> u32;

    /// Best-first face candidates scoring at least `score_floor`.
    fn detect(
        &self,
        input: &Frame,
        score_floor: f32,
        top_k: usize,
    ) -> Result<Vec<FaceCandidate>, BackendError>;
}
