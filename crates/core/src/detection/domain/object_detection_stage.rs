use std::sync::Arc;

use crate::detection::domain::label_map::LabelMap;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::backend::BackendError;
use crate::shared::constants::{CANDIDATE_SCORE_FLOOR, OBJECT_TOP_K};
use crate::shared::frame::Frame;
use crate::shared::image_result::{FaceAnnotation, ObjectLabel};

/// Resize, detect, threshold, and map boxes back to the original image.
pub struct ObjectDetectionStage {
    detector: Arc<dyn ObjectDetector>,
    label_map: Arc<LabelMap>,
    min_score: f64,
}

impl ObjectDetectionStage {
    pub fn new(detector: Arc<dyn ObjectDetector>, label_map: Arc<LabelMap>, min_score: f64) -> Self {
        Self {
            detector,
            label_map,
            min_score,
        }
    }

    /// Labels for candidates scoring strictly above `min_score`, in the
    /// detector's order, boxed in `frame` pixel coordinates.
    pub fn detect(&self, frame: &Frame) -> Result<Vec<ObjectLabel>, BackendError> {
        let size = self.detector.input_size();
        let input = frame.resized(size, size);
        let candidates = self
            .detector
            .detect(&input, CANDIDATE_SCORE_FLOOR, OBJECT_TOP_K)?;

        let mut labels = Vec::with_capacity(candidates.len());
        for c in candidates {
            let Some(name) = self.label_map.name(c.class_id) else {
                log::warn!("class id {} missing from label map, dropping", c.class_id);
                continue;
            };
            log::debug!("id: {} name: {} score: {}", c.class_id, name, c.score);
            if (c.score as f64) <= self.min_score {
                continue;
            }
            labels.push(ObjectLabel {
                id: c.class_id,
                name: name.to_string(),
                score: c.score as f64,
                bbox: c.bbox.to_detection_box(frame.width(), frame.height()),
                face: FaceAnnotation::NotEvaluated,
            });
        }
        Ok(labels)
    }
}
