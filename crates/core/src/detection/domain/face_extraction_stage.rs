use std::sync::Arc;

use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::backend::BackendError;
use crate::shared::bounding_box::{DetectionBox, PixelRect};
use crate::shared::constants::{CANDIDATE_SCORE_FLOOR, FACE_TOP_K};
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("person box {0:?} covers no pixels of the image")]
pub struct EmptyRoiError(pub DetectionBox);

/// The person region and the best face inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFace {
    pub roi: Frame,
    /// Face window in ROI pixel coordinates (no offset back to the image).
    pub face: PixelRect,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FaceExtraction {
    Found(ExtractedFace),
    EmptyRoi(EmptyRoiError),
    NoFace,
}

/// Cuts the person box out of the image and localizes a face in it.
pub struct FaceExtractionStage {
    detector: Arc<dyn FaceDetector>,
}

impl FaceExtractionStage {
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self { detector }
    }

    pub fn extract(&self, image: &Frame, person: &DetectionBox) -> Result<FaceExtraction, BackendError> {
        // Box is (left=xmin, top=ymin, right=xmax, bottom=ymax) with y downward.
        let roi_rect = person.to_pixel_rect(image.width(), image.height());
        if roi_rect.is_empty() {
            return Ok(FaceExtraction::EmptyRoi(EmptyRoiError(*person)));
        }
        let roi = image.crop(&roi_rect);

        let size = self.detector.input_size();
        let input = roi.resized(size, size);
        let candidates = self.detector.detect(&input, CANDIDATE_SCORE_FLOOR, FACE_TOP_K)?;
        // Highest score wins; ties keep the earlier candidate.
        let Some(best) = candidates
            .into_iter()
            .reduce(|best, c| if c.score > best.score { c } else { best })
        else {
            return Ok(FaceExtraction::NoFace);
        };

        let face = best.bbox.to_pixel_rect(roi.width(), roi.height());
        Ok(FaceExtraction::Found(ExtractedFace { roi, face }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::FaceCandidate;
    use crate::shared::bounding_box::NormalizedBox;
    use crate::shared::frame::ChannelOrder;
    use std::sync::Mutex;

    struct StubFaceDetector {
        faces: Vec<FaceCandidate>,
        calls: Mutex<usize>,
    }

    impl StubFaceDetector {
        fn new(faces: Vec<FaceCandidate>) -> Self {
            Self {
                faces,
                calls: Mutex::new(0),
            }
        }
    }

    impl FaceDetector for StubFaceDetector {
        fn input_size(&self) -> u32 {
            320
        }

        fn detect(
            &self,
            input: &Frame,
            _score_floor: f32,
            _top_k: usize,
        ) -> Result<Vec<FaceCandidate>, BackendError> {
            assert_eq!((input.width(), input.height()), (320, 320));
            *self.calls.lock().unwrap() += 1;
            Ok(self.faces.clone())
        }
    }

    fn face(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> FaceCandidate {
        scored_face(0.9, xmin, ymin, xmax, ymax)
    }

    fn scored_face(score: f32, xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> FaceCandidate {
        FaceCandidate {
            score,
            bbox: NormalizedBox {
                xmin,
                ymin,
                xmax,
                ymax,
            },
        }
    }

    fn image() -> Frame {
        Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, ChannelOrder::Rgb)
    }

    fn person(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> DetectionBox {
        DetectionBox {
            ymin,
            xmin,
            ymax,
            xmax,
        }
    }

    #[test]
    fn test_face_box_is_roi_relative() {
        let detector = Arc::new(StubFaceDetector::new(vec![face(0.25, 0.0, 0.75, 0.5)]));
        let stage = FaceExtractionStage::new(detector);

        let result = stage.extract(&image(), &person(100.0, 20.0, 180.0, 80.0)).unwrap();
        let FaceExtraction::Found(found) = result else {
            panic!("expected a face");
        };
        assert_eq!((found.roi.width(), found.roi.height()), (80, 60));
        assert_eq!(
            found.face,
            PixelRect {
                left: 20,
                top: 0,
                right: 60,
                bottom: 30
            }
        );
    }

    #[test]
    fn test_zero_area_roi_skips_detector() {
        let detector = Arc::new(StubFaceDetector::new(vec![face(0.0, 0.0, 1.0, 1.0)]));
        let stage = FaceExtractionStage::new(detector.clone());

        let result = stage.extract(&image(), &person(50.0, 40.0, 50.0, 90.0)).unwrap();
        assert!(matches!(result, FaceExtraction::EmptyRoi(_)));
        assert_eq!(*detector.calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_box_outside_image_is_empty_roi() {
        let stage = FaceExtractionStage::new(Arc::new(StubFaceDetector::new(vec![])));
        let result = stage.extract(&image(), &person(300.0, 10.0, 400.0, 50.0)).unwrap();
        assert!(matches!(result, FaceExtraction::EmptyRoi(_)));
    }

    #[test]
    fn test_no_face_found() {
        let stage = FaceExtractionStage::new(Arc::new(StubFaceDetector::new(vec![])));
        let result = stage.extract(&image(), &person(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert_eq!(result, FaceExtraction::NoFace);
    }

    #[test]
    fn test_only_top_candidate_used() {
        let detector = Arc::new(StubFaceDetector::new(vec![
            face(0.0, 0.0, 0.5, 0.5),
            face(0.5, 0.5, 1.0, 1.0),
        ]));
        let stage = FaceExtractionStage::new(detector);
        let result = stage.extract(&image(), &person(0.0, 0.0, 100.0, 100.0)).unwrap();
        let FaceExtraction::Found(found) = result else {
            panic!("expected a face");
        };
        assert_eq!(found.face.left, 0);
        assert_eq!(found.face.right, 50);
    }

    #[test]
    fn test_highest_scoring_candidate_wins_regardless_of_order() {
        let detector = Arc::new(StubFaceDetector::new(vec![
            scored_face(0.4, 0.0, 0.0, 0.5, 0.5),
            scored_face(0.8, 0.5, 0.5, 1.0, 1.0),
            scored_face(0.6, 0.0, 0.5, 0.5, 1.0),
        ]));
        let stage = FaceExtractionStage::new(detector);
        let result = stage.extract(&image(), &person(0.0, 0.0, 100.0, 100.0)).unwrap();
        let FaceExtraction::Found(found) = result else {
            panic!("expected a face");
        };
        assert_eq!((found.face.left, found.face.top), (50, 50));
    }
}
