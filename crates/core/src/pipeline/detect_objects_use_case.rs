use std::sync::Arc;

use crate::detection::domain::consecutive_frame_filter::{ConsecutiveFrameFilter, FrameDecision};
use crate::detection::domain::object_detection_stage::ObjectDetectionStage;
use crate::imaging::domain::image_source::ImageSource;
use crate::pipeline::batch_stats::BatchStats;
use crate::shared::image_result::ImageResult;

/// First pass: objects per alarm frame, reusing labels across
/// consecutive frames of one event.
pub struct DetectObjectsUseCase {
    images: Arc<dyn ImageSource>,
    stage: ObjectDetectionStage,
    skip_window: u32,
}

impl DetectObjectsUseCase {
    pub fn new(images: Arc<dyn ImageSource>, stage: ObjectDetectionStage, skip_window: u32) -> Self {
        Self {
            images,
            stage,
            skip_window,
        }
    }

    /// One result per path, in input order. Per-image failures degrade to
    /// an empty label list.
    pub fn execute<S: AsRef<str>>(&self, image_paths: &[S]) -> Vec<ImageResult> {
        let mut filter = ConsecutiveFrameFilter::new(self.skip_window);
        let mut stats = BatchStats::new();
        let mut results = Vec::with_capacity(image_paths.len());

        for path in image_paths {
            let path = path.as_ref();
            log::debug!("finding objects in {path}");
            stats.count("images");

            let address = match filter.check(path) {
                FrameDecision::Unaddressable(e) => {
                    log::error!("could not derive frame identity: {e}");
                    stats.count("unaddressable");
                    results.push(ImageResult::empty(path));
                    continue;
                }
                FrameDecision::Reuse(labels) => {
                    stats.count("reused");
                    results.push(ImageResult {
                        image: path.to_string(),
                        labels,
                    });
                    continue;
                }
                FrameDecision::Infer(address) => address,
            };

            let frame = match stats.time("decode", || self.images.load(path)) {
                Ok(frame) => frame,
                Err(e) => {
                    log::error!("{e}");
                    stats.count("undecodable");
                    results.push(ImageResult::empty(path));
                    continue;
                }
            };

            match stats.time("detect", || self.stage.detect(&frame)) {
                Ok(labels) => {
                    stats.count("inferred");
                    filter.record(address, &labels);
                    results.push(ImageResult {
                        image: path.to_string(),
                        labels,
                    });
                }
                Err(e) => {
                    log::error!("object detection failed for {path}: {e}");
                    stats.count("backend_errors");
                    results.push(ImageResult::empty(path));
                }
            }
        }

        stats.log_summary("objects");
        results
    }

    /// JSON boundary: array of image results.
    pub fn execute_json<S: AsRef<str>>(&self, image_paths: &[S]) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.execute(image_paths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::label_map::LabelMap;
    use crate::detection::domain::object_detector::{ObjectCandidate, ObjectDetector};
    use crate::imaging::domain::image_source::ImageDecodeError;
    use crate::shared::backend::BackendError;
    use crate::shared::bounding_box::NormalizedBox;
    use crate::shared::frame::{ChannelOrder, Frame};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves frames whose first byte encodes a class id for [`ByteDetector`].
    struct StubImages {
        class_by_path: HashMap<String, u8>,
    }

    impl ImageSource for StubImages {
        fn load(&self, image_path: &str) -> Result<Frame, ImageDecodeError> {
            let class = self
                .class_by_path
                .get(image_path)
                .ok_or_else(|| ImageDecodeError {
                    path: image_path.to_string(),
                    reason: "missing".to_string(),
                })?;
            Ok(Frame::new(vec![*class; 300 * 300 * 3], 300, 300, ChannelOrder::Rgb))
        }
    }

    /// Detects one object whose class is the first pixel value.
    struct ByteDetector {
        calls: Mutex<usize>,
        fail_on_class: Option<u8>,
    }

    impl ObjectDetector for ByteDetector {
        fn input_size(&self) -> u32 {
            300
        }

        fn detect(
            &self,
            input: &Frame,
            _score_floor: f32,
            _top_k: usize,
        ) -> Result<Vec<ObjectCandidate>, BackendError> {
            *self.calls.lock().unwrap() += 1;
            let class = input.data()[0];
            if Some(class) == self.fail_on_class {
                return Err("inference failed".into());
            }
            Ok(vec![ObjectCandidate {
                class_id: class as i64,
                score: 0.9,
                bbox: NormalizedBox {
                    xmin: 0.0,
                    ymin: 0.0,
                    xmax: 0.5,
                    ymax: 0.5,
                },
            }])
        }
    }

    fn path(monitor: &str, frame: u32) -> String {
        format!("/nvr/zm/events/{monitor}/18/06/20/19/20/04/{frame:05}-capture.jpg")
    }

    fn use_case(
        images: &[(String, u8)],
        skip_window: u32,
        fail_on_class: Option<u8>,
    ) -> (DetectObjectsUseCase, Arc<ByteDetector>) {
        let detector = Arc::new(ByteDetector {
            calls: Mutex::new(0),
            fail_on_class,
        });
        let labels: LabelMap = [(0, "person"), (2, "car"), (17, "dog")].into_iter().collect();
        let stage = ObjectDetectionStage::new(detector.clone(), Arc::new(labels), 0.5);
        let source = StubImages {
            class_by_path: images.iter().cloned().collect(),
        };
        (
            DetectObjectsUseCase::new(Arc::new(source), stage, skip_window),
            detector,
        )
    }

    fn names(result: &ImageResult) -> Vec<&str> {
        result.labels.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn test_consecutive_frame_reuses_labels_without_detection() {
        let a = path("Porch", 224);
        let b = path("Porch", 225);
        let (uc, detector) = use_case(&[(a.clone(), 0), (b.clone(), 2)], 2, None);

        let results = uc.execute(&[a.clone(), b.clone()]);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].image, a);
        assert_eq!(results[1].image, b);
        assert_eq!(results[1].labels, results[0].labels);
        assert_eq!(names(&results[1]), vec!["person"]);
        assert_eq!(*detector.calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_frames_outside_window_are_detected() {
        let a = path("Porch", 224);
        let b = path("Porch", 230);
        let c = path("Driveway", 231);
        let (uc, detector) = use_case(&[(a.clone(), 0), (b.clone(), 2), (c.clone(), 17)], 2, None);

        let results = uc.execute(&[a, b, c]);

        assert_eq!(names(&results[0]), vec!["person"]);
        assert_eq!(names(&results[1]), vec!["car"]);
        assert_eq!(names(&results[2]), vec!["dog"]);
        assert_eq!(*detector.calls.lock().unwrap(), 3);
    }

    #[test]
    fn test_malformed_path_yields_empty_result_and_continues() {
        let good = path("Porch", 1);
        let (uc, _) = use_case(&[(good.clone(), 2)], 2, None);

        let results = uc.execute(&["bad/path.jpg".to_string(), good]);

        assert_eq!(results[0], ImageResult::empty("bad/path.jpg"));
        assert_eq!(names(&results[1]), vec!["car"]);
    }

    #[test]
    fn test_undecodable_image_yields_empty_result() {
        let missing = path("Porch", 1);
        let next = path("Porch", 9);
        let (uc, detector) = use_case(&[(next.clone(), 17)], 2, None);

        let results = uc.execute(&[missing.clone(), next]);

        assert_eq!(results[0], ImageResult::empty(&missing));
        assert_eq!(names(&results[1]), vec!["dog"]);
        assert_eq!(*detector.calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_undecodable_image_does_not_move_anchor() {
        let a = path("Porch", 10);
        let unreadable = path("Porch", 20);
        let c = path("Porch", 21);
        let (uc, _) = use_case(&[(a.clone(), 2), (c.clone(), 17)], 2, None);

        let results = uc.execute(&[a, unreadable, c]);

        // 21 is 11 frames past the anchor at 10, so it is detected afresh.
        assert!(results[1].labels.is_empty());
        assert_eq!(names(&results[2]), vec!["dog"]);
    }

    #[test]
    fn test_backend_failure_degrades_to_empty_labels() {
        let a = path("Porch", 1);
        let b = path("Driveway", 1);
        let (uc, _) = use_case(&[(a.clone(), 2), (b.clone(), 0)], 2, Some(2));

        let results = uc.execute(&[a, b]);

        assert!(results[0].labels.is_empty());
        assert_eq!(names(&results[1]), vec!["person"]);
    }

    #[test]
    fn test_state_does_not_leak_between_batches() {
        let a = path("Porch", 224);
        let b = path("Porch", 225);
        let (uc, detector) = use_case(&[(a.clone(), 0), (b.clone(), 2)], 2, None);

        uc.execute(&[a]);
        let second = uc.execute(&[b]);

        assert_eq!(names(&second[0]), vec!["car"]);
        assert_eq!(*detector.calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_same_single_image_batch_is_idempotent() {
        let a = path("Porch", 5);
        let (uc, _) = use_case(&[(a.clone(), 17)], 2, None);
        assert_eq!(uc.execute(&[a.clone()]), uc.execute(&[a]));
    }

    #[test]
    fn test_execute_json_shape() {
        let a = path("Porch", 5);
        let (uc, _) = use_case(&[(a.clone(), 0)], 2, None);

        let json: serde_json::Value =
            serde_json::from_str(&uc.execute_json(&[a.clone()]).unwrap()).unwrap();

        assert_eq!(json[0]["image"], a.as_str());
        let label = &json[0]["labels"][0];
        assert_eq!(label["name"], "person");
        assert_eq!(label["id"], 0);
        assert_eq!(label["box"]["xmax"], 150.0);
        assert!(label.get("face").is_none());
    }
}
