/// Single-shot detector using ONNX Runtime via `ort`.
///
/// Expects the TensorFlow object-detection export convention: a uint8 NHWC
/// image in, `detection_boxes` / `detection_scores` / `detection_classes`
/// out, with boxes as normalized `(ymin, xmin, ymax, xmax)`.
use std::path::Path;
use std::sync::Mutex;

use ndarray::Axis;

use crate::detection::domain::face_detector::{FaceCandidate, FaceDetector};
use crate::detection::domain::object_detector::{ObjectCandidate, ObjectDetector};
use crate::shared::backend::BackendError;
use crate::shared::bounding_box::NormalizedBox;
use crate::shared::frame::Frame;
use crate::shared::onnx_session::{declared_input_size, open_session};

const BOXES_OUTPUT: &str = "detection_boxes";
const SCORES_OUTPUT: &str = "detection_scores";
const CLASSES_OUTPUT: &str = "detection_classes";
const COUNT_OUTPUT: &str = "num_detections";

/// One decoded row of the model output.
#[derive(Debug, Clone, PartialEq)]
struct RawDetection {
    class_id: i64,
    score: f32,
    bbox: NormalizedBox,
}

pub struct OnnxSsdDetector {
    session: Mutex<ort::session::Session>,
    input_size: u32,
}

impl OnnxSsdDetector {
    /// Load a detector model. The input resolution comes from the model's
    /// input shape, or `default_input_size` if that is dynamic.
    pub fn new(model_path: &Path, default_input_size: u32) -> Result<Self, BackendError> {
        let session = open_session(model_path)?;
        let input_size = declared_input_size(&session).unwrap_or(default_input_size);
        log::debug!("{} expects {input_size}x{input_size} input", model_path.display());
        Ok(Self {
            session: Mutex::new(session),
            input_size,
        })
    }

    fn run(&self, input: &Frame, score_floor: f32, top_k: usize) -> Result<Vec<RawDetection>, BackendError> {
        let tensor = input.as_ndarray().insert_axis(Axis(0)).to_owned();
        let input_value = ort::value::Tensor::from_array(tensor)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;

        let output = |name: &str, position: usize| -> Result<Vec<f32>, BackendError> {
            let value = match outputs.get(name) {
                Some(value) => value,
                None if position < outputs.len() => &outputs[position],
                None => return Err(format!("detector model has no {name} output").into()),
            };
            let array = value.try_extract_array::<f32>()?;
            Ok(array.iter().copied().collect())
        };

        let boxes = output(BOXES_OUTPUT, 0)?;
        let classes = output(CLASSES_OUTPUT, 1)?;
        let scores = output(SCORES_OUTPUT, 2)?;
        let count = match outputs.get(COUNT_OUTPUT) {
            Some(value) => value
                .try_extract_array::<f32>()?
                .iter()
                .next()
                .map(|n| n.max(0.0) as usize),
            None => None,
        };

        decode(&boxes, &scores, &classes, count, score_floor, top_k)
    }
}

/// Turns flat model outputs into candidates with score >= `score_floor`,
/// keeping model order and at most `top_k` of them.
fn decode(
    boxes: &[f32],
    scores: &[f32],
    classes: &[f32],
    count: Option<usize>,
    score_floor: f32,
    top_k: usize,
) -> Result<Vec<RawDetection>, BackendError> {
    if boxes.len() != scores.len() * 4 || classes.len() != scores.len() {
        return Err(format!(
            "inconsistent detector outputs: {} boxes values, {} scores, {} classes",
            boxes.len(),
            scores.len(),
            classes.len()
        )
        .into());
    }
    let n = count.map_or(scores.len(), |c| c.min(scores.len()));

    Ok((0..n)
        .filter(|&i| scores[i] >= score_floor)
        .take(top_k)
        .map(|i| {
            let b = &boxes[i * 4..i * 4 + 4];
            RawDetection {
                class_id: classes[i] as i64,
                score: scores[i],
                bbox: NormalizedBox {
                    xmin: b[1].clamp(0.0, 1.0),
                    ymin: b[0].clamp(0.0, 1.0),
                    xmax: b[3].clamp(0.0, 1.0),
                    ymax: b[2].clamp(0.0, 1.0),
                },
            }
        })
        .collect())
}

impl ObjectDetector for OnnxSsdDetector {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn detect(
        &self,
        input: &Frame,
        score_floor: f32,
        top_k: usize,
    ) -> Result<Vec<ObjectCandidate>, BackendError> {
        Ok(self
            .run(input, score_floor, top_k)?
            .into_iter()
            .map(|d| ObjectCandidate {
                class_id: d.class_id,
                score: d.score,
                bbox: d.bbox,
            })
            .collect())
    }
}

impl FaceDetector for OnnxSsdDetector {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn detect(
        &self,
        input: &Frame,
        score_floor: f32,
        top_k: usize,
    ) -> Result<Vec<FaceCandidate>, BackendError> {
        Ok(self
            .run(input, score_floor, top_k)?
            .into_iter()
            .map(|d| FaceCandidate {
                score: d.score,
                bbox: d.bbox,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs() -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let boxes = vec![
            0.1, 0.2, 0.5, 0.6, //
            -0.1, 0.0, 1.2, 0.4, //
            0.3, 0.3, 0.4, 0.4, //
            0.0, 0.0, 1.0, 1.0,
        ];
        let scores = vec![0.9, 0.7, 0.05, 0.3];
        let classes = vec![1.0, 3.0, 18.0, 1.0];
        (boxes, scores, classes)
    }

    #[test]
    fn test_decode_reorders_box_and_clamps() {
        let (boxes, scores, classes) = outputs();
        let dets = decode(&boxes, &scores, &classes, None, 0.1, 10).unwrap();
        assert_eq!(dets.len(), 3);
        assert_eq!(
            dets[0].bbox,
            NormalizedBox {
                xmin: 0.2,
                ymin: 0.1,
                xmax: 0.6,
                ymax: 0.5
            }
        );
        assert_eq!(dets[1].bbox.ymin, 0.0);
        assert_eq!(dets[1].bbox.ymax, 1.0);
        assert_eq!(dets[1].class_id, 3);
    }

    #[test]
    fn test_decode_skips_below_floor_and_keeps_model_order() {
        let (boxes, scores, classes) = outputs();
        let dets = decode(&boxes, &scores, &classes, None, 0.1, 10).unwrap();
        let ids: Vec<i64> = dets.iter().map(|d| d.class_id).collect();
        assert_eq!(ids, vec![1, 3, 1]);
    }

    #[test]
    fn test_decode_limits_to_top_k() {
        let (boxes, scores, classes) = outputs();
        let dets = decode(&boxes, &scores, &classes, None, 0.1, 1).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].score, 0.9);
    }

    #[test]
    fn test_decode_respects_reported_count() {
        let (boxes, scores, classes) = outputs();
        let dets = decode(&boxes, &scores, &classes, Some(2), 0.1, 10).unwrap();
        assert_eq!(dets.len(), 2);
    }

    #[test]
    fn test_decode_rejects_mismatched_outputs() {
        assert!(decode(&[0.0; 8], &[0.5], &[1.0], None, 0.1, 3).is_err());
    }
}
