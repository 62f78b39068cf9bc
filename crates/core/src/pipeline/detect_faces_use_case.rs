use std::sync::Arc;

use crate::detection::domain::face_extraction_stage::{FaceExtraction, FaceExtractionStage};
use crate::imaging::domain::image_source::ImageSource;
use crate::pipeline::batch_stats::BatchStats;
use crate::recognition::domain::face_identity_stage::FaceIdentityStage;
use crate::recognition::domain::face_quality_gate::{FaceQualityGate, QualityVerdict};
use crate::shared::frame::Frame;
use crate::shared::image_result::{FaceAnnotation, Identity, ImageResult, ObjectLabel};

/// Second pass: recognize faces inside every `person` label of the
/// first pass's output.
pub struct DetectFacesUseCase {
    images: Arc<dyn ImageSource>,
    extraction: FaceExtractionStage,
    gate: FaceQualityGate,
    identity: FaceIdentityStage,
}

impl DetectFacesUseCase {
    pub fn new(
        images: Arc<dyn ImageSource>,
        extraction: FaceExtractionStage,
        gate: FaceQualityGate,
        identity: FaceIdentityStage,
    ) -> Self {
        Self {
            images,
            extraction,
            gate,
            identity,
        }
    }

    /// Returns annotated copies in input order. Person labels get a face
    /// field (`NoFace` on any rejection); other labels pass through.
    pub fn execute(&self, results: &[ImageResult]) -> Vec<ImageResult> {
        let mut stats = BatchStats::new();
        let annotated = results
            .iter()
            .map(|result| self.annotate(result, &mut stats))
            .collect();
        stats.log_summary("faces");
        annotated
    }

    /// JSON boundary: consumes and returns an array of image results.
    pub fn execute_json(&self, raw: &str) -> Result<String, serde_json::Error> {
        let results: Vec<ImageResult> = serde_json::from_str(raw)?;
        serde_json::to_string(&self.execute(&results))
    }

    fn annotate(&self, result: &ImageResult, stats: &mut BatchStats) -> ImageResult {
        log::debug!("finding faces in {}", result.image);
        stats.count("images");

        // Decoded on first person label only.
        let mut image: Option<Option<Frame>> = None;
        let labels = result
            .labels
            .iter()
            .map(|label| {
                if !label.is_person() {
                    return label.clone();
                }
                stats.count("persons");
                let frame = image.get_or_insert_with(|| {
                    match stats.time("decode", || self.images.load(&result.image)) {
                        Ok(frame) => Some(frame),
                        Err(e) => {
                            log::error!("{e}");
                            stats.count("undecodable");
                            None
                        }
                    }
                });
                let face = match frame {
                    Some(frame) => self.recognize(frame, label, stats),
                    None => FaceAnnotation::NoFace,
                };
                label.with_face(face)
            })
            .collect();

        ImageResult {
            image: result.image.clone(),
            labels,
        }
    }

    fn recognize(&self, image: &Frame, label: &ObjectLabel, stats: &mut BatchStats) -> FaceAnnotation {
        let extraction = stats.time("face_detect", || self.extraction.extract(image, &label.bbox));
        let found = match extraction {
            Ok(FaceExtraction::Found(found)) => found,
            Ok(FaceExtraction::EmptyRoi(e)) => {
                log::error!("{e}");
                stats.count("empty_roi");
                return FaceAnnotation::NoFace;
            }
            Ok(FaceExtraction::NoFace) => {
                log::debug!("no face detected");
                stats.count("no_face");
                return FaceAnnotation::NoFace;
            }
            Err(e) => {
                log::error!("face detection failed: {e}");
                stats.count("backend_errors");
                return FaceAnnotation::NoFace;
            }
        };

        match self.gate.check(&found.roi.crop(&found.face)) {
            QualityVerdict::Pass => {}
            QualityVerdict::TooSmall { width, height } => {
                log::debug!("face too small to recognize ({width}x{height})");
                stats.count("too_small");
                return FaceAnnotation::NoFace;
            }
            QualityVerdict::Blurry { focus_measure } => {
                log::debug!("face too blurry to recognize (focus measure {focus_measure:.1})");
                stats.count("blurry");
                return FaceAnnotation::NoFace;
            }
        }

        match stats.time("identify", || self.identity.identify(&found.roi, found.face.into())) {
            Ok(identity) => {
                stats.count(match identity {
                    Identity::Known(_) => "recognized",
                    Identity::Unrecognized => "unrecognized",
                });
                FaceAnnotation::Identified(identity)
            }
            Err(e) => {
                log::error!("face recognition failed: {e}");
                stats.count("backend_errors");
                FaceAnnotation::NoFace
            }
        }
    }
}
