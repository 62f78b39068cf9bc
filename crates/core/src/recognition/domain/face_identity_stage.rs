use std::sync::Arc;

use crate::recognition::domain::face_encoder::{FaceEncoder, FaceLocation};
use crate::recognition::domain::identity_classifier::IdentityClassifier;
use crate::shared::backend::BackendError;
use crate::shared::frame::Frame;
use crate::shared::image_result::Identity;

/// Encodes a face in its person region and names it.
pub struct FaceIdentityStage {
    encoder: Arc<dyn FaceEncoder>,
    classifier: Arc<dyn IdentityClassifier>,
    jitters: u32,
    min_confidence: f64,
}

impl FaceIdentityStage {
    pub fn new(
        encoder: Arc<dyn FaceEncoder>,
        classifier: Arc<dyn IdentityClassifier>,
        jitters: u32,
        min_confidence: f64,
    ) -> Self {
        Self {
            encoder,
            classifier,
            jitters,
            min_confidence,
        }
    }

    /// `roi` is the whole person region, `face` a window inside it; the
    /// encoder sees the region so it keeps context around the face.
    pub fn identify(&self, roi: &Frame, face: FaceLocation) -> Result<Identity, BackendError> {
        let image = roi.with_channel_order(self.encoder.channel_order());
        let encodings = self.encoder.encode(&image, &[face], self.jitters)?;
        let encoding = encodings
            .into_iter()
            .next()
            .ok_or("face encoder returned no encodings")?;

        let (name, proba) = self.classifier.classify(&encoding)?;
        log::debug!("classifier proba {proba:.3} name {name}");
        if proba >= self.min_confidence {
            Ok(Identity::Known(name))
        } else {
            log::debug!("classifier cannot recognize face");
            Ok(Identity::Unrecognized)
        }
    }
}
