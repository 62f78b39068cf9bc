use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::shared::bounding_box::DetectionBox;
use crate::shared::constants::{PERSON_LABEL, UNKNOWN_FACE_NAME};

/// Outcome of identity classification for a usable face.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Known(String),
    /// Classifier confidence fell below the configured floor.
    Unrecognized,
}

impl Identity {
    pub fn name(&self) -> &str {
        match self {
            Identity::Known(name) => name,
            Identity::Unrecognized => UNKNOWN_FACE_NAME,
        }
    }
}

/// Face field of a label.
///
/// JSON: absent when not evaluated, `null` when no usable face was found,
/// otherwise the identity name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FaceAnnotation {
    #[default]
    NotEvaluated,
    NoFace,
    Identified(Identity),
}

impl FaceAnnotation {
    pub fn is_not_evaluated(&self) -> bool {
        matches!(self, FaceAnnotation::NotEvaluated)
    }
}

impl Serialize for FaceAnnotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FaceAnnotation::NotEvaluated | FaceAnnotation::NoFace => serializer.serialize_none(),
            FaceAnnotation::Identified(identity) => serializer.serialize_str(identity.name()),
        }
    }
}

impl<'de> Deserialize<'de> for FaceAnnotation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            None => FaceAnnotation::NoFace,
            Some(name) if name == UNKNOWN_FACE_NAME => {
                FaceAnnotation::Identified(Identity::Unrecognized)
            }
            Some(name) => FaceAnnotation::Identified(Identity::Known(name)),
        })
    }
}

/// One detected object above the score threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectLabel {
    pub id: i64,
    pub name: String,
    pub score: f64,
    #[serde(rename = "box")]
    pub bbox: DetectionBox,
    #[serde(default, skip_serializing_if = "FaceAnnotation::is_not_evaluated")]
    pub face: FaceAnnotation,
}

impl ObjectLabel {
    pub fn is_person(&self) -> bool {
        self.name == PERSON_LABEL
    }

    /// Copy of this label carrying `face`.
    pub fn with_face(&self, face: FaceAnnotation) -> ObjectLabel {
        ObjectLabel {
            face,
            ..self.clone()
        }
    }
}

/// Per-image output of either pass; exactly one per input path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub image: String,
    pub labels: Vec<ObjectLabel>,
}

impl ImageResult {
    pub fn empty(image: &str) -> Self {
        Self {
            image: image.to_string(),
            labels: Vec::new(),
        }
    }
}
