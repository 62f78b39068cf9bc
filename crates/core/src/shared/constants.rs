/// Square input size of the object detection model.
pub const OBJECT_INPUT_SIZE: u32 = 300;

/// Square input size of the face detection model.
pub const FACE_INPUT_SIZE: u32 = 320;

/// Score floor handed to the detector backends; the real threshold is
/// applied afterwards by the stages.
pub const CANDIDATE_SCORE_FLOOR: f32 = 0.1;

/// Object candidates requested per frame.
pub const OBJECT_TOP_K: usize = 3;

/// Only the best face inside a person box is recognized.
pub const FACE_TOP_K: usize = 1;

/// Length of a face encoding.
pub const EMBEDDING_DIM: usize = 128;

pub const PERSON_LABEL: &str = "person";

/// Name recorded for a face the classifier was not confident about.
pub const UNKNOWN_FACE_NAME: &str = "Unknown";

pub const DEFAULT_CONFIG_PATH: &str = "./config.json";
