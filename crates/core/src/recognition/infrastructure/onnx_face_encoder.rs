/// Face embedding model using ONNX Runtime.
///
/// Produces 128-d L2-normalized encodings, averaged over a fixed set of
/// deterministic resamples of the face window when jitter is requested.
use std::path::Path;
use std::sync::Mutex;

use crate::recognition::domain::face_encoder::{FaceEncoder, FaceLocation};
use crate::shared::backend::BackendError;
use crate::shared::bounding_box::PixelRect;
use crate::shared::constants::EMBEDDING_DIM;
use crate::shared::frame::Frame;
use crate::shared::onnx_session::{declared_input_size, open_session};

const DEFAULT_INPUT_SIZE: u32 = 150;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

/// Window shift per jitter step, as a fraction of the face size.
const SHIFT_FRACTION: f64 = 0.05;

/// Resample applied to the face window before encoding.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Jitter {
    dx: f64,
    dy: f64,
    mirror: bool,
}

const JITTERS: [Jitter; 6] = [
    Jitter { dx: 0.0, dy: 0.0, mirror: false },
    Jitter { dx: 0.0, dy: 0.0, mirror: true },
    Jitter { dx: SHIFT_FRACTION, dy: 0.0, mirror: false },
    Jitter { dx: -SHIFT_FRACTION, dy: 0.0, mirror: false },
    Jitter { dx: 0.0, dy: SHIFT_FRACTION, mirror: false },
    Jitter { dx: 0.0, dy: -SHIFT_FRACTION, mirror: false },
];

pub struct OnnxFaceEncoder {
    session: Mutex<ort::session::Session>,
    input_size: u32,
}

impl OnnxFaceEncoder {
    pub fn new(model_path: &Path) -> Result<Self, BackendError> {
        let session = open_session(model_path)?;
        let input_size = declared_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        Ok(Self {
            session: Mutex::new(session),
            input_size,
        })
    }

    fn embed(&self, face: &Frame, mirror: bool) -> Result<Vec<f32>, BackendError> {
        let tensor = preprocess(face, self.input_size as usize, mirror);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding: Vec<f32> = embedding_array.iter().copied().collect();
        if embedding.len() != EMBEDDING_DIM {
            return Err(format!(
                "face encoder produced {} values, expected {EMBEDDING_DIM}",
                embedding.len()
            )
            .into());
        }
        Ok(embedding)
    }

    fn encode_one(&self, image: &Frame, face: FaceLocation, jitters: u32) -> Result<Vec<f32>, BackendError> {
        let variants = jitter_variants(jitters);
        let mut sum = vec![0.0f32; EMBEDDING_DIM];
        for jitter in variants {
            let window = shifted_window(face.into(), *jitter, image.width(), image.height());
            if window.is_empty() {
                return Err(format!("face window {face:?} lies outside the image").into());
            }
            let embedding = self.embed(&image.crop(&window), jitter.mirror)?;
            for (s, v) in sum.iter_mut().zip(&embedding) {
                *s += v;
            }
        }
        l2_normalize(&mut sum);
        Ok(sum)
    }
}

impl FaceEncoder for OnnxFaceEncoder {
    fn encode(
        &self,
        image: &Frame,
        faces: &[FaceLocation],
        jitters: u32,
    ) -> Result<Vec<Vec<f32>>, BackendError> {
        faces
            .iter()
            .map(|face| self.encode_one(image, *face, jitters))
            .collect()
    }
}

/// First `jitters` resamples, at least the identity one. Requests beyond
/// the distinct variants reuse them, so they are not recomputed.
fn jitter_variants(jitters: u32) -> &'static [Jitter] {
    let n = (jitters as usize).clamp(1, JITTERS.len());
    &JITTERS[..n]
}

fn shifted_window(face: PixelRect, jitter: Jitter, width: u32, height: u32) -> PixelRect {
    let dx = (face.width() as f64 * jitter.dx).round() as i64;
    let dy = (face.height() as f64 * jitter.dy).round() as i64;
    PixelRect::clamped(
        face.left as i64 + dx,
        face.top as i64 + dy,
        face.right as i64 + dx,
        face.bottom as i64 + dy,
        width,
        height,
    )
}

/// Resize to `size` x `size`, normalize, NCHW layout. Channels follow the
/// frame's order; `mirror` flips horizontally.
fn preprocess(face: &Frame, size: usize, mirror: bool) -> ndarray::Array4<f32> {
    let src_w = face.width() as usize;
    let src_h = face.height() as usize;
    let data = face.data();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    if src_w == 0 || src_h == 0 {
        return tensor;
    }

    for y in 0..size {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / size as f64) as usize).min(src_h - 1);
        for x in 0..size {
            let sx = if mirror { size - 1 - x } else { x };
            let src_x = (((sx as f64 + 0.5) * src_w as f64 / size as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * Frame::CHANNELS;
            for c in 0..3 {
                tensor[[0, c, y, x]] = (data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
