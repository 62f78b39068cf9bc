use ndarray::Array2;

use crate::shared::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityVerdict {
    Pass,
    TooSmall { width: u32, height: u32 },
    Blurry { focus_measure: f64 },
}

/// Rejects face crops too small or too blurry to recognize.
///
/// Both thresholds are lower bounds: a crop at exactly the threshold passes.
#[derive(Debug, Clone)]
pub struct FaceQualityGate {
    min_face_size: u32,
    focus_threshold: f64,
}

impl FaceQualityGate {
    pub fn new(min_face_size: u32, focus_threshold: f64) -> Self {
        Self {
            min_face_size,
            focus_threshold,
        }
    }

    pub fn check(&self, face: &Frame) -> QualityVerdict {
        if face.width() < self.min_face_size || face.height() < self.min_face_size {
            return QualityVerdict::TooSmall {
                width: face.width(),
                height: face.height(),
            };
        }
        let focus_measure = variance_of_laplacian(&face.grayscale());
        if focus_measure < self.focus_threshold {
            return QualityVerdict::Blurry { focus_measure };
        }
        QualityVerdict::Pass
    }
}

/// Focus measure: population variance of the 3x3 Laplacian response
/// (`0 1 0 / 1 -4 1 / 0 1 0`), borders mirrored without repeating the edge.
pub fn variance_of_laplacian(gray: &Array2<u8>) -> f64 {
    let (h, w) = gray.dim();
    if h == 0 || w == 0 {
        return 0.0;
    }

    let px = |y: isize, x: isize| -> f64 { gray[[reflect_101(y, h), reflect_101(x, w)]] as f64 };

    let n = (h * w) as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for y in 0..h as isize {
        for x in 0..w as isize {
            let lap = px(y - 1, x) + px(y + 1, x) + px(y, x - 1) + px(y, x + 1) - 4.0 * px(y, x);
            sum += lap;
            sum_sq += lap * lap;
        }
    }
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Mirror index `i` into `0..len` as `dcb|abcd|cba`.
fn reflect_101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = i;
    while i < 0 || i > last {
        i = if i < 0 { -i } else { 2 * last - i };
    }
    i as usize
}
