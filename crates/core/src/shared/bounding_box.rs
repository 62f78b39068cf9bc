use serde::{Deserialize, Serialize};

/// Object box in pixel units of the image it was detected in.
///
/// Convention used throughout the crate: `(xmin, ymin)` is the top-left
/// corner and `(xmax, ymax)` the bottom-right, with y growing downward.
/// Field order matches the JSON consumed by the alarm uploader.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub ymin: f64,
    pub xmin: f64,
    pub ymax: f64,
    pub xmax: f64,
}

impl DetectionBox {
    /// Integer window covered by the box, truncating each coordinate toward
    /// zero and clamping to `width` x `height`.
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> PixelRect {
        PixelRect::clamped(
            self.xmin as i64,
            self.ymin as i64,
            self.xmax as i64,
            self.ymax as i64,
            width,
            height,
        )
    }
}

/// Detector output relative to the model input, every coordinate in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl NormalizedBox {
    /// Scales by `(width, height, width, height)` of the image the
    /// detector input was resized from.
    pub fn to_detection_box(&self, width: u32, height: u32) -> DetectionBox {
        let (w, h) = (width as f64, height as f64);
        DetectionBox {
            ymin: self.ymin as f64 * h,
            xmin: self.xmin as f64 * w,
            ymax: self.ymax as f64 * h,
            xmax: self.xmax as f64 * w,
        }
    }

    pub fn to_pixel_rect(&self, width: u32, height: u32) -> PixelRect {
        self.to_detection_box(width, height)
            .to_pixel_rect(width, height)
    }
}

/// Half-open integer window `[left, right) x [top, bottom)` inside an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelRect {
    /// Slices like an array index: bounds are clamped to the image and an
    /// inverted range collapses to zero extent.
    pub fn clamped(left: i64, top: i64, right: i64, bottom: i64, width: u32, height: u32) -> Self {
        let clamp_x = |v: i64| v.clamp(0, width as i64) as u32;
        let clamp_y = |v: i64| v.clamp(0, height as i64) as u32;
        let (left, right) = (clamp_x(left), clamp_x(right));
        let (top, bottom) = (clamp_y(top), clamp_y(bottom));
        Self {
            left,
            top,
            right: right.max(left),
            bottom: bottom.max(top),
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}
