use image::imageops::FilterType;
use ndarray::{Array2, ArrayView3};

use crate::shared::bounding_box::PixelRect;

/// Byte order of the three colour channels in a [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// A decoded alarm image: contiguous 3-channel bytes in row-major order.
///
/// Decoders produce RGB; backends that want another ordering ask for it
/// through [`Frame::with_channel_order`].
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: ChannelOrder,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32, order: ChannelOrder) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            order,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, ChannelOrder::Rgb)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, Self::CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `rect`. The rect must lie within the frame.
    pub fn crop(&self, rect: &PixelRect) -> Frame {
        debug_assert!(rect.right <= self.width && rect.bottom <= self.height);
        let row_bytes = self.width as usize * Self::CHANNELS;
        let mut data = Vec::with_capacity(rect.area() as usize * Self::CHANNELS);
        for y in rect.top..rect.bottom {
            let start = y as usize * row_bytes + rect.left as usize * Self::CHANNELS;
            let end = y as usize * row_bytes + rect.right as usize * Self::CHANNELS;
            data.extend_from_slice(&self.data[start..end]);
        }
        Frame::new(data, rect.width(), rect.height(), self.order)
    }

    /// Resamples to `width` x `height`. Downscaling averages neighbouring
    /// pixels (triangle filter), which behaves like area interpolation.
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        if self.width == width && self.height == height {
            return self.clone();
        }
        let buffer = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("Frame data length must match dimensions");
        let resized = image::imageops::resize(&buffer, width, height, FilterType::Triangle);
        Frame::new(resized.into_raw(), width, height, self.order)
    }

    /// Swaps the red and blue channels when `order` differs from the current one.
    pub fn with_channel_order(&self, order: ChannelOrder) -> Frame {
        if order == self.order {
            return self.clone();
        }
        let mut data = self.data.clone();
        for px in data.chunks_exact_mut(Self::CHANNELS) {
            px.swap(0, 2);
        }
        Frame::new(data, self.width, self.height, order)
    }

    /// Luma plane using the ITU-R BT.601 weights, shape `(height, width)`.
    pub fn grayscale(&self) -> Array2<u8> {
        let (r_idx, b_idx) = match self.order {
            ChannelOrder::Rgb => (0, 2),
            ChannelOrder::Bgr => (2, 0),
        };
        let luma: Vec<u8> = self
            .data
            .chunks_exact(Self::CHANNELS)
            .map(|px| {
                let y = 0.299 * px[r_idx] as f64 + 0.587 * px[1] as f64 + 0.114 * px[b_idx] as f64;
                y.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        Array2::from_shape_vec((self.height as usize, self.width as usize), luma)
            .expect("Frame data length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 7]);
            }
        }
        Frame::new(data, width, height, ChannelOrder::Rgb)
    }

    #[test]
    fn test_construction_and_accessors() {
        let frame = Frame::new(vec![0u8; 12], 2, 2, ChannelOrder::Rgb);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.order(), ChannelOrder::Rgb);
        assert!(!frame.is_empty());
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, ChannelOrder::Rgb);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = gradient(4, 2);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]);
    }

    #[test]
    fn test_crop_copies_requested_window() {
        let frame = gradient(10, 8);
        let rect = PixelRect {
            left: 2,
            top: 3,
            right: 5,
            bottom: 7,
        };
        let crop = frame.crop(&rect);
        assert_eq!(crop.width(), 3);
        assert_eq!(crop.height(), 4);
        let arr = crop.as_ndarray();
        assert_eq!(arr[[0, 0, 0]], 2); // x
        assert_eq!(arr[[0, 0, 1]], 3); // y
        assert_eq!(arr[[3, 2, 0]], 4);
        assert_eq!(arr[[3, 2, 1]], 6);
    }

    #[test]
    fn test_resized_dimensions() {
        let frame = gradient(64, 48);
        let small = frame.resized(30, 30);
        assert_eq!(small.width(), 30);
        assert_eq!(small.height(), 30);
        assert_eq!(small.data().len(), 30 * 30 * 3);
    }

    #[test]
    fn test_resized_uniform_stays_uniform() {
        let frame = Frame::new(vec![90u8; 20 * 20 * 3], 20, 20, ChannelOrder::Rgb);
        let small = frame.resized(5, 5);
        assert!(small.data().iter().all(|&v| v == 90));
    }

    #[test]
    fn test_with_channel_order_swaps_red_and_blue() {
        let frame = Frame::new(vec![10, 20, 30], 1, 1, ChannelOrder::Rgb);
        let bgr = frame.with_channel_order(ChannelOrder::Bgr);
        assert_eq!(bgr.data(), &[30, 20, 10]);
        assert_eq!(bgr.order(), ChannelOrder::Bgr);
        assert_eq!(bgr.with_channel_order(ChannelOrder::Rgb), frame);
    }

    #[test]
    fn test_grayscale_respects_channel_order() {
        let rgb = Frame::new(vec![255, 0, 0], 1, 1, ChannelOrder::Rgb);
        let bgr = Frame::new(vec![0, 0, 255], 1, 1, ChannelOrder::Bgr);
        assert_eq!(rgb.grayscale()[[0, 0]], 76);
        assert_eq!(bgr.grayscale()[[0, 0]], 76);
    }
}
