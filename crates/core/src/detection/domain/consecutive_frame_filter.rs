use crate::addressing::frame_address::{AddressParseError, FrameAddress};
use crate::shared::image_result::ObjectLabel;

/// What to do with the next image of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameDecision {
    /// Path carries no frame identity; record it with no labels.
    Unaddressable(AddressParseError),
    /// Near-duplicate of the anchor frame; reuse a copy of its labels.
    Reuse(Vec<ObjectLabel>),
    /// Run the detector, then [`ConsecutiveFrameFilter::record`] the result.
    Infer(FrameAddress),
}

/// Skips inference on alarm frames that closely follow an inferred frame
/// of the same monitor.
///
/// The anchor is the last inferred frame. It only moves when a frame
/// outside the skip window is inferred, so a run of skipped frames all
/// copy the same labels. State lives for one batch.
#[derive(Debug, Clone)]
pub struct ConsecutiveFrameFilter {
    skip_window: u32,
    anchor_frame: i64,
    anchor_monitor: String,
    anchor_labels: Vec<ObjectLabel>,
}

impl ConsecutiveFrameFilter {
    pub fn new(skip_window: u32) -> Self {
        Self {
            skip_window,
            anchor_frame: 0,
            anchor_monitor: String::new(),
            anchor_labels: Vec::new(),
        }
    }

    pub fn check(&self, image_path: &str) -> FrameDecision {
        let address = match FrameAddress::parse(image_path) {
            Ok(address) => address,
            Err(e) => return FrameDecision::Unaddressable(e),
        };

        if address.monitor == self.anchor_monitor {
            let frame_diff = address.frame_number - self.anchor_frame;
            // A non-positive gap means a new event or a restarted counter.
            if frame_diff > 0 && frame_diff <= self.skip_window as i64 {
                log::debug!(
                    "monitor {} frame {} within {} of anchor {}, reusing labels",
                    address.monitor,
                    address.frame_number,
                    self.skip_window,
                    self.anchor_frame
                );
                return FrameDecision::Reuse(self.anchor_labels.clone());
            }
        }

        FrameDecision::Infer(address)
    }

    /// Makes an inferred frame the new anchor.
    pub fn record(&mut self, address: FrameAddress, labels: &[ObjectLabel]) {
        self.anchor_frame = address.frame_number;
        self.anchor_monitor = address.monitor;
        self.anchor_labels = labels.to_vec();
    }
}
