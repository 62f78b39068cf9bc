use thiserror::Error;

/// Path segment (counting from the empty segment before the leading `/`)
/// that names the monitor, e.g. `/nvr/zoneminder/events/<monitor>/...`.
pub const MONITOR_SEGMENT: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("image path has no frame number: {0}")]
    FrameNumber(String),
    #[error("image path has no monitor segment: {0}")]
    Monitor(String),
}

/// Which camera and which alarm frame an image path refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAddress {
    pub frame_number: i64,
    pub monitor: String,
}

impl FrameAddress {
    /// Parses `.../<monitor>/.../<frame-number>-capture.<ext>`.
    pub fn parse(image_path: &str) -> Result<Self, AddressParseError> {
        let file_name = image_path.rsplit('/').next().unwrap_or(image_path);
        let leading = file_name.split('-').next().unwrap_or(file_name);
        let frame_number = leading
            .trim()
            .parse::<i64>()
            .map_err(|_| AddressParseError::FrameNumber(image_path.to_string()))?;

        let monitor = image_path
            .split('/')
            .nth(MONITOR_SEGMENT)
            .ok_or_else(|| AddressParseError::Monitor(image_path.to_string()))?;

        Ok(Self {
            frame_number,
            monitor: monitor.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_zoneminder_path() {
        let addr = FrameAddress::parse("/nvr/zoneminder/events/BackPorch/18/06/20/19/20/04/00224-capture.jpg")
            .unwrap();
        assert_eq!(addr.frame_number, 224);
        assert_eq!(addr.monitor, "BackPorch");
    }

    #[test]
    fn test_parse_short_layout() {
        let addr = FrameAddress::parse("/nvr/zm/events/Porch/00017-capture.jpg").unwrap();
        assert_eq!(addr.frame_number, 17);
        assert_eq!(addr.monitor, "Porch");
    }

    #[test]
    fn test_monitor_is_segment_not_directory_depth() {
        // Too short to reach the monitor segment even though the filename parses.
        let err = FrameAddress::parse("/a/b/00001-capture.jpg").unwrap_err();
        assert!(matches!(err, AddressParseError::Monitor(_)));
    }

    #[rstest]
    #[case::no_directories("bad/path.jpg")]
    #[case::non_numeric_frame("/nvr/zm/events/Porch/18/snapshot-capture.jpg")]
    #[case::empty("")]
    #[case::trailing_slash("/nvr/zm/events/Porch/")]
    fn test_malformed_paths(#[case] path: &str) {
        assert!(FrameAddress::parse(path).is_err());
    }

    #[test]
    fn test_frame_number_checked_before_monitor() {
        let err = FrameAddress::parse("bad/path.jpg").unwrap_err();
        assert!(matches!(err, AddressParseError::FrameNumber(_)));
    }
}
