//! Camera capture entry point.

use clef_core::{Error, MediaDescriptor, Result};

/// Terminal builds have no camera backend; photo submissions come from
/// image files instead.
pub fn capture_photo() -> Result<MediaDescriptor> {
    Err(Error::UnsupportedPlatform(
        "camera capture is not available on this platform; pass an image path instead".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_reports_the_missing_backend() {
        let result = capture_photo();
        assert!(matches!(result, Err(Error::UnsupportedPlatform(_))));
    }
}
