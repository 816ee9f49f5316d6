//! Resident picture data
//!
//! A [`Resource`] is the expensive half of a picture: the pixel buffer that
//! only exists while the picture is loaded. Acquiring one goes through a
//! [`PictureSource`] and may block; releasing one is immediate.

use std::fmt;

use crate::error::{GalleryError, SourceError};
use crate::source::PictureSource;

/// Bytes per pixel of the fixed RGB encoding
pub const BYTES_PER_PIXEL: u64 = 3;

/// Byte cost of a `width` x `height` picture while resident.
///
/// Saturates instead of overflowing for absurd dimensions.
pub fn footprint(width: u32, height: u32) -> u64 {
    (u64::from(width) * u64::from(height)).saturating_mul(BYTES_PER_PIXEL)
}

/// A loaded picture buffer
///
/// There is no unloaded `Resource`: a value of this type is resident, and
/// releasing it consumes it.
pub struct Resource {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Resource {
    /// Load the pixels for `filename` from `source`.
    ///
    /// This is the only operation in the cache that may block. A source
    /// error, or a buffer whose length is not exactly the footprint, is
    /// reported as [`GalleryError::LoadFailure`] and no resource is created.
    pub fn acquire<S>(
        filename: &str,
        width: u32,
        height: u32,
        source: &S,
    ) -> Result<Self, GalleryError>
    where
        S: PictureSource + ?Sized,
    {
        let expected = footprint(width, height);
        let pixels = source
            .fetch(filename, width, height)
            .map_err(|err| GalleryError::load_failure(filename, err))?;

        let actual = pixels.len() as u64;
        if actual != expected {
            return Err(GalleryError::load_failure(
                filename,
                SourceError::WrongLength { actual, expected },
            ));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Free the buffer, returning the number of bytes released
    pub fn release(self) -> u64 {
        self.footprint()
    }

    /// Resident byte cost of this resource
    pub fn footprint(&self) -> u64 {
        footprint(self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB pixel data
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SimulatedSource;

    #[test]
    fn test_footprint_is_three_bytes_per_pixel() {
        assert_eq!(footprint(100, 100), 30_000);
        assert_eq!(footprint(1920, 1080), 6_220_800);
        assert_eq!(footprint(0, 500), 0);
    }

    #[test]
    fn test_footprint_saturates() {
        assert_eq!(footprint(u32::MAX, u32::MAX), u64::MAX);
    }

    #[test]
    fn test_acquire_allocates_footprint() {
        let resource = Resource::acquire("a.jpg", 40, 30, &SimulatedSource::instant()).unwrap();
        assert_eq!(resource.footprint(), 3600);
        assert_eq!(resource.pixels().len(), 3600);
        assert_eq!(resource.width(), 40);
        assert_eq!(resource.height(), 30);
    }

    #[test]
    fn test_debug_omits_pixels() {
        let resource = Resource::acquire("a.jpg", 2, 2, &SimulatedSource::instant()).unwrap();
        assert_eq!(
            format!("{resource:?}"),
            "Resource { width: 2, height: 2, bytes: 12 }"
        );
    }

    #[test]
    fn test_release_reports_freed_bytes() {
        let resource = Resource::acquire("a.jpg", 10, 10, &SimulatedSource::instant()).unwrap();
        assert_eq!(resource.release(), 300);
    }

    #[test]
    fn test_acquire_source_error() {
        let source = |_: &str, _: u32, _: u32| -> Result<Vec<u8>, SourceError> {
            Err(SourceError::unavailable("disk on fire"))
        };

        let err = Resource::acquire("a.jpg", 10, 10, &source).unwrap_err();
        assert_eq!(
            err,
            GalleryError::LoadFailure {
                filename: "a.jpg".to_string(),
                reason: "disk on fire".to_string(),
                evicted: Vec::new(),
            }
        );
    }

    #[test]
    fn test_acquire_rejects_short_buffer() {
        let source = |_: &str, _: u32, _: u32| -> Result<Vec<u8>, SourceError> { Ok(vec![0u8; 7]) };

        match Resource::acquire("a.jpg", 10, 10, &source) {
            Err(GalleryError::LoadFailure { reason, .. }) => {
                assert!(reason.contains("expected 300"), "unexpected reason: {reason}");
            }
            other => panic!("expected load failure, got {other:?}"),
        }
    }
}
