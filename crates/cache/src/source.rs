//! Picture sources
//!
//! A [`PictureSource`] is where a handle's pixels come from when it loads.
//! The gallery never decodes anything; sources hand back a raw RGB buffer of
//! the picture's footprint, or a reason why they could not.

use std::thread;
use std::time::Duration;

use crate::error::SourceError;
use crate::resource::footprint;

/// Produces the resident bytes for a picture.
///
/// Implementations may block. The gallery calls `fetch` from inside
/// `display`, after eviction has run and before usage is reconciled.
///
/// Plain closures work as sources:
///
/// ```
/// use gallery_cache::{Gallery, MemoryBudget, SourceError};
///
/// let source = |_: &str, width: u32, height: u32| -> Result<Vec<u8>, SourceError> {
///     Ok(vec![0u8; width as usize * height as usize * 3])
/// };
/// let mut gallery = Gallery::new(MemoryBudget::from_bytes(1000), source);
/// gallery.register("dot.png", 1, 1);
/// assert!(gallery.display("dot.png").is_ok());
/// ```
pub trait PictureSource: Send + Sync {
    /// Fetch the pixels of `filename`.
    ///
    /// The returned buffer must hold exactly `width * height * 3` bytes.
    fn fetch(&self, filename: &str, width: u32, height: u32) -> Result<Vec<u8>, SourceError>;
}

impl<F> PictureSource for F
where
    F: Fn(&str, u32, u32) -> Result<Vec<u8>, SourceError> + Send + Sync,
{
    fn fetch(&self, filename: &str, width: u32, height: u32) -> Result<Vec<u8>, SourceError> {
        self(filename, width, height)
    }
}

/// Source that stands in for a slow disk or network fetch
///
/// Sleeps for the configured latency, then returns a zeroed buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedSource {
    latency: Duration,
}

impl SimulatedSource {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// A source with no artificial delay
    pub fn instant() -> Self {
        Self::default()
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl PictureSource for SimulatedSource {
    fn fetch(&self, filename: &str, width: u32, height: u32) -> Result<Vec<u8>, SourceError> {
        let len = usize::try_from(footprint(width, height))
            .map_err(|_| SourceError::TooLarge { width, height })?;

        if !self.latency.is_zero() {
            tracing::debug!("fetching {} ({:?} simulated latency)", filename, self.latency);
            thread::sleep(self.latency);
        }

        Ok(vec![0u8; len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_simulated_source_buffer_length() {
        let pixels = SimulatedSource::instant().fetch("x.png", 8, 4).unwrap();
        assert_eq!(pixels.len(), 96);
        assert!(pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_simulated_source_waits() {
        let source = SimulatedSource::new(Duration::from_millis(20));
        let start = Instant::now();
        source.fetch("slow.png", 1, 1).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_closure_source() {
        let source = |name: &str, _: u32, _: u32| -> Result<Vec<u8>, SourceError> {
            Err(SourceError::unavailable(format!("no such file: {name}")))
        };
        let err = source.fetch("gone.png", 1, 1).unwrap_err();
        assert_eq!(err.to_string(), "no such file: gone.png");
    }

    #[test]
    fn test_io_errors_convert() {
        let source = |name: &str, _: u32, _: u32| -> Result<Vec<u8>, SourceError> {
            Ok(std::fs::read(name)?)
        };
        assert!(matches!(
            source.fetch("/nonexistent/gone.png", 1, 1),
            Err(SourceError::Io(_))
        ));
    }
}
