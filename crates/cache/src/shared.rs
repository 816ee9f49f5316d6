//! Thread-safe gallery handle
//!
//! Eviction reads and rewrites the gallery's global usage, so the whole of
//! `display` (lookup, evict, load, reconcile) runs under one lock. Loads
//! therefore serialize across threads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use crate::budget::MemoryBudget;
use crate::error::GalleryError;
use crate::gallery::Gallery;
use crate::handle::Displayed;
use crate::source::{PictureSource, SimulatedSource};
use crate::stats::GalleryStats;

/// Cloneable, lock-protected [`Gallery`]
///
/// # Example
///
/// ```
/// use gallery_cache::{Gallery, MemoryBudget, SharedGallery, SimulatedSource};
/// use std::thread;
///
/// let shared = SharedGallery::new(Gallery::new(
///     MemoryBudget::from_bytes(60_000),
///     SimulatedSource::instant(),
/// ));
/// shared.register("a.jpg", 100, 100);
///
/// let worker = shared.clone();
/// thread::spawn(move || worker.display("a.jpg").unwrap()).join().unwrap();
///
/// assert_eq!(shared.current_memory_usage(), 30_000);
/// ```
pub struct SharedGallery<S = SimulatedSource> {
    inner: Arc<Mutex<Gallery<S>>>,
}

impl<S> Clone for SharedGallery<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PictureSource> SharedGallery<S> {
    pub fn new(gallery: Gallery<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(gallery)),
        }
    }

    // Every mutation recomputes usage from the handles, so a gallery left
    // behind by a panicking thread is still consistent.
    fn lock(&self) -> MutexGuard<'_, Gallery<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the gallery
    pub fn with<R>(&self, f: impl FnOnce(&mut Gallery<S>) -> R) -> R {
        f(&mut *self.lock())
    }

    pub fn register(&self, filename: impl Into<String>, width: u32, height: u32) -> bool {
        self.lock().register(filename, width, height)
    }

    /// Display a picture; blocks while another caller holds the gallery
    pub fn display(&self, filename: &str) -> Result<Displayed, GalleryError> {
        self.lock().display(filename)
    }

    /// Display a picture without waiting for the lock
    ///
    /// Returns `None` if another caller currently holds the gallery.
    pub fn try_display(&self, filename: &str) -> Option<Result<Displayed, GalleryError>> {
        let mut gallery = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some(gallery.display(filename))
    }

    pub fn unload_all(&self) {
        self.lock().unload_all();
    }

    pub fn current_memory_usage(&self) -> u64 {
        self.lock().current_memory_usage()
    }

    pub fn loaded_count(&self) -> usize {
        self.lock().loaded_count()
    }

    pub fn access_count(&self, filename: &str) -> Option<u64> {
        self.lock().access_count(filename)
    }

    pub fn budget(&self) -> MemoryBudget {
        self.lock().budget()
    }

    pub fn stats(&self) -> GalleryStats {
        self.lock().stats()
    }
}
