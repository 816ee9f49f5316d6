//! Lazy picture handles
//!
//! A [`Handle`] is the cheap, always-present stand-in for a picture. It knows
//! the picture's name and dimensions, so its footprint is known while nothing
//! is loaded, and it owns the [`Resource`] only while the picture is resident.

use serde::Serialize;

use crate::error::GalleryError;
use crate::resource::{footprint, Resource};
use crate::source::PictureSource;

/// Description of a picture after a successful display request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Displayed {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// Resident byte cost of the picture
    pub footprint: u64,
    /// Access count after this request
    pub access_count: u64,
    /// True if this request had to load the picture
    pub loaded_now: bool,
    /// Pictures evicted to make room, in eviction order
    pub evicted: Vec<String>,
}

/// Lazy stand-in for a picture
#[derive(Debug)]
pub struct Handle {
    filename: String,
    width: u32,
    height: u32,
    resource: Option<Resource>,
    access_count: u64,
}

impl Handle {
    /// Create an unloaded handle
    pub fn new(filename: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            filename: filename.into(),
            width,
            height,
            resource: None,
            access_count: 0,
        }
    }

    /// Count an access and make the picture resident.
    ///
    /// The access is counted before anything else, so a failed load still
    /// shows up in [`access_count`](Self::access_count). On failure the
    /// handle stays unloaded.
    pub fn request_display<S>(&mut self, source: &S) -> Result<Displayed, GalleryError>
    where
        S: PictureSource + ?Sized,
    {
        self.access_count += 1;

        let loaded_now = self.resource.is_none();
        if loaded_now {
            tracing::info!(
                "loading {} ({}x{}, {} bytes)",
                self.filename,
                self.width,
                self.height,
                self.required_bytes()
            );
            let resource = Resource::acquire(&self.filename, self.width, self.height, source)?;
            self.resource = Some(resource);
        }

        tracing::debug!("displaying {} (access #{})", self.filename, self.access_count);

        Ok(Displayed {
            filename: self.filename.clone(),
            width: self.width,
            height: self.height,
            footprint: self.required_bytes(),
            access_count: self.access_count,
            loaded_now,
            evicted: Vec::new(),
        })
    }

    /// Drop the resident pixels, returning the bytes freed (0 if unloaded)
    pub fn evict(&mut self) -> u64 {
        self.resource.take().map_or(0, Resource::release)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_loaded(&self) -> bool {
        self.resource.is_some()
    }

    /// Bytes currently held by this picture
    pub fn memory_usage(&self) -> u64 {
        self.resource.as_ref().map_or(0, Resource::footprint)
    }

    /// Bytes this picture holds once loaded, whatever its current state
    pub fn required_bytes(&self) -> u64 {
        footprint(self.width, self.height)
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    /// The resident resource, if loaded
    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }
}
