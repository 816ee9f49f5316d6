//! Gallery Cache Library
//!
//! Lazily loaded picture cache with a byte budget and least-accessed eviction.

pub mod budget;
pub mod config;
pub mod error;
pub mod gallery;
pub mod handle;
pub mod resource;
pub mod shared;
pub mod source;
pub mod stats;

pub use budget::{MemoryBudget, ParseBudgetError};
pub use config::{ConfigError, GalleryConfig};
pub use error::{GalleryError, SourceError};
pub use gallery::Gallery;
pub use handle::{Displayed, Handle};
pub use resource::{footprint, Resource};
pub use shared::SharedGallery;
pub use source::{PictureSource, SimulatedSource};
pub use stats::{GalleryStats, MemoryPressure};
