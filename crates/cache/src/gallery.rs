//! Budgeted picture gallery with least-accessed eviction
//!
//! The [`Gallery`] owns one [`Handle`] per registered picture and keeps the
//! total footprint of resident pictures within a [`MemoryBudget`]. Pictures
//! load lazily on first display; when a load would overrun the budget, the
//! least-accessed other pictures are evicted first.
//!
//! # Eviction order
//!
//! Candidates are the loaded pictures other than the one being displayed,
//! ordered by:
//!
//! 1. access count, ascending (coldest first)
//! 2. memory usage, descending (among equally cold, free the biggest)
//! 3. filename, ascending
//!
//! The picture being displayed is never evicted by its own display. If it
//! alone is larger than the budget, the gallery stays over budget until
//! another picture is displayed.

use std::collections::HashMap;

use crate::budget::MemoryBudget;
use crate::config::GalleryConfig;
use crate::error::GalleryError;
use crate::handle::{Displayed, Handle};
use crate::source::{PictureSource, SimulatedSource};
use crate::stats::GalleryStats;

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    loads: u64,
    evictions: u64,
    load_failures: u64,
}

/// Lazily loaded picture cache with a byte budget
///
/// # Example
///
/// ```
/// use gallery_cache::{Gallery, MemoryBudget, SimulatedSource};
///
/// // Room for two 100x100 pictures
/// let mut gallery = Gallery::new(MemoryBudget::from_bytes(60_000), SimulatedSource::instant());
/// gallery.register("a.jpg", 100, 100);
/// gallery.register("b.jpg", 100, 100);
/// gallery.register("c.jpg", 100, 100);
///
/// gallery.display("a.jpg").unwrap();
/// gallery.display("b.jpg").unwrap();
/// gallery.display("a.jpg").unwrap();
///
/// // b.jpg has fewer accesses than a.jpg, so it makes room for c.jpg
/// let shown = gallery.display("c.jpg").unwrap();
/// assert_eq!(shown.evicted, vec!["b.jpg".to_string()]);
/// assert_eq!(gallery.current_memory_usage(), 60_000);
/// ```
#[derive(Debug)]
pub struct Gallery<S = SimulatedSource> {
    budget: MemoryBudget,
    pictures: HashMap<String, Handle>,
    source: S,
    memory_used: u64,
    counters: Counters,
}

impl Gallery<SimulatedSource> {
    /// Create a gallery with a simulated source from `config`
    pub fn with_config(config: &GalleryConfig) -> Self {
        Self::new(config.budget, config.source())
    }
}

impl Default for Gallery<SimulatedSource> {
    /// A 256MB gallery with instant loads
    fn default() -> Self {
        Self::with_config(&GalleryConfig::default())
    }
}

impl<S: PictureSource> Gallery<S> {
    /// Create an empty gallery. The budget cannot change afterwards.
    pub fn new(budget: MemoryBudget, source: S) -> Self {
        Self {
            budget,
            pictures: HashMap::new(),
            source,
            memory_used: 0,
            counters: Counters::default(),
        }
    }

    /// Register an unloaded picture under `filename`.
    ///
    /// An existing picture with the same name is evicted and then replaced,
    /// losing its access count. Returns true if a picture was replaced.
    pub fn register(&mut self, filename: impl Into<String>, width: u32, height: u32) -> bool {
        let filename = filename.into();
        let handle = Handle::new(filename.clone(), width, height);

        let replaced = match self.pictures.insert(filename, handle) {
            Some(mut previous) => {
                let freed = previous.evict();
                if freed > 0 {
                    self.counters.evictions += 1;
                }
                tracing::debug!("replaced {} (freed {} bytes)", previous.filename(), freed);
                true
            }
            None => false,
        };

        self.recompute_memory_usage();
        replaced
    }

    /// Display a picture, loading it if needed.
    ///
    /// Runs eviction before the load and reconciles usage after it. An
    /// unknown filename returns [`GalleryError::NotFound`] without touching
    /// any state. A failed load returns [`GalleryError::LoadFailure`]; the
    /// access still counts, and evictions made for it are not undone but
    /// are reported in the error.
    pub fn display(&mut self, filename: &str) -> Result<Displayed, GalleryError> {
        let Some(target) = self.pictures.get(filename) else {
            tracing::warn!("picture not found: {}", filename);
            return Err(GalleryError::not_found(filename));
        };

        let mut evicted = Vec::new();

        if !target.is_loaded() {
            let projected = self.memory_used.saturating_add(target.required_bytes());
            let budget = self.budget.as_bytes();
            if projected > budget {
                self.evict_for_deficit(filename, projected - budget, &mut evicted);
            }
        }

        let result = match self.pictures.get_mut(filename) {
            Some(handle) => handle.request_display(&self.source),
            None => Err(GalleryError::not_found(filename)),
        };
        self.recompute_memory_usage();

        let mut displayed = match result {
            Ok(displayed) => displayed,
            Err(mut err) => {
                self.counters.load_failures += 1;
                tracing::warn!("{} (evicted {:?})", err, evicted);
                if let GalleryError::LoadFailure { evicted: released, .. } = &mut err {
                    *released = evicted;
                }
                return Err(err);
            }
        };

        if displayed.loaded_now {
            self.counters.misses += 1;
            self.counters.loads += 1;
        } else {
            self.counters.hits += 1;
        }

        self.reconcile(filename, &mut evicted);

        displayed.evicted = evicted;
        Ok(displayed)
    }

    /// Evict every resident picture. Access counts are kept.
    pub fn unload_all(&mut self) {
        let mut freed = 0;
        for handle in self.pictures.values_mut() {
            let bytes = handle.evict();
            if bytes > 0 {
                self.counters.evictions += 1;
                freed += bytes;
            }
        }
        self.recompute_memory_usage();
        tracing::info!("unloaded all pictures ({} bytes freed)", freed);
    }

    /// Total footprint of resident pictures
    pub fn current_memory_usage(&self) -> u64 {
        self.memory_used
    }

    /// Number of resident pictures
    pub fn loaded_count(&self) -> usize {
        self.pictures.values().filter(|h| h.is_loaded()).count()
    }

    pub fn budget(&self) -> MemoryBudget {
        self.budget
    }

    /// Number of registered pictures
    pub fn len(&self) -> usize {
        self.pictures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.pictures.contains_key(filename)
    }

    pub fn handle(&self, filename: &str) -> Option<&Handle> {
        self.pictures.get(filename)
    }

    /// All registered pictures, in no particular order
    pub fn handles(&self) -> impl Iterator<Item = &Handle> {
        self.pictures.values()
    }

    pub fn access_count(&self, filename: &str) -> Option<u64> {
        self.handle(filename).map(Handle::access_count)
    }

    /// False for unknown pictures
    pub fn is_loaded(&self, filename: &str) -> bool {
        self.handle(filename).is_some_and(Handle::is_loaded)
    }

    pub fn memory_usage(&self, filename: &str) -> Option<u64> {
        self.handle(filename).map(Handle::memory_usage)
    }

    /// Names of resident pictures, sorted
    pub fn loaded_filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pictures
            .values()
            .filter(|h| h.is_loaded())
            .map(|h| h.filename().to_owned())
            .collect();
        names.sort();
        names
    }

    pub fn stats(&self) -> GalleryStats {
        GalleryStats {
            registered: self.pictures.len(),
            loaded: self.loaded_count(),
            memory_used: self.memory_used,
            memory_limit: self.budget.as_bytes(),
            hits: self.counters.hits,
            misses: self.counters.misses,
            loads: self.counters.loads,
            evictions: self.counters.evictions,
            load_failures: self.counters.load_failures,
            over_budget: self.memory_used > self.budget.as_bytes(),
        }
    }

    /// Loaded pictures other than `target`, coldest first
    fn eviction_order(&self, target: &str) -> Vec<String> {
        let mut candidates: Vec<&Handle> = self
            .pictures
            .values()
            .filter(|h| h.is_loaded() && h.filename() != target)
            .collect();

        candidates.sort_by(|a, b| {
            a.access_count()
                .cmp(&b.access_count())
                .then_with(|| b.memory_usage().cmp(&a.memory_usage()))
                .then_with(|| a.filename().cmp(b.filename()))
        });

        candidates.into_iter().map(|h| h.filename().to_owned()).collect()
    }

    /// Evict cold pictures until at least `deficit` bytes are freed or no
    /// candidates remain
    fn evict_for_deficit(&mut self, target: &str, deficit: u64, evicted: &mut Vec<String>) {
        let mut freed = 0;
        for victim in self.eviction_order(target) {
            if freed >= deficit {
                break;
            }
            freed += self.evict_picture(&victim);
            evicted.push(victim);
        }
        self.recompute_memory_usage();
    }

    /// Evict until usage fits the budget again, sparing `target`
    fn reconcile(&mut self, target: &str, evicted: &mut Vec<String>) {
        while self.memory_used > self.budget.as_bytes() {
            let Some(victim) = self.eviction_order(target).into_iter().next() else {
                tracing::warn!(
                    "{} alone exceeds the budget: {} bytes resident, budget {}",
                    target,
                    self.memory_used,
                    self.budget
                );
                break;
            };
            self.evict_picture(&victim);
            evicted.push(victim);
            self.recompute_memory_usage();
        }
    }

    fn evict_picture(&mut self, filename: &str) -> u64 {
        let Some(handle) = self.pictures.get_mut(filename) else {
            return 0;
        };
        let freed = handle.evict();
        if freed > 0 {
            self.counters.evictions += 1;
            tracing::info!(
                "evicted {} ({} bytes, {} accesses)",
                filename,
                freed,
                handle.access_count()
            );
        }
        freed
    }

    fn recompute_memory_usage(&mut self) {
        self.memory_used = self.pictures.values().map(Handle::memory_usage).sum();
    }
}
