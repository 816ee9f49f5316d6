//! Gallery statistics and memory pressure levels

use serde::Serialize;

/// Memory pressure level derived from budget utilization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPressure {
    /// Usage is below 50% of the budget
    Low,
    /// Usage is 50-75% of the budget
    Moderate,
    /// Usage is 75-90% of the budget
    High,
    /// Usage is above 90% of the budget
    Critical,
}

impl MemoryPressure {
    /// Get the pressure level from a utilization ratio
    pub fn from_utilization(utilization: f64) -> Self {
        if utilization < 0.5 {
            MemoryPressure::Low
        } else if utilization < 0.75 {
            MemoryPressure::Moderate
        } else if utilization < 0.90 {
            MemoryPressure::High
        } else {
            MemoryPressure::Critical
        }
    }
}

/// Snapshot of gallery usage
///
/// Counters are bookkeeping only; eviction decisions never read them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GalleryStats {
    /// Number of registered pictures
    pub registered: usize,

    /// Number of resident pictures
    pub loaded: usize,

    /// Total footprint of resident pictures (bytes)
    pub memory_used: u64,

    /// Configured budget (bytes)
    pub memory_limit: u64,

    /// Displays that found the picture already resident
    pub hits: u64,

    /// Displays that had to load the picture
    pub misses: u64,

    /// Successful loads
    pub loads: u64,

    /// Pictures released to make room, by unload-all, or by re-registration
    pub evictions: u64,

    /// Loads that failed
    pub load_failures: u64,

    /// True while a single picture larger than the budget is resident
    pub over_budget: bool,
}

impl GalleryStats {
    /// Hit rate over all found displays (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Memory utilization (0.0 and up; above 1.0 when over budget)
    ///
    /// A zero budget with anything resident is infinitely over budget.
    pub fn memory_utilization(&self) -> f64 {
        if self.memory_limit == 0 {
            if self.memory_used == 0 {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            self.memory_used as f64 / self.memory_limit as f64
        }
    }

    pub fn pressure(&self) -> MemoryPressure {
        MemoryPressure::from_utilization(self.memory_utilization())
    }
}
