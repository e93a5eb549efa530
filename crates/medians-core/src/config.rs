//! Configuration for the median filter.
//!
//! [`MedianConfig`] is plain data: the radius of the window, the memory
//! budget that drives striping, and how the work is scheduled. Use
//! [`MedianConfig::builder`] for ergonomic construction.

/// Largest supported radius. A (2r+1)² window must fit the 16-bit counters.
pub const MAX_RADIUS: usize = 127;

/// Default memory budget: a typical 512 KiB L2 cache.
pub const DEFAULT_MEMORY_BUDGET: usize = 512 * 1024;

/// Which implementation of the 16-lane histogram arithmetic to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backend {
    /// The best implementation compiled for this target (SSE2, NEON or scalar).
    #[default]
    Auto,
    /// Portable scalar loops.
    Scalar,
}

/// Median filter configuration.
///
/// # Example
/// ```
/// use medians_core::config::MedianConfig;
///
/// let config = MedianConfig::builder()
///     .radius(3)
///     .memory_budget(256 * 1024)
///     .build();
/// assert_eq!(config.radius, 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MedianConfig {
    /// Window radius; the window is (2r+1)×(2r+1) pixels (default: 1).
    pub radius: usize,
    /// Histogram memory per stripe, in bytes (default: 512 KiB).
    /// Set this near the L2 cache size; it only affects speed, never output.
    pub memory_budget: usize,
    /// Process stripes and channels on the rayon thread pool (default: false).
    pub parallel: bool,
    /// Histogram arithmetic backend (default: [`Backend::Auto`]).
    pub backend: Backend,
}

impl Default for MedianConfig {
    fn default() -> Self {
        Self {
            radius: 1,
            memory_budget: DEFAULT_MEMORY_BUDGET,
            parallel: false,
            backend: Backend::Auto,
        }
    }
}

impl MedianConfig {
    /// Create a new builder for `MedianConfig`.
    #[must_use]
    pub fn builder() -> MedianConfigBuilder {
        MedianConfigBuilder::default()
    }

    /// Default configuration with the given radius.
    #[must_use]
    pub fn with_radius(radius: usize) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }
}

/// Builder for [`MedianConfig`].
#[derive(Default)]
pub struct MedianConfigBuilder {
    radius: Option<usize>,
    memory_budget: Option<usize>,
    parallel: Option<bool>,
    backend: Option<Backend>,
}

impl MedianConfigBuilder {
    /// Set the window radius.
    #[must_use]
    pub fn radius(mut self, radius: usize) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Set the per-stripe histogram memory budget in bytes.
    #[must_use]
    pub fn memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Enable or disable parallel stripe processing.
    #[must_use]
    pub fn parallel(mut self, enable: bool) -> Self {
        self.parallel = Some(enable);
        self
    }

    /// Select the histogram arithmetic backend.
    #[must_use]
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build the configuration, using defaults for unset fields.
    #[must_use]
    pub fn build(self) -> MedianConfig {
        let d = MedianConfig::default();
        MedianConfig {
            radius: self.radius.unwrap_or(d.radius),
            memory_budget: self.memory_budget.unwrap_or(d.memory_budget),
            parallel: self.parallel.unwrap_or(d.parallel),
            backend: self.backend.unwrap_or(d.backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        assert_eq!(MedianConfig::builder().build(), MedianConfig::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = MedianConfig::builder()
            .radius(5)
            .memory_budget(4096)
            .parallel(true)
            .backend(Backend::Scalar)
            .build();
        assert_eq!(config.radius, 5);
        assert_eq!(config.memory_budget, 4096);
        assert!(config.parallel);
        assert_eq!(config.backend, Backend::Scalar);
    }

    #[test]
    fn test_with_radius_keeps_other_defaults() {
        let config = MedianConfig::with_radius(4);
        assert_eq!(config.radius, 4);
        assert_eq!(config.memory_budget, DEFAULT_MEMORY_BUDGET);
    }
}
