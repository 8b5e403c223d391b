use crate::error::{Result, SearchError};
use crate::pattern::{Alphabet, WILDCARD};

/// Candidates between two progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 2_000_000;

/// Work-items per device dispatch.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 22;

/// Device work-group width; chunk sizes must be a multiple of it.
pub const THREADGROUP_SIZE: usize = 256;

/// Whether the search stops at the first hit or exhausts the space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    FirstMatch,
    CollectAll,
}

/// Everything a search needs, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub template: Vec<u8>,
    pub wildcard: u8,
    pub alphabets: Vec<Alphabet>,
    pub workers: usize,
    pub mode: SearchMode,
    pub use_device: bool,
    pub verbose: bool,
    pub progress_interval: u64,
    pub chunk_size: usize,
    /// Accept templates without wildcards (a single candidate).
    pub allow_no_wildcards: bool,
}

impl SearchConfig {
    pub fn new(template: impl Into<Vec<u8>>, alphabets: Vec<Alphabet>) -> Self {
        Self {
            template: template.into(),
            wildcard: WILDCARD,
            alphabets,
            workers: 1,
            mode: SearchMode::FirstMatch,
            use_device: false,
            verbose: true,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            chunk_size: DEFAULT_CHUNK_SIZE,
            allow_no_wildcards: false,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_device(mut self, use_device: bool) -> Self {
        self.use_device = use_device;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_wildcard(mut self, wildcard: u8) -> Self {
        self.wildcard = wildcard;
        self
    }

    pub fn allow_no_wildcards(mut self, allow: bool) -> Self {
        self.allow_no_wildcards = allow;
        self
    }

    pub fn collect_all(&self) -> bool {
        self.mode == SearchMode::CollectAll
    }

    /// Reject configurations no search can run with.
    pub fn validate(&self) -> Result<()> {
        if self.alphabets.is_empty() {
            return Err(SearchError::config("at least one alphabet is required"));
        }
        if self.workers == 0 {
            return Err(SearchError::config("worker count must be at least 1"));
        }
        if self.use_device && self.workers > 1 {
            return Err(SearchError::config(
                "can't use both multithreading and device offload",
            ));
        }
        if self.progress_interval == 0 {
            return Err(SearchError::config("progress interval must be positive"));
        }
        if self.chunk_size == 0 || self.chunk_size % THREADGROUP_SIZE != 0 {
            return Err(SearchError::config(format!(
                "chunk size must be a positive multiple of {}",
                THREADGROUP_SIZE
            )));
        }
        // device kernels index a chunk with a 32-bit count
        if u32::try_from(self.chunk_size).is_err() {
            return Err(SearchError::config("chunk size must fit in 32 bits"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SearchConfig {
        SearchConfig::new("a?", vec![Alphabet::new("xy").unwrap()])
    }

    #[test]
    fn test_defaults() {
        let c = base();
        assert_eq!(c.workers, 1);
        assert_eq!(c.mode, SearchMode::FirstMatch);
        assert_eq!(c.wildcard, b'?');
        assert!(c.verbose);
        assert!(!c.use_device);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = vec![
            SearchConfig::new("a?", vec![]),
            base().with_workers(0),
            base().with_workers(0).with_device(true),
            base().with_workers(4).with_device(true),
            base().with_progress_interval(0),
            base().with_chunk_size(0),
            base().with_chunk_size(1000),
        ];
        for c in cases {
            assert!(matches!(c.validate(), Err(SearchError::Config(_))), "{:?}", c);
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_chunk_size_must_fit_u32() {
        let largest = (u32::MAX as usize + 1) - THREADGROUP_SIZE;
        assert!(base().with_chunk_size(largest).validate().is_ok());

        let err = base().with_chunk_size(1usize << 32).validate().unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
        assert!(err.to_string().contains("32 bits"));
    }

    #[test]
    fn test_device_with_single_worker_ok() {
        let c = base().with_device(true).with_chunk_size(512);
        assert!(c.validate().is_ok());
    }
}
