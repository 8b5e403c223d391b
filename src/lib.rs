/// Parallel MD5 preimage search over wildcard patterns
///
/// A template with `?` wildcards and one alphabet per wildcard define a finite
/// candidate space. Every candidate is hashed with MD5 and tested against a
/// predicate, on CPU worker threads or on a compute device that regenerates
/// candidates from their linear index.

pub mod config;
pub mod display;
pub mod enumerate;
pub mod error;
pub mod gpu;
pub mod hardware;
pub mod md5;
pub mod pattern;
pub mod predicate;
pub mod search;
pub mod stats;

pub use config::{SearchConfig, SearchMode, DEFAULT_CHUNK_SIZE, DEFAULT_PROGRESS_INTERVAL, THREADGROUP_SIZE};

pub use display::{escape_candidate, format_info_header, format_match, format_progress, ConsoleReporter};

pub use enumerate::{enumerate, partition, split_range, Candidates};

pub use error::{GpuError, Result, SearchError};

pub use gpu::{ComputeDevice, DeviceLayout, HostDevice, OffloadEvent, OffloadSearcher};

pub use hardware::{display_hardware_info, HardwareInfo};

pub use crate::md5::{digest, Digest};

pub use pattern::{effective_alphabet, total_space, Alphabet, Pattern, SearchSpace, WILDCARD};

pub use predicate::{magic_hash, Predicate};

pub use search::{Coordinator, Match, Reporter, SearchOutcome, Silent};

pub use stats::{format_count, format_duration, format_number, format_rate, SearchStats};
