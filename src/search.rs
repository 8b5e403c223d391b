use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::SearchConfig;
use crate::enumerate;
use crate::error::Result;
use crate::gpu::{ComputeDevice, DeviceLayout, HostDevice, OffloadEvent, OffloadSearcher};
use crate::md5::{self, Digest};
use crate::pattern::{Pattern, SearchSpace};
use crate::predicate::Predicate;
use crate::stats::SearchStats;

/// Receives progress and match events.
///
/// Calls are serialized by the coordinator, so implementations never see two
/// events at once and may write to a shared stream freely.
pub trait Reporter: Send {
    fn on_progress(&mut self, current: u64, total: u64, elapsed: Duration);

    fn on_match(&mut self, candidate: &[u8], digest: &Digest, elapsed: Duration);
}

/// Reporter that drops everything.
pub struct Silent;

impl Reporter for Silent {
    fn on_progress(&mut self, _: u64, _: u64, _: Duration) {}

    fn on_match(&mut self, _: &[u8], _: &Digest, _: Duration) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub candidate: Vec<u8>,
    pub digest: Digest,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Matches in the order they were reported.
    pub matches: Vec<Match>,
    /// Candidates fully hashed.
    pub hashed: u64,
    pub total: u64,
    pub elapsed: Duration,
    /// Stopped by [`Coordinator::cancel_handle`] before the space was covered
    /// (and, in first-match mode, before anything was found).
    pub interrupted: bool,
}

impl SearchOutcome {
    pub fn found(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn exhausted(&self) -> bool {
        self.hashed >= self.total
    }
}

/// Owns one search: the space, the shared counter, the stop flag and the
/// serialized reporter.
pub struct Coordinator<'c, R: Reporter> {
    config: &'c SearchConfig,
    space: SearchSpace,
    predicate: Predicate,
    stats: SearchStats,
    /// Set on the first match in first-match mode, or by a cancel request.
    stop: Arc<AtomicBool>,
    /// Claimed by the single worker allowed to report in first-match mode.
    claimed: AtomicBool,
    sink: Mutex<R>,
    matches: Mutex<Vec<Match>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<'c, R: Reporter> Coordinator<'c, R> {
    /// Validate `config` and build the search space. Nothing runs yet.
    pub fn new(config: &'c SearchConfig, predicate: Predicate, reporter: R) -> Result<Self> {
        config.validate()?;
        let pattern = Pattern::parse(&config.template, config.wildcard, !config.allow_no_wildcards)?;
        let space = SearchSpace::new(pattern, &config.alphabets)?;

        Ok(Self {
            config,
            space,
            predicate,
            stats: SearchStats::new(),
            stop: Arc::new(AtomicBool::new(false)),
            claimed: AtomicBool::new(false),
            sink: Mutex::new(reporter),
            matches: Mutex::new(Vec::new()),
        })
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Flag that ends the search when set from anywhere (e.g. a Ctrl-C handler).
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn into_reporter(self) -> R {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run on the path the config asks for. Device mode uses the host kernel;
    /// call [`Coordinator::run_device`] to supply a real device.
    pub fn run(&self) -> Result<SearchOutcome> {
        if self.config.use_device {
            self.run_device(HostDevice::new(self.predicate))
        } else {
            Ok(self.run_cpu())
        }
    }

    /// Enumerate on `config.workers` threads.
    pub fn run_cpu(&self) -> SearchOutcome {
        log::info!(
            "searching {} candidates on {} worker(s)",
            self.space.total(),
            self.config.workers
        );

        enumerate::enumerate(&self.space, self.config.workers, &self.stop, |candidate| {
            let n = self.stats.record();
            if n % self.config.progress_interval == 0 {
                self.progress(n);
            }

            let digest = md5::digest(candidate);
            if (self.predicate)(&digest) {
                self.report_match(candidate, digest);
            }
        });

        self.finish()
    }

    /// Offload hashing to `device`, chunk by chunk.
    ///
    /// Fails before any dispatch if the pattern does not fit the device layout.
    pub fn run_device<D: ComputeDevice>(&self, device: D) -> Result<SearchOutcome> {
        let layout = DeviceLayout::new(&self.space, &self.config.alphabets)?;
        let mut searcher = OffloadSearcher::new(device, layout, self.config.chunk_size)?;

        searcher.run(&self.stop, |event| match event {
            OffloadEvent::ChunkStarted { offset } => self.progress(offset),
            OffloadEvent::ChunkFinished { count, .. } => {
                self.stats.record_many(count);
            }
            OffloadEvent::Hit { index, candidate } => {
                let digest = md5::digest(candidate);
                if (self.predicate)(&digest) {
                    self.report_match(candidate, digest);
                } else {
                    log::warn!("device flagged index {} but the host check disagrees", index);
                }
            }
        })?;

        Ok(self.finish())
    }

    fn progress(&self, current: u64) {
        let elapsed = self.stats.elapsed();
        lock(&self.sink).on_progress(current, self.space.total(), elapsed);
    }

    fn report_match(&self, candidate: &[u8], digest: Digest) {
        if !self.config.collect_all() {
            if self.claimed.swap(true, Ordering::SeqCst) {
                return;
            }
            self.stop.store(true, Ordering::SeqCst);
        }

        let elapsed = self.stats.elapsed();
        let mut sink = lock(&self.sink);
        sink.on_match(candidate, &digest, elapsed);
        lock(&self.matches).push(Match {
            candidate: candidate.to_vec(),
            digest,
        });
    }

    fn finish(&self) -> SearchOutcome {
        let hashed = self.stats.get_hashed();
        let total = self.space.total();
        let found = self.claimed.load(Ordering::SeqCst);
        let interrupted = self.stop.load(Ordering::SeqCst) && !found && hashed < total;

        if interrupted {
            log::warn!("search interrupted after {} of {} candidates", hashed, total);
        }

        SearchOutcome {
            matches: std::mem::take(&mut *lock(&self.matches)),
            hashed,
            total,
            elapsed: self.stats.elapsed(),
            interrupted,
        }
    }
}
