use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Shared progress counter plus the search start time.
pub struct SearchStats {
    pub hashed: AtomicU64,
    pub start_time: Instant,
}

impl SearchStats {
    pub fn new() -> Self {
        Self {
            hashed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Count one hashed candidate and return the new total.
    #[inline(always)]
    pub fn record(&self) -> u64 {
        self.hashed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count a whole batch (device chunks) and return the new total.
    pub fn record_many(&self, n: u64) -> u64 {
        self.hashed.fetch_add(n, Ordering::Relaxed) + n
    }

    /// Get current hashed count
    pub fn get_hashed(&self) -> u64 {
        self.hashed.load(Ordering::Relaxed)
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for SearchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Hashes per second over `elapsed`.
pub fn rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

/// Time left to reach `total` from `current`, at the rate seen so far.
pub fn estimate_remaining(current: u64, total: u64, elapsed: Duration) -> Option<Duration> {
    let speed = rate(current, elapsed);
    if speed <= 0.0 {
        return None;
    }
    let remaining = total.saturating_sub(current) as f64;
    Some(Duration::from_secs_f64(remaining / speed))
}

/// Share of `total` covered by `current`, in percent.
pub fn percent(current: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    100.0 * current as f64 / total as f64
}

/// Format a number with comma separators
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format hash rate with units
pub fn format_rate(speed: f64) -> String {
    if speed >= 1_000_000_000.0 {
        format!("{:.2} GH/s", speed / 1_000_000_000.0)
    } else if speed >= 1_000_000.0 {
        format!("{:.2} MH/s", speed / 1_000_000.0)
    } else if speed >= 1_000.0 {
        format!("{:.2} KH/s", speed / 1_000.0)
    } else {
        format!("{:.0} H/s", speed)
    }
}

/// Format a count as "38.07B", "195.11K", etc.
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000_000_000 {
        format!("{:.2}T", n as f64 / 1_000_000_000_000.0)
    } else if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Format duration as "5.3 hours", "2.5 minutes", "45 seconds", etc.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();

    if secs >= 86400 {
        format!("{:.1} days", secs as f64 / 86400.0)
    } else if secs >= 3600 {
        format!("{:.1} hours", secs as f64 / 3600.0)
    } else if secs >= 60 {
        format!("{:.1} minutes", secs as f64 / 60.0)
    } else {
        format!("{} seconds", secs)
    }
}
