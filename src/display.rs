use std::fmt::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::config::SearchConfig;
use crate::md5::Digest;
use crate::pattern::SearchSpace;
use crate::search::{Reporter, SearchOutcome};
use crate::stats::{estimate_remaining, format_count, format_duration, format_number, format_rate, percent, rate};

/// Quote a candidate, keeping printable ASCII and writing everything else as `\xNN`.
pub fn escape_candidate(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        if (0x20..=0x7e).contains(&b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "\\x{:02x}", b);
        }
    }
    out.push('"');
    out
}

/// `current / total (pct%, secs, rate)` line used for progress.
pub fn format_progress(current: u64, total: u64, elapsed: Duration) -> String {
    format!(
        "{} / {} ({:.2}%, {:.2} sec, {})",
        format_number(current),
        format_number(total),
        percent(current, total),
        elapsed.as_secs_f64(),
        format_rate(rate(current, elapsed))
    )
}

/// The verbose MATCH block.
pub fn format_match(candidate: &[u8], digest: &Digest, elapsed: Duration) -> String {
    format!(
        "MATCH\n  Time: {:.2} sec\n  String: {}\n  Hash: {}",
        elapsed.as_secs_f64(),
        escape_candidate(candidate),
        digest.to_hex()
    )
}

/// INFO header: workers, pattern, and which alphabet covers which wildcard.
/// The last supplied alphabet is shown as covering every remaining position.
pub fn format_info_header(config: &SearchConfig, space: &SearchSpace) -> String {
    let positions = space.pattern().wildcard_positions();
    let mut out = String::from("INFO\n");
    let _ = writeln!(out, "  Threads: {}", config.workers);
    let _ = writeln!(out, "  Pattern: {}", escape_candidate(&config.template));
    let _ = writeln!(
        out,
        "  Candidates: {} ({})",
        format_number(space.total()),
        format_count(space.total())
    );

    let supplied = config.alphabets.len();
    for (i, alphabet) in config.alphabets.iter().enumerate().take(positions.len()) {
        let is_last = i + 1 == supplied;
        if is_last && positions.len() > supplied {
            let _ = writeln!(
                out,
                "  Alphabet for positions {}..{}: {}",
                positions[i],
                positions[positions.len() - 1],
                alphabet
            );
        } else {
            let _ = writeln!(out, "  Alphabet for position {}: {}", positions[i], alphabet);
        }
    }
    out
}

/// Console sink: an indicatif bar for progress, stdout for matches.
///
/// In quiet mode the bar is hidden and each match prints as its escaped
/// string alone.
pub struct ConsoleReporter {
    bar: ProgressBar,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        let bar = if verbose {
            let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {msg}")
            {
                bar.set_style(style.progress_chars("=> "));
            }
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar, verbose }
    }

    /// Print the closing summary and clear the bar.
    pub fn finish(&self, outcome: &SearchOutcome) {
        self.bar.finish_and_clear();
        if !self.verbose {
            return;
        }

        if outcome.interrupted {
            println!("Interrupted.");
        } else if !outcome.found() {
            println!("No match in {} candidates.", format_number(outcome.total));
        }
        println!(
            "Hashed {} in {} ({})",
            format_number(outcome.hashed),
            format_duration(outcome.elapsed),
            format_rate(rate(outcome.hashed, outcome.elapsed))
        );
    }
}

impl Reporter for ConsoleReporter {
    fn on_progress(&mut self, current: u64, total: u64, elapsed: Duration) {
        if !self.verbose {
            return;
        }
        let eta = estimate_remaining(current, total, elapsed)
            .map(format_duration)
            .unwrap_or_else(|| "calculating...".to_string());
        if self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_position(current);
        self.bar
            .set_message(format!("{} | ETA: {}", format_progress(current, total, elapsed), eta));
    }

    fn on_match(&mut self, candidate: &[u8], digest: &Digest, elapsed: Duration) {
        let text = if self.verbose {
            format_match(candidate, digest, elapsed)
        } else {
            escape_candidate(candidate)
        };
        self.bar.suspend(|| println!("{}", text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::md5;
    use crate::pattern::{Alphabet, Pattern, WILDCARD};

    #[test]
    fn test_escape_candidate() {
        assert_eq!(escape_candidate(b"abc"), "\"abc\"");
        assert_eq!(escape_candidate(b"a\x00b\xff"), "\"a\\x00b\\xff\"");
        assert_eq!(escape_candidate(b" ~\x7f"), "\" ~\\x7f\"");
        assert_eq!(escape_candidate(b""), "\"\"");
    }

    #[test]
    fn test_format_progress() {
        let line = format_progress(500, 1000, Duration::from_secs(2));
        assert_eq!(line, "500 / 1,000 (50.00%, 2.00 sec, 250 H/s)");
    }

    #[test]
    fn test_format_match() {
        let block = format_match(b"240610708", &md5::digest(b"240610708"), Duration::from_millis(1500));
        assert_eq!(
            block,
            "MATCH\n  Time: 1.50 sec\n  String: \"240610708\"\n  Hash: 0e462097431906509019562988736854"
        );
    }

    #[test]
    fn test_info_header_shows_trailing_alphabet_range() {
        let alphabets = vec![Alphabet::new("ab").unwrap(), Alphabet::new("xyz").unwrap()];
        let config = SearchConfig::new("k???", alphabets.clone()).with_workers(2);
        let pattern = Pattern::parse(&config.template, WILDCARD, true).unwrap();
        let space = SearchSpace::new(pattern, &alphabets).unwrap();

        let header = format_info_header(&config, &space);
        assert!(header.starts_with("INFO\n  Threads: 2\n  Pattern: \"k???\"\n"));
        assert!(header.contains("  Candidates: 18 (18)\n"));
        assert!(header.contains("  Alphabet for position 1: \"ab\"\n"));
        assert!(header.contains("  Alphabet for positions 2..3: \"xyz\"\n"));
    }
}
