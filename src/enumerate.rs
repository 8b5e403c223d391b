//! Candidate enumeration.
//!
//! Candidates are visited depth-first with the last wildcard varying fastest.
//! Because that order is exactly the mixed-radix order of
//! [`SearchSpace::decode`], any contiguous index range can be walked with an
//! odometer, and splitting the outermost wildcard's alphabet between workers
//! is the same as splitting the index space into contiguous blocks.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::pattern::SearchSpace;

/// Lazy walk over a contiguous range of candidate indices.
///
/// Restartable: build a new one over the same range to start again.
/// [`Candidates::next_candidate`] reuses one buffer; the `Iterator` impl
/// hands out owned copies.
pub struct Candidates<'a> {
    space: &'a SearchSpace,
    offsets: Vec<usize>,
    buf: Vec<u8>,
    next: u64,
    end: u64,
    primed: bool,
}

impl<'a> Candidates<'a> {
    /// Every candidate of the space, in nested order.
    pub fn new(space: &'a SearchSpace) -> Self {
        Self::range(space, 0..space.total())
    }

    /// Candidates with indices in `range` (clamped to the space).
    pub fn range(space: &'a SearchSpace, range: Range<u64>) -> Self {
        let end = range.end.min(space.total());
        Self {
            space,
            offsets: vec![0; space.pattern().wildcard_count()],
            buf: space.pattern().template().to_vec(),
            next: range.start.min(end),
            end,
            primed: false,
        }
    }

    /// Index of the candidate the next call will produce.
    pub fn position(&self) -> u64 {
        self.next
    }

    pub fn remaining(&self) -> u64 {
        self.end - self.next
    }

    /// Advance and borrow the next candidate.
    pub fn next_candidate(&mut self) -> Option<&[u8]> {
        if self.next >= self.end {
            return None;
        }

        if self.primed {
            self.step();
        } else {
            self.space.decode(self.next, &mut self.offsets);
            self.space.fill(&self.offsets, &mut self.buf);
            self.primed = true;
        }

        self.next += 1;
        Some(&self.buf)
    }

    // Odometer increment, last wildcard first.
    fn step(&mut self) {
        let positions = self.space.pattern().wildcard_positions();
        let alphabets = self.space.alphabets();

        for i in (0..self.offsets.len()).rev() {
            let alphabet = alphabets[i].as_bytes();
            self.offsets[i] += 1;
            if self.offsets[i] < alphabet.len() {
                self.buf[positions[i]] = alphabet[self.offsets[i]];
                return;
            }
            self.offsets[i] = 0;
            self.buf[positions[i]] = alphabet[0];
        }
    }
}

impl Iterator for Candidates<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        self.next_candidate().map(<[u8]>::to_vec)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (n, usize::try_from(self.remaining()).ok())
    }
}

/// Balanced split of `len` items into `workers` contiguous ranges: every
/// worker gets `len / workers`, the first `len % workers` get one more.
pub fn split_range(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let mut ranges = Vec::with_capacity(workers);
    let mut first = 0;
    for t in 0..workers {
        let size = len / workers + usize::from(t < len % workers);
        ranges.push(first..first + size);
        first += size;
    }
    ranges
}

/// Candidate index range owned by each worker.
///
/// Only the outermost wildcard is split; worker `t` owns the alphabet offsets
/// `split_range(A, workers)[t]` of that wildcard and everything below them.
pub fn partition(space: &SearchSpace, workers: usize) -> Vec<Range<u64>> {
    let Some(outer) = space.alphabets().first() else {
        // No wildcards: a single candidate, owned by the first worker.
        let mut ranges = vec![0..0; workers.max(1)];
        ranges[0] = 0..1;
        return ranges;
    };

    let inner = space.inner_size();
    split_range(outer.len(), workers)
        .into_iter()
        .map(|r| r.start as u64 * inner..r.end as u64 * inner)
        .collect()
}

/// Visit every candidate of `space` with `workers` threads.
///
/// Each worker walks its own partition in nested order and calls `callback`
/// directly; there is no ordering between workers. Workers check `stop` after
/// every candidate and return early once it is set. All workers are joined
/// before this returns. With no wildcards the callback runs exactly once, on
/// the calling thread, with the template itself.
pub fn enumerate<F>(space: &SearchSpace, workers: usize, stop: &AtomicBool, callback: F)
where
    F: Fn(&[u8]) + Sync,
{
    if space.pattern().wildcard_count() == 0 {
        if !stop.load(Ordering::Relaxed) {
            callback(space.pattern().template());
        }
        return;
    }

    let outer_ranges = split_range(space.alphabets()[0].len(), workers);
    let ranges = partition(space, workers);

    std::thread::scope(|scope| {
        for (t, (range, outer)) in ranges.into_iter().zip(outer_ranges).enumerate() {
            if range.is_empty() {
                log::debug!("worker {} has nothing to do", t);
                continue;
            }
            log::info!(
                "worker {} responsible for alphabet range {}..{}",
                t,
                outer.start,
                outer.end - 1
            );

            let callback = &callback;
            scope.spawn(move || {
                let mut candidates = Candidates::range(space, range);
                while let Some(candidate) = candidates.next_candidate() {
                    callback(candidate);
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                }
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Alphabet, Pattern, WILDCARD};
    use std::sync::Mutex;

    fn space(template: &str, alphabets: &[&str]) -> SearchSpace {
        let pattern = Pattern::parse(template.as_bytes(), WILDCARD, false).unwrap();
        let alphabets: Vec<Alphabet> = alphabets
            .iter()
            .map(|a| Alphabet::new(a.as_bytes()).unwrap())
            .collect();
        SearchSpace::new(pattern, &alphabets).unwrap()
    }

    fn collect(space: &SearchSpace, workers: usize) -> Vec<Vec<u8>> {
        let seen = Mutex::new(Vec::new());
        let stop = AtomicBool::new(false);
        enumerate(space, workers, &stop, |c| seen.lock().unwrap().push(c.to_vec()));
        seen.into_inner().unwrap()
    }

    #[test]
    fn test_nested_order() {
        let s = space("?x?", &["ab", "ab"]);
        let got: Vec<Vec<u8>> = Candidates::new(&s).collect();
        assert_eq!(got, vec![b"axa".to_vec(), b"axb".to_vec(), b"bxa".to_vec(), b"bxb".to_vec()]);
        assert_eq!(collect(&s, 1), got);
    }

    #[test]
    fn test_last_wildcard_fastest_mixed_sizes() {
        let s = space("??", &["ab", "xyz"]);
        let got: Vec<String> = Candidates::new(&s)
            .map(|c| String::from_utf8(c).unwrap())
            .collect();
        assert_eq!(got, vec!["ax", "ay", "az", "bx", "by", "bz"]);
    }

    #[test]
    fn test_odometer_matches_decode() {
        let s = space("?-??-?", &["abc", "01", "XYZW"]);
        assert_eq!(s.total(), 3 * 2 * 4 * 4);
        for (i, c) in Candidates::new(&s).enumerate() {
            assert_eq!(c, s.candidate(i as u64), "index {}", i);
        }
    }

    #[test]
    fn test_range_starts_mid_space() {
        let s = space("???", &["abc"]);
        let tail: Vec<Vec<u8>> = Candidates::range(&s, 25..100).collect();
        assert_eq!(tail, vec![b"ccb".to_vec(), b"ccc".to_vec()]);

        let mut c = Candidates::range(&s, 3..5);
        assert_eq!(c.size_hint(), (2, Some(2)));
        assert_eq!(c.next_candidate(), Some(&b"aba"[..]));
        assert_eq!(c.position(), 4);
        assert_eq!(c.next_candidate(), Some(&b"abb"[..]));
        assert_eq!(c.next_candidate(), None);
    }

    #[test]
    fn test_zero_wildcards_called_once() {
        let s = space("literal", &["ab"]);
        assert_eq!(s.total(), 1);
        assert_eq!(collect(&s, 1), vec![b"literal".to_vec()]);
        assert_eq!(collect(&s, 4), vec![b"literal".to_vec()]);
        assert_eq!(Candidates::new(&s).collect::<Vec<_>>(), vec![b"literal".to_vec()]);
    }

    #[test]
    fn test_split_range_balanced() {
        assert_eq!(split_range(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(split_range(4, 4), vec![0..1, 1..2, 2..3, 3..4]);
        assert_eq!(split_range(2, 3), vec![0..1, 1..2, 2..2]);
        assert_eq!(split_range(5, 1), vec![0..5]);
    }

    #[test]
    fn test_partition_covers_space() {
        let s = space("??", &["abcde", "xy"]);
        let ranges = partition(&s, 2);
        assert_eq!(ranges, vec![0..6, 6..10]);
    }

    #[test]
    fn test_partition_union_equals_single_thread() {
        let s = space("?a??", &["abcdefg", "01", "xyz"]);
        let mut single = collect(&s, 1);
        single.sort();

        for workers in 1..=7 {
            let mut got = collect(&s, workers);
            assert_eq!(got.len(), single.len(), "workers = {}", workers);
            got.sort();
            assert_eq!(got, single, "workers = {}", workers);
        }
    }

    #[test]
    fn test_stop_flag_halts_workers() {
        let s = space("????", &["abcdefghij"]);
        let stop = AtomicBool::new(false);
        let count = std::sync::atomic::AtomicU64::new(0);
        enumerate(&s, 1, &stop, |_| {
            if count.fetch_add(1, Ordering::Relaxed) + 1 == 5 {
                stop.store(true, Ordering::Relaxed);
            }
        });
        assert_eq!(count.load(Ordering::Relaxed), 5);
    }
}
