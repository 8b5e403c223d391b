//! Pattern and alphabet model.
//!
//! A [`Pattern`] is a template with wildcard positions; each wildcard draws from
//! an [`Alphabet`]. When fewer alphabets than wildcards are supplied, the last
//! alphabet covers the remaining positions. [`SearchSpace`] resolves that
//! fallback once, computes the overflow-checked total and maps linear indices
//! to candidates.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SearchError};

/// Default wildcard marker.
pub const WILDCARD: u8 = b'?';

/// Template with the wildcard positions collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    template: Vec<u8>,
    wildcards: Vec<usize>,
}

impl Pattern {
    /// Scan `template` for `wildcard` bytes.
    ///
    /// Fails when `require_wildcard` is set and the template contains none.
    pub fn parse(template: &[u8], wildcard: u8, require_wildcard: bool) -> Result<Self> {
        let wildcards: Vec<usize> = template
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b == wildcard)
            .map(|(i, _)| i)
            .collect();

        if require_wildcard && wildcards.is_empty() {
            return Err(SearchError::config(
                "pattern has no wildcards, nothing to search",
            ));
        }

        Ok(Self {
            template: template.to_vec(),
            wildcards,
        })
    }

    pub fn template(&self) -> &[u8] {
        &self.template
    }

    /// Wildcard indices, ascending.
    pub fn wildcard_positions(&self) -> &[usize] {
        &self.wildcards
    }

    pub fn wildcard_count(&self) -> usize {
        self.wildcards.len()
    }

    pub fn len(&self) -> usize {
        self.template.len()
    }

    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }

    /// True when no fixed byte sits between the first and last wildcard.
    pub fn wildcards_contiguous(&self) -> bool {
        self.wildcards.windows(2).all(|w| w[0] + 1 == w[1])
    }
}

/// Ordered, non-empty list of candidate bytes for a wildcard.
///
/// Order is kept exactly as given and duplicates are not removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet(Vec<u8>);

impl Alphabet {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(SearchError::config("alphabet must not be empty"));
        }
        Ok(Self(bytes))
    }

    /// Inclusive byte range `lo..=hi`, ascending.
    pub fn range(lo: u8, hi: u8) -> Result<Self> {
        if lo > hi {
            return Err(SearchError::config(format!(
                "alphabet range {}..{} is empty (lo > hi)",
                lo, hi
            )));
        }
        Ok(Self((lo..=hi).collect()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every byte is exactly one more than the previous one.
    pub fn is_contiguous(&self) -> bool {
        self.0.windows(2).all(|w| w[0].checked_add(1) == Some(w[1]))
    }

    /// First and last byte.
    pub fn bounds(&self) -> (u8, u8) {
        // non-empty by construction
        (self.0[0], self.0[self.0.len() - 1])
    }
}

/// Parses the two literal forms: `=chars` (explicit set) and `:lo:hi`
/// (inclusive decimal byte range).
impl FromStr for Alphabet {
    type Err = SearchError;

    fn from_str(spec: &str) -> Result<Self> {
        if let Some(chars) = spec.strip_prefix('=') {
            return Alphabet::new(chars.as_bytes());
        }

        if let Some(range) = spec.strip_prefix(':') {
            let invalid = || SearchError::config(format!("invalid alphabet specification: {}", spec));
            let (lo, hi) = range.split_once(':').ok_or_else(invalid)?;
            let lo: u8 = lo.trim().parse().map_err(|_| invalid())?;
            let hi: u8 = hi.trim().parse().map_err(|_| invalid())?;
            return Alphabet::range(lo, hi);
        }

        Err(SearchError::config(format!(
            "invalid alphabet specification: {} (expected =chars or :lo:hi)",
            spec
        )))
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::display::escape_candidate(&self.0))
    }
}

/// Alphabet in effect for wildcard number `wildcard_index`.
pub fn effective_alphabet(wildcard_index: usize, alphabets: &[Alphabet]) -> Result<&Alphabet> {
    alphabets
        .get(wildcard_index)
        .or_else(|| alphabets.last())
        .ok_or_else(|| SearchError::config("at least one alphabet is required"))
}

/// Product of the effective alphabet sizes, failing on the first partial
/// product that does not survive a division round-trip.
pub fn total_space(pattern: &Pattern, alphabets: &[Alphabet]) -> Result<u64> {
    let mut total: u64 = 1;
    for i in 0..pattern.wildcard_count() {
        let base = effective_alphabet(i, alphabets)?.len() as u64;
        let next = total.wrapping_mul(base);
        if next / base != total {
            return Err(SearchError::Overflow);
        }
        total = next;
    }
    Ok(total)
}

/// Pattern plus the effective alphabet of every wildcard and the total size.
///
/// Read-only once built; shared by reference with every worker.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    pattern: Pattern,
    alphabets: Vec<Alphabet>,
    total: u64,
}

impl SearchSpace {
    pub fn new(pattern: Pattern, alphabets: &[Alphabet]) -> Result<Self> {
        let total = total_space(&pattern, alphabets)?;
        let effective = (0..pattern.wildcard_count())
            .map(|i| effective_alphabet(i, alphabets).cloned())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            pattern,
            alphabets: effective,
            total,
        })
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// One alphabet per wildcard, fallback already applied.
    pub fn alphabets(&self) -> &[Alphabet] {
        &self.alphabets
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of candidates below one value of the outermost wildcard.
    pub fn inner_size(&self) -> u64 {
        match self.alphabets.first() {
            Some(first) => self.total / first.len() as u64,
            None => 1,
        }
    }

    /// Mixed-radix decode of `index` into per-wildcard alphabet offsets.
    ///
    /// The last wildcard is the least significant digit, so increasing indices
    /// follow the nested enumeration order (last wildcard fastest).
    pub fn decode(&self, index: u64, offsets: &mut [usize]) {
        let mut rest = index;
        for (slot, alphabet) in offsets.iter_mut().zip(&self.alphabets).rev() {
            let base = alphabet.len() as u64;
            *slot = (rest % base) as usize;
            rest /= base;
        }
    }

    /// Write the candidate for `offsets` into `buf` (a copy of the template).
    pub fn fill(&self, offsets: &[usize], buf: &mut [u8]) {
        for ((&pos, alphabet), &off) in self
            .pattern
            .wildcards
            .iter()
            .zip(&self.alphabets)
            .zip(offsets)
        {
            buf[pos] = alphabet.0[off];
        }
    }

    /// Candidate at linear `index`.
    pub fn candidate(&self, index: u64) -> Vec<u8> {
        let mut offsets = vec![0; self.pattern.wildcard_count()];
        self.decode(index, &mut offsets);
        let mut buf = self.pattern.template.clone();
        self.fill(&offsets, &mut buf);
        buf
    }
}
