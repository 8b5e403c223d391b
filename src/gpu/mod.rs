/// Compute-device offload path
///
/// Instead of shipping every candidate to the device, the device regenerates
/// candidates from their linear index, hashes them in place and writes back one
/// match flag per index. The host walks the space in fixed-size chunks, turns
/// set flags back into candidates and hands them to the coordinator.
///
/// Supported patterns have the shape `<prefix>??...??<suffix>` with a single
/// contiguous alphabet, and the full candidate must fit in one MD5 block.

pub mod host;
#[cfg(all(feature = "gpu", target_os = "macos"))]
pub mod metal;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{GpuError, Result, SearchError};
use crate::md5::MAX_SINGLE_BLOCK_LEN;
use crate::pattern::{Alphabet, SearchSpace};

pub use host::HostDevice;
#[cfg(all(feature = "gpu", target_os = "macos"))]
pub use self::metal::{MetalContext, MetalDevice};

/// Kernel arguments that stay fixed for the whole search, plus the index
/// mapping shared by host and device.
///
/// Index `id` maps to the wildcard run by taking `lo + id % base` for each
/// position from the last one backwards, dividing `id` by `base` each time.
/// The last wildcard is the least significant digit, which makes index order
/// identical to the CPU enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLayout {
    pub prefix: Vec<u8>,
    pub suffix: Vec<u8>,
    pub lo: u8,
    pub hi: u8,
    pub run_len: usize,
    pub total: u64,
}

impl DeviceLayout {
    /// Check the device preconditions against a search space and the alphabets
    /// as they were supplied (before last-alphabet fallback).
    pub fn new(space: &SearchSpace, supplied: &[Alphabet]) -> Result<Self> {
        let pattern = space.pattern();
        let positions = pattern.wildcard_positions();

        let (Some(&first), Some(&last)) = (positions.first(), positions.last()) else {
            return Err(SearchError::unsupported("the pattern needs at least one wildcard"));
        };
        if !pattern.wildcards_contiguous() {
            return Err(SearchError::unsupported("wildcards need to be contiguous"));
        }
        if supplied.len() != 1 {
            return Err(SearchError::unsupported(format!(
                "exactly one alphabet is supported, got {}",
                supplied.len()
            )));
        }

        let alphabet = &supplied[0];
        if let Some(w) = alphabet.as_bytes().windows(2).find(|w| w[0].checked_add(1) != Some(w[1])) {
            return Err(SearchError::unsupported(format!(
                "alphabet characters need to be contiguous, found {:#04x} -> {:#04x}",
                w[0], w[1]
            )));
        }

        let template = pattern.template();
        let message_len = template.len();
        if message_len > MAX_SINGLE_BLOCK_LEN {
            return Err(SearchError::unsupported(format!(
                "only one-block messages are supported, candidates must be <= {} bytes (got {})",
                MAX_SINGLE_BLOCK_LEN, message_len
            )));
        }

        let (lo, hi) = alphabet.bounds();
        Ok(Self {
            prefix: template[..first].to_vec(),
            suffix: template[last + 1..].to_vec(),
            lo,
            hi,
            run_len: last - first + 1,
            total: space.total(),
        })
    }

    pub fn base(&self) -> u64 {
        u64::from(self.hi - self.lo) + 1
    }

    pub fn message_len(&self) -> usize {
        self.prefix.len() + self.run_len + self.suffix.len()
    }

    /// Write the candidate for `index` into `out` and return its length.
    ///
    /// `out` must hold at least [`DeviceLayout::message_len`] bytes.
    #[inline]
    pub fn write_candidate(&self, index: u64, out: &mut [u8]) -> usize {
        let p = self.prefix.len();
        out[..p].copy_from_slice(&self.prefix);

        let base = self.base();
        let mut rest = index;
        for slot in out[p..p + self.run_len].iter_mut().rev() {
            *slot = self.lo + (rest % base) as u8;
            rest /= base;
        }

        let s = p + self.run_len;
        out[s..s + self.suffix.len()].copy_from_slice(&self.suffix);
        s + self.suffix.len()
    }

    /// Candidate for `index`, regenerated on the host.
    pub fn candidate(&self, index: u64) -> Vec<u8> {
        let mut out = vec![0u8; self.message_len()];
        self.write_candidate(index, &mut out);
        out
    }
}

/// A massively parallel device able to run the search kernel.
///
/// `prepare` compiles the kernel and binds the arguments that do not change
/// between chunks; `dispatch` launches one chunk and blocks until its flags
/// are read back.
pub trait ComputeDevice {
    fn name(&self) -> String;

    fn prepare(&mut self, layout: &DeviceLayout, chunk_size: usize) -> std::result::Result<(), GpuError>;

    /// Run work-items `offset..offset + flags.len()` and store one flag per item
    /// (non-zero for a match).
    fn dispatch(&mut self, offset: u64, flags: &mut [u8]) -> std::result::Result<(), GpuError>;
}

impl<D: ComputeDevice + ?Sized> ComputeDevice for Box<D> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn prepare(&mut self, layout: &DeviceLayout, chunk_size: usize) -> std::result::Result<(), GpuError> {
        (**self).prepare(layout, chunk_size)
    }

    fn dispatch(&mut self, offset: u64, flags: &mut [u8]) -> std::result::Result<(), GpuError> {
        (**self).dispatch(offset, flags)
    }
}

/// What the chunk loop reports back to its caller.
#[derive(Debug)]
pub enum OffloadEvent<'a> {
    /// About to dispatch the chunk starting at `offset`.
    ChunkStarted { offset: u64 },
    /// The chunk's flags are back; `count` candidates were hashed.
    ChunkFinished { offset: u64, count: u64 },
    /// The device flagged `candidate` (index `index`).
    Hit { index: u64, candidate: &'a [u8] },
}

/// Host-side chunk loop over a prepared device.
pub struct OffloadSearcher<D: ComputeDevice> {
    device: D,
    layout: DeviceLayout,
    flags: Vec<u8>,
}

impl<D: ComputeDevice> OffloadSearcher<D> {
    pub fn new(mut device: D, layout: DeviceLayout, chunk_size: usize) -> Result<Self> {
        device.prepare(&layout, chunk_size)?;
        log::info!(
            "device {}: {} candidates in chunks of {}",
            device.name(),
            layout.total,
            chunk_size
        );
        Ok(Self {
            device,
            layout,
            flags: vec![0u8; chunk_size],
        })
    }

    pub fn layout(&self) -> &DeviceLayout {
        &self.layout
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Walk the whole space chunk by chunk.
    ///
    /// `stop` is checked before each chunk and after each hit. Only flags for
    /// indices below the total are read. Returns the number of candidates hashed.
    pub fn run<F>(&mut self, stop: &AtomicBool, mut on_event: F) -> Result<u64>
    where
        F: FnMut(OffloadEvent<'_>),
    {
        let total = self.layout.total;
        let chunk = self.flags.len() as u64;
        let mut candidate = vec![0u8; self.layout.message_len()];
        let mut hashed = 0u64;
        let mut offset = 0u64;

        while offset < total {
            if stop.load(Ordering::SeqCst) {
                log::info!("offload stopped at offset {}", offset);
                break;
            }

            let count = chunk.min(total - offset);
            on_event(OffloadEvent::ChunkStarted { offset });
            log::debug!("dispatching chunk {}..{}", offset, offset + count);

            let flags = &mut self.flags[..count as usize];
            self.device.dispatch(offset, flags)?;
            hashed += count;
            on_event(OffloadEvent::ChunkFinished { offset, count });

            for (i, _) in flags.iter().enumerate().filter(|&(_, &f)| f != 0) {
                let index = offset + i as u64;
                self.layout.write_candidate(index, &mut candidate);
                on_event(OffloadEvent::Hit { index, candidate: &candidate });
                if stop.load(Ordering::SeqCst) {
                    break;
                }
            }

            offset += count;
        }

        Ok(hashed)
    }
}
