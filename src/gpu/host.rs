//! Host implementation of the search kernel.
//!
//! Runs the exact per-index work a device thread does (regenerate the candidate
//! from its index, hash it, test the predicate, write one flag) spread over the
//! rayon pool. Always available, so the offload path can run and be tested on
//! machines without a GPU.

use rayon::prelude::*;

use super::{ComputeDevice, DeviceLayout};
use crate::error::GpuError;
use crate::md5::{self, BLOCK_SIZE};
use crate::predicate::Predicate;

pub struct HostDevice {
    predicate: Predicate,
    layout: Option<DeviceLayout>,
}

impl HostDevice {
    pub fn new(predicate: Predicate) -> Self {
        Self { predicate, layout: None }
    }
}

impl ComputeDevice for HostDevice {
    fn name(&self) -> String {
        format!("host ({} threads)", rayon::current_num_threads())
    }

    fn prepare(&mut self, layout: &DeviceLayout, _chunk_size: usize) -> Result<(), GpuError> {
        self.layout = Some(layout.clone());
        Ok(())
    }

    fn dispatch(&mut self, offset: u64, flags: &mut [u8]) -> Result<(), GpuError> {
        let layout = self
            .layout
            .as_ref()
            .ok_or_else(|| GpuError::DispatchFailed("dispatch before prepare".into()))?;
        let predicate = self.predicate;

        flags.par_iter_mut().enumerate().for_each(|(i, flag)| {
            let mut message = [0u8; BLOCK_SIZE];
            let len = layout.write_candidate(offset + i as u64, &mut message);
            *flag = u8::from(predicate(&md5::digest(&message[..len])));
        });

        Ok(())
    }
}
