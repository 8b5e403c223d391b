//! Metal backend (macOS, `gpu` feature).
//!
//! The kernel in `md5_search.metal` hard-codes the magic-hash predicate
//! (`md5_hex(candidate)` starts with `0e` followed only by decimal digits).
//! Flags it raises are re-checked on the host, so other predicates never
//! produce false matches, but matches for them will be missed.

use std::sync::Arc;

use ::metal::{
    Buffer, CommandQueue, CompileOptions, ComputePipelineState, Device, MTLResourceOptions, MTLSize,
};

use super::{ComputeDevice, DeviceLayout};
use crate::config::THREADGROUP_SIZE;
use crate::error::GpuError;
use crate::md5::BLOCK_SIZE;

const KERNEL_SOURCE: &str = include_str!("md5_search.metal");
const KERNEL_NAME: &str = "md5_search";

/// Metal device plus its command queue.
pub struct MetalContext {
    pub device: Device,
    pub command_queue: CommandQueue,
}

impl MetalContext {
    pub fn new() -> Result<Self, GpuError> {
        let device = Device::system_default().ok_or(GpuError::DeviceNotAvailable)?;
        let command_queue = device.new_command_queue();
        Ok(Self { device, command_queue })
    }

    pub fn is_available() -> bool {
        Device::system_default().is_some()
    }

    pub fn device_name(&self) -> String {
        self.device.name().to_string()
    }
}

/// Must match `KernelParams` in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct KernelParams {
    offset: u64,
    count: u32,
    prefix_len: u32,
    suffix_len: u32,
    run_len: u32,
    lo: u32,
    base: u32,
}

struct Prepared {
    pipeline: ComputePipelineState,
    params: KernelParams,
    prefix: Buffer,
    suffix: Buffer,
    flags: Buffer,
    capacity: usize,
}

pub struct MetalDevice {
    context: Arc<MetalContext>,
    prepared: Option<Prepared>,
}

impl MetalDevice {
    pub fn new(context: Arc<MetalContext>) -> Self {
        Self { context, prepared: None }
    }

    /// Open the system default device.
    pub fn open() -> Result<Self, GpuError> {
        Ok(Self::new(Arc::new(MetalContext::new()?)))
    }

    fn upload(&self, bytes: &[u8]) -> Buffer {
        // Metal rejects zero-length buffers
        let padded = [0u8; BLOCK_SIZE];
        let data = if bytes.is_empty() { &padded[..1] } else { bytes };
        self.context.device.new_buffer_with_data(
            data.as_ptr() as *const _,
            data.len() as u64,
            MTLResourceOptions::StorageModeShared,
        )
    }
}

impl ComputeDevice for MetalDevice {
    fn name(&self) -> String {
        self.context.device_name()
    }

    fn prepare(&mut self, layout: &DeviceLayout, chunk_size: usize) -> Result<(), GpuError> {
        log::info!("compiling Metal kernel ({} bytes of source)", KERNEL_SOURCE.len());

        let library = self
            .context
            .device
            .new_library_with_source(KERNEL_SOURCE, &CompileOptions::new())
            .map_err(|e| GpuError::ShaderCompilationFailed(e.to_string()))?;
        let function = library
            .get_function(KERNEL_NAME, None)
            .map_err(|e| GpuError::ShaderCompilationFailed(e.to_string()))?;
        let pipeline = self
            .context
            .device
            .new_compute_pipeline_state_with_function(&function)
            .map_err(|e| GpuError::PipelineCreationFailed(e.to_string()))?;

        let params = KernelParams {
            offset: 0,
            count: 0,
            prefix_len: layout.prefix.len() as u32,
            suffix_len: layout.suffix.len() as u32,
            run_len: layout.run_len as u32,
            lo: u32::from(layout.lo),
            base: layout.base() as u32,
        };

        let prefix = self.upload(&layout.prefix);
        let suffix = self.upload(&layout.suffix);
        let flags = self
            .context
            .device
            .new_buffer(chunk_size as u64, MTLResourceOptions::StorageModeShared);

        self.prepared = Some(Prepared {
            pipeline,
            params,
            prefix,
            suffix,
            flags,
            capacity: chunk_size,
        });
        Ok(())
    }

    fn dispatch(&mut self, offset: u64, flags: &mut [u8]) -> Result<(), GpuError> {
        let prepared = self
            .prepared
            .as_mut()
            .ok_or_else(|| GpuError::DispatchFailed("dispatch before prepare".into()))?;
        if flags.len() > prepared.capacity {
            return Err(GpuError::ResultSizeMismatch {
                expected: prepared.capacity,
                got: flags.len(),
            });
        }

        prepared.params.offset = offset;
        prepared.params.count = u32::try_from(flags.len())
            .map_err(|_| GpuError::DispatchFailed(format!("chunk of {} exceeds 32-bit count", flags.len())))?;

        let command_buffer = self.context.command_queue.new_command_buffer();
        let encoder = command_buffer.new_compute_command_encoder();

        encoder.set_compute_pipeline_state(&prepared.pipeline);
        encoder.set_bytes(
            0,
            std::mem::size_of::<KernelParams>() as u64,
            &prepared.params as *const KernelParams as *const _,
        );
        encoder.set_buffer(1, Some(&prepared.prefix), 0);
        encoder.set_buffer(2, Some(&prepared.suffix), 0);
        encoder.set_buffer(3, Some(&prepared.flags), 0);

        // The work-item count is always launched in full work-groups; the
        // kernel returns early past `count`.
        let width = THREADGROUP_SIZE.min(prepared.pipeline.max_total_threads_per_threadgroup() as usize) as u64;
        let groups = (flags.len() as u64).div_ceil(width);
        encoder.dispatch_thread_groups(
            MTLSize { width: groups, height: 1, depth: 1 },
            MTLSize { width, height: 1, depth: 1 },
        );

        encoder.end_encoding();
        command_buffer.commit();
        command_buffer.wait_until_completed();

        let results = unsafe {
            std::slice::from_raw_parts(prepared.flags.contents() as *const u8, flags.len())
        };
        flags.copy_from_slice(results);
        Ok(())
    }
}
