use thiserror::Error;

/// Errors raised while setting up a search.
///
/// Every variant is detected on the main control path before any worker
/// thread or device dispatch starts. Nothing in a hot loop returns one.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Invalid or missing user-supplied configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The product of the effective alphabet sizes does not fit in a `u64`.
    #[error("overflow when computing the total number of candidates, use fewer wildcards or smaller alphabets")]
    Overflow,

    /// The pattern cannot be searched on the compute device.
    #[error("pattern not supported by the device path: {0}")]
    UnsupportedPattern(String),

    /// The compute device failed.
    #[error(transparent)]
    Gpu(#[from] GpuError),
}

impl SearchError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SearchError::Config(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        SearchError::UnsupportedPattern(msg.into())
    }
}

/// Error types for compute device operations
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no compute device is available on this system")]
    DeviceNotAvailable,
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),
    #[error("pipeline creation failed: {0}")]
    PipelineCreationFailed(String),
    #[error("device command failed: {0}")]
    DispatchFailed(String),
    #[error("result buffer holds {got} flags, expected {expected}")]
    ResultSizeMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, SearchError>;
