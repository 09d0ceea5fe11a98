use thiserror::Error;

// Unified error type for slabstencil

#[derive(Error, Debug)]
pub enum StencilError {
    #[error("grid x-dimension ({nx}) must be >= process count ({ranks}) for 1D decomposition")]
    Decomposition { nx: usize, ranks: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("rank {rank} failed to allocate grid of {elems} doubles")]
    Allocation { rank: usize, elems: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("communication error: {0}")]
    Comm(String),
}

impl StencilError {
    /// Process exit code used when this error aborts the group.
    pub fn exit_code(&self) -> i32 {
        match self {
            StencilError::Decomposition { .. } | StencilError::InvalidConfig(_) => 2,
            StencilError::Allocation { .. } => 3,
            StencilError::Io(_) => 4,
            StencilError::Comm(_) => 5,
        }
    }
}

pub type Result<T> = std::result::Result<T, StencilError>;
