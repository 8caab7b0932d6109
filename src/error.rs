//! Error types for the swarm.
//!
//! None of these escape [`Swarm`](crate::Swarm)'s frame API: GPU errors turn
//! into a CPU fallback and model errors keep the current shape. They are
//! public so callers driving the pieces directly can inspect them.

use std::fmt;

/// Errors that can occur while creating the GPU backend.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// Shader compilation or pipeline validation failed.
    Validation(String),
    /// Asked to build a backend with zero particles.
    EmptyParticles,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::Validation(msg) => write!(f, "GPU validation failed: {}", msg),
            GpuError::EmptyParticles => write!(f, "Cannot create a GPU backend with no particles"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur while fetching or sampling a vertex cloud.
#[derive(Debug)]
pub enum ModelError {
    /// Failed to read the model file.
    Io(std::io::Error),
    /// A line of the model could not be parsed.
    Parse { line: usize, message: String },
    /// The model has no vertices.
    Empty,
    /// The source does not know the requested model.
    NotFound(String),
    /// Vertex `index` has a NaN or infinite coordinate.
    NonFinite { index: usize },
    /// Font data could not be parsed.
    Font(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Io(e) => write!(f, "Failed to read model: {}", e),
            ModelError::Parse { line, message } => {
                write!(f, "Failed to parse model at line {}: {}", line, message)
            }
            ModelError::Empty => write!(f, "Model contains no vertices"),
            ModelError::NotFound(url) => write!(f, "Model not found: {}", url),
            ModelError::NonFinite { index } => {
                write!(f, "Vertex {} has a non-finite coordinate", index)
            }
            ModelError::Font(message) => write!(f, "Failed to parse font: {}", message),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Io(e)
    }
}

/// An unrecognized reaction or game event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReactionError(pub String);

impl fmt::Display for ParseReactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown reaction '{}'", self.0)
    }
}

impl std::error::Error for ParseReactionError {}
