use thiserror::Error;

use crate::renderer::graph::FrameResource;

/// Failures that stop [`Renderer::initialize`](super::Renderer::initialize).
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("adapter supports {available} colour attachment bytes per sample, the G-buffer needs {required}")]
    InsufficientAttachmentBudget { required: u32, available: u32 },
    #[error("adapter cannot use {format:?} with {usage:?}")]
    UnsupportedTarget {
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    },
    #[error("adapter lacks downlevel features {0:?}")]
    MissingDownlevelFlags(wgpu::DownlevelFlags),
    #[error("invalid stage graph: {0}")]
    Graph(#[from] GraphError),
}

/// Wiring errors between render stages, detected when the graph is compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("{resource:?} is written by both '{first}' and '{second}'")]
    MultipleWriters {
        resource: FrameResource,
        first: &'static str,
        second: &'static str,
    },
    #[error("stage '{stage}' reads {resource:?}, which it also writes")]
    ReadsOwnOutput {
        stage: &'static str,
        resource: FrameResource,
    },
    #[error("stage '{stage}' reads {resource:?}, which no stage writes")]
    MissingProducer {
        stage: &'static str,
        resource: FrameResource,
    },
    #[error("stages {0:?} form a dependency cycle")]
    Cycle(Vec<&'static str>),
}

pub type RendererResult<T> = Result<T, RendererError>;

/// Failures while copying a rendered frame back to the CPU.
#[derive(Error, Debug)]
pub enum ReadbackError {
    #[error("cannot read back {0:?} as RGBA8")]
    UnsupportedFormat(wgpu::TextureFormat),
    #[error("failed to map readback buffer: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("readback did not complete within {0:?}")]
    Timeout(std::time::Duration),
}
