pub mod cache;
pub mod handle;
pub mod mesh;
pub mod submesh;

pub use cache::ModelCache;
pub use handle::Handle;
pub use mesh::{GpuModel, GpuSubMesh, MaterialBinding};
pub use submesh::SubMesh;
