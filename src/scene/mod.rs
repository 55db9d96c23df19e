// scene/mod.rs

pub mod camera;
pub mod lights;
pub mod model;
pub mod primitives;
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use lights::{Attenuation, DirectionalLight, PointLight, SpotLight};
pub use model::{Face, FaceGroup, MaterialDesc, Model, VertexLayout};
pub use scene::{Scene, StaticModel};
pub use transform::Transform;
