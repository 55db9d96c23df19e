// scene/model.rs
//
// Face-based model description handed to the renderer by the scene loader.
// Pools are flattened per model; faces reference them by index.

use glam::{Vec2, Vec3};
use image::RgbaImage;

/// Which attributes a face's corners carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    PositionOnly,
    PositionNormal,
    PositionTexcoord,
    PositionTexcoordNormal,
}

impl VertexLayout {
    pub fn has_normal(self) -> bool {
        matches!(
            self,
            VertexLayout::PositionNormal | VertexLayout::PositionTexcoordNormal
        )
    }

    pub fn has_texcoord(self) -> bool {
        matches!(
            self,
            VertexLayout::PositionTexcoord | VertexLayout::PositionTexcoordNormal
        )
    }
}

/// One triangle. Index arrays that the layout does not use are ignored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Face {
    pub layout: VertexLayout,
    pub positions: [u32; 3],
    pub normals: [u32; 3],
    pub texcoords: [u32; 3],
    pub material: usize,
}

impl Face {
    pub fn positions(positions: [u32; 3], material: usize) -> Self {
        Self {
            layout: VertexLayout::PositionOnly,
            positions,
            normals: [0; 3],
            texcoords: [0; 3],
            material,
        }
    }

    pub fn with_normals(positions: [u32; 3], normals: [u32; 3], material: usize) -> Self {
        Self {
            layout: VertexLayout::PositionNormal,
            positions,
            normals,
            texcoords: [0; 3],
            material,
        }
    }

    pub fn with_texcoords(positions: [u32; 3], texcoords: [u32; 3], material: usize) -> Self {
        Self {
            layout: VertexLayout::PositionTexcoord,
            positions,
            normals: [0; 3],
            texcoords,
            material,
        }
    }

    pub fn full(
        positions: [u32; 3],
        texcoords: [u32; 3],
        normals: [u32; 3],
        material: usize,
    ) -> Self {
        Self {
            layout: VertexLayout::PositionTexcoordNormal,
            positions,
            normals,
            texcoords,
            material,
        }
    }
}

/// Triangles sharing a vertex layout and a material.
#[derive(Clone, Debug, Default)]
pub struct FaceGroup {
    pub name: String,
    pub faces: Vec<Face>,
}

impl FaceGroup {
    pub fn new(name: impl Into<String>, faces: Vec<Face>) -> Self {
        Self {
            name: name.into(),
            faces,
        }
    }
}

/// Constant material colours plus optional indices into the model's images.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialDesc {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub ambient_texture: Option<usize>,
    pub diffuse_texture: Option<usize>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            ambient: Vec3::ZERO,
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ZERO,
            shininess: 1.0,
            ambient_texture: None,
            diffuse_texture: None,
        }
    }
}

/// A loaded model file. `name` is the source path and the model's identity.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub groups: Vec<FaceGroup>,
    pub materials: Vec<MaterialDesc>,
    pub images: Vec<RgbaImage>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the material for `index`, or the default one when the index is unknown.
    pub fn material(&self, index: usize) -> MaterialDesc {
        match self.materials.get(index) {
            Some(material) => *material,
            None => {
                log::warn!(
                    "Model {} has no material {} ({} materials), using default",
                    self.name,
                    index,
                    self.materials.len()
                );
                MaterialDesc::default()
            }
        }
    }

    pub fn face_count(&self) -> usize {
        self.groups.iter().map(|group| group.faces.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_flags_match_variants() {
        assert!(!VertexLayout::PositionOnly.has_normal());
        assert!(!VertexLayout::PositionOnly.has_texcoord());
        assert!(VertexLayout::PositionNormal.has_normal());
        assert!(VertexLayout::PositionTexcoord.has_texcoord());
        assert!(VertexLayout::PositionTexcoordNormal.has_normal());
        assert!(VertexLayout::PositionTexcoordNormal.has_texcoord());
    }

    #[test]
    fn unknown_material_falls_back_to_default() {
        let model = Model::new("empty.obj");
        assert_eq!(model.material(3), MaterialDesc::default());
    }
}
