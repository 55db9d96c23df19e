// asset/submesh.rs
//
// Converts one face group of a model into indexed, deduplicated vertex data.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::scene::{Face, FaceGroup, Model, VertexLayout};

const PROGRESS_INTERVAL: usize = 5000;

/// One deduplicated, indexed piece of a model with a single layout and material.
#[derive(Clone, Debug, PartialEq)]
pub struct SubMesh {
    pub name: String,
    pub layout: VertexLayout,
    pub material: usize,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Option<Vec<Vec2>>,
    pub indices: Vec<u32>,
    /// Faces skipped for a mismatched layout or out-of-range pool index.
    pub dropped_faces: usize,
}

/// A fully resolved triangle corner.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Corner {
    position: Vec3,
    normal: Vec3,
    texcoord: Option<Vec2>,
}

/// Bit-exact identity of a corner. `-0.0` hashes like `0.0` so the map
/// agrees with float equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct VertexKey([u32; 8]);

impl Corner {
    fn key(&self) -> Option<VertexKey> {
        let uv = self.texcoord.unwrap_or(Vec2::ZERO);
        let values = [
            self.position.x,
            self.position.y,
            self.position.z,
            self.normal.x,
            self.normal.y,
            self.normal.z,
            uv.x,
            uv.y,
        ];
        // NaN never equals itself, so such a corner can never be shared.
        if values.iter().any(|v| v.is_nan()) {
            return None;
        }
        let mut bits = [0u32; 8];
        for (slot, value) in bits.iter_mut().zip(values) {
            *slot = if value == 0.0 { 0 } else { value.to_bits() };
        }
        Some(VertexKey(bits))
    }
}

impl SubMesh {
    /// Builds the indexed mesh for `group`, reading attribute pools from `model`.
    ///
    /// The first face fixes the layout and material. Returns `None` when the
    /// group yields no triangles.
    pub fn build(group: &FaceGroup, model: &Model) -> Option<SubMesh> {
        let Some(first) = group.faces.first() else {
            log::warn!("Model {}: face group '{}' is empty", model.name, group.name);
            return None;
        };
        let layout = first.layout;

        let mut mesh = SubMesh {
            name: group.name.clone(),
            layout,
            material: first.material,
            positions: Vec::new(),
            normals: Vec::new(),
            texcoords: layout.has_texcoord().then(Vec::new),
            indices: Vec::with_capacity(group.faces.len() * 3),
            dropped_faces: 0,
        };
        let mut seen: HashMap<VertexKey, u32> = HashMap::new();

        for (face_index, face) in group.faces.iter().enumerate() {
            if face_index > 0 && face_index % PROGRESS_INTERVAL == 0 {
                log::debug!(
                    "Model {}: group '{}' {}/{} faces",
                    model.name,
                    group.name,
                    face_index,
                    group.faces.len()
                );
            }

            if face.layout != layout {
                log::warn!(
                    "Model {}: group '{}' face {} has layout {:?}, expected {:?}; skipped",
                    model.name,
                    group.name,
                    face_index,
                    face.layout,
                    layout
                );
                mesh.dropped_faces += 1;
                continue;
            }

            let Some(corners) = resolve_corners(face, model) else {
                log::warn!(
                    "Model {}: group '{}' face {} references a missing attribute; skipped",
                    model.name,
                    group.name,
                    face_index
                );
                mesh.dropped_faces += 1;
                continue;
            };

            for corner in corners {
                let index = match corner.key() {
                    Some(key) => match seen.get(&key) {
                        Some(&existing) => existing,
                        None => {
                            let index = mesh.push_corner(&corner);
                            seen.insert(key, index);
                            index
                        }
                    },
                    None => mesh.push_corner(&corner),
                };
                mesh.indices.push(index);
            }
        }

        if mesh.indices.is_empty() {
            log::warn!(
                "Model {}: face group '{}' produced no triangles",
                model.name,
                group.name
            );
            return None;
        }

        log::debug!(
            "Model {}: group '{}' -> {} vertices, {} indices",
            model.name,
            group.name,
            mesh.vertex_count(),
            mesh.indices.len()
        );
        Some(mesh)
    }

    fn push_corner(&mut self, corner: &Corner) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(corner.position);
        self.normals.push(corner.normal);
        if let (Some(texcoords), Some(uv)) = (self.texcoords.as_mut(), corner.texcoord) {
            texcoords.push(uv);
        }
        index
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Looks up all three corners of `face`, or `None` if any index is out of range.
fn resolve_corners(face: &Face, model: &Model) -> Option<[Corner; 3]> {
    let mut positions = [Vec3::ZERO; 3];
    for (slot, &index) in positions.iter_mut().zip(&face.positions) {
        *slot = *model.positions.get(index as usize)?;
    }

    let normals = if face.layout.has_normal() {
        let mut normals = [Vec3::ZERO; 3];
        for (slot, &index) in normals.iter_mut().zip(&face.normals) {
            *slot = *model.normals.get(index as usize)?;
        }
        normals
    } else {
        [flat_normal(&positions); 3]
    };

    let texcoords = if face.layout.has_texcoord() {
        let mut texcoords = [None; 3];
        for (slot, &index) in texcoords.iter_mut().zip(&face.texcoords) {
            *slot = Some(*model.texcoords.get(index as usize)?);
        }
        texcoords
    } else {
        [None; 3]
    };

    Some([0, 1, 2].map(|i| Corner {
        position: positions[i],
        normal: normals[i],
        texcoord: texcoords[i],
    }))
}

/// Counter-clockwise face normal; zero for degenerate triangles.
pub fn flat_normal(positions: &[Vec3; 3]) -> Vec3 {
    (positions[1] - positions[0])
        .cross(positions[2] - positions[0])
        .normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    type NaiveVertex = (Vec3, Vec3, Option<Vec2>);

    /// Linear-scan reference: compare each new corner against every vertex so far.
    fn naive_build(group: &FaceGroup, model: &Model) -> (Vec<NaiveVertex>, Vec<u32>) {
        let layout = group.faces[0].layout;
        let mut vertices: Vec<NaiveVertex> = Vec::new();
        let mut indices = Vec::new();
        for face in &group.faces {
            if face.layout != layout {
                continue;
            }
            let p = face.positions.map(|i| model.positions[i as usize]);
            let n = if layout.has_normal() {
                face.normals.map(|i| model.normals[i as usize])
            } else {
                [flat_normal(&p); 3]
            };
            let t = if layout.has_texcoord() {
                face.texcoords.map(|i| Some(model.texcoords[i as usize]))
            } else {
                [None; 3]
            };
            for c in 0..3 {
                let vertex = (p[c], n[c], t[c]);
                let index = match vertices.iter().position(|v| *v == vertex) {
                    Some(found) => found,
                    None => {
                        vertices.push(vertex);
                        vertices.len() - 1
                    }
                };
                indices.push(index as u32);
            }
        }
        (vertices, indices)
    }

    fn quad_model(layout: VertexLayout) -> Model {
        let mut model = Model::new("quad.obj");
        model.positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        model.normals = vec![Vec3::Z];
        model.texcoords = vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
        let face = |p: [u32; 3]| match layout {
            VertexLayout::PositionOnly => Face::positions(p, 0),
            VertexLayout::PositionNormal => Face::with_normals(p, [0; 3], 0),
            VertexLayout::PositionTexcoord => Face::with_texcoords(p, p, 0),
            VertexLayout::PositionTexcoordNormal => Face::full(p, p, [0; 3], 0),
        };
        model.groups = vec![FaceGroup::new("quad", vec![face([0, 1, 2]), face([0, 2, 3])])];
        model
    }

    fn assert_well_formed(mesh: &SubMesh) {
        assert_eq!(mesh.positions.len(), mesh.normals.len());
        if let Some(texcoords) = &mesh.texcoords {
            assert_eq!(texcoords.len(), mesh.positions.len());
        }
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh
            .indices
            .iter()
            .all(|&i| (i as usize) < mesh.positions.len()));
    }

    #[test]
    fn quad_shares_diagonal_vertices() {
        for layout in [
            VertexLayout::PositionOnly,
            VertexLayout::PositionNormal,
            VertexLayout::PositionTexcoord,
            VertexLayout::PositionTexcoordNormal,
        ] {
            let model = quad_model(layout);
            let mesh = SubMesh::build(&model.groups[0], &model).expect("mesh");
            assert_well_formed(&mesh);
            assert_eq!(mesh.vertex_count(), 4, "{layout:?}");
            assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
            assert_eq!(mesh.texcoords.is_some(), layout.has_texcoord());
        }
    }

    #[test]
    fn flat_normal_follows_winding() {
        let n = flat_normal(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert!(n.abs_diff_eq(Vec3::Z, 1e-6));
        let degenerate = flat_normal(&[Vec3::ZERO, Vec3::X, Vec3::X * 2.0]);
        assert_eq!(degenerate, Vec3::ZERO);
    }

    #[test]
    fn flat_normals_split_vertices_across_creases() {
        // Two triangles sharing an edge but facing different ways.
        let mut model = Model::new("crease.obj");
        model.positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        model.groups = vec![FaceGroup::new(
            "crease",
            vec![Face::positions([0, 1, 2], 0), Face::positions([0, 3, 1], 0)],
        )];
        let mesh = SubMesh::build(&model.groups[0], &model).expect("mesh");
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn mixed_layout_faces_are_dropped() {
        let mut model = quad_model(VertexLayout::PositionNormal);
        model.groups[0]
            .faces
            .push(Face::positions([1, 2, 3], 0));
        let mesh = SubMesh::build(&model.groups[0], &model).expect("mesh");
        assert_eq!(mesh.dropped_faces, 1);
        assert_eq!(mesh.layout, VertexLayout::PositionNormal);
        assert_eq!(mesh.indices.len(), 6);
    }

    #[test]
    fn out_of_range_indices_are_dropped() {
        let mut model = quad_model(VertexLayout::PositionOnly);
        model.groups[0].faces.push(Face::positions([0, 1, 9], 0));
        let mesh = SubMesh::build(&model.groups[0], &model).expect("mesh");
        assert_eq!(mesh.dropped_faces, 1);
        assert_well_formed(&mesh);
    }

    #[test]
    fn empty_group_builds_nothing() {
        let model = Model::new("empty.obj");
        assert!(SubMesh::build(&FaceGroup::new("none", Vec::new()), &model).is_none());
    }

    #[test]
    fn negative_zero_matches_positive_zero() {
        let mut model = Model::new("zero.obj");
        model.positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::X,
            Vec3::Y,
            Vec3::new(-0.0, 0.0, -0.0),
        ];
        model.normals = vec![Vec3::Z];
        model.groups = vec![FaceGroup::new(
            "zeros",
            vec![
                Face::with_normals([0, 1, 2], [0; 3], 0),
                Face::with_normals([3, 1, 2], [0; 3], 0),
            ],
        )];
        let mesh = SubMesh::build(&model.groups[0], &model).expect("mesh");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn hashed_build_matches_linear_scan() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        for round in 0..40 {
            let layout = match round % 4 {
                0 => VertexLayout::PositionOnly,
                1 => VertexLayout::PositionNormal,
                2 => VertexLayout::PositionTexcoord,
                _ => VertexLayout::PositionTexcoordNormal,
            };

            // Small value alphabet so equal values appear under different indices.
            let mut model = Model::new(format!("random{round}.obj"));
            model.positions = (0..12)
                .map(|_| {
                    Vec3::new(
                        rng.gen_range(0..3) as f32,
                        rng.gen_range(0..3) as f32,
                        rng.gen_range(0..2) as f32,
                    )
                })
                .collect();
            model.normals = (0..4)
                .map(|_| Vec3::new(0.0, rng.gen_range(0..2) as f32, 1.0))
                .collect();
            model.texcoords = (0..5)
                .map(|_| Vec2::new(rng.gen_range(0..2) as f32, 0.5))
                .collect();

            let mut pick = |len: u32| -> [u32; 3] {
                [
                    rng.gen_range(0..len),
                    rng.gen_range(0..len),
                    rng.gen_range(0..len),
                ]
            };
            let faces: Vec<Face> = (0..200)
                .map(|_| {
                    let p = pick(12);
                    let n = pick(4);
                    let t = pick(5);
                    Face {
                        layout,
                        positions: p,
                        normals: n,
                        texcoords: t,
                        material: 0,
                    }
                })
                .collect();
            let group = FaceGroup::new("random", faces);

            let mesh = SubMesh::build(&group, &model).expect("mesh");
            let (vertices, indices) = naive_build(&group, &model);

            assert_well_formed(&mesh);
            assert_eq!(mesh.indices, indices, "round {round}");
            assert_eq!(mesh.vertex_count(), vertices.len());
            for (i, (p, n, t)) in vertices.iter().enumerate() {
                assert_eq!(mesh.positions[i], *p);
                assert_eq!(mesh.normals[i], *n);
                assert_eq!(mesh.texcoords.as_ref().map(|uv| uv[i]), *t);
            }
        }
    }

    #[test]
    fn output_vertices_are_unique() {
        let model = quad_model(VertexLayout::PositionTexcoordNormal);
        let mesh = SubMesh::build(&model.groups[0], &model).expect("mesh");
        let texcoords = mesh.texcoords.clone().unwrap_or_default();
        for i in 0..mesh.vertex_count() {
            for j in (i + 1)..mesh.vertex_count() {
                let same = mesh.positions[i] == mesh.positions[j]
                    && mesh.normals[i] == mesh.normals[j]
                    && texcoords[i] == texcoords[j];
                assert!(!same, "vertices {i} and {j} are duplicates");
            }
        }
    }
}
