// scene/primitives.rs
//
// Procedural models for demos and tests. Each returns a single-group model
// whose name is its identity in the model cache.

use glam::{Vec2, Vec3};

use crate::scene::{Face, FaceGroup, MaterialDesc, Model};

/// Corner `i` of a cube has x, y, z set from bits 0, 1, 2.
fn cube_corner(index: u32, half: f32) -> Vec3 {
    let pick = |bit: u32| if index & bit != 0 { half } else { -half };
    Vec3::new(pick(1), pick(2), pick(4))
}

/// Counter-clockwise corner quads seen from outside, with their normals.
const CUBE_SIDES: [([u32; 4], Vec3); 6] = [
    ([1, 3, 7, 5], Vec3::X),
    ([0, 4, 6, 2], Vec3::NEG_X),
    ([2, 6, 7, 3], Vec3::Y),
    ([0, 1, 5, 4], Vec3::NEG_Y),
    ([4, 5, 7, 6], Vec3::Z),
    ([0, 2, 3, 1], Vec3::NEG_Z),
];

/// Axis-aligned cube centred on the origin with per-side normals.
pub fn cube(name: impl Into<String>, half_extent: f32, material: MaterialDesc) -> Model {
    let mut model = Model::new(name);
    model.positions = (0..8).map(|index| cube_corner(index, half_extent)).collect();
    model.normals = CUBE_SIDES.iter().map(|(_, normal)| *normal).collect();
    model.materials.push(material);

    let faces = CUBE_SIDES
        .iter()
        .enumerate()
        .flat_map(|(side, (quad, _))| {
            let n = side as u32;
            [
                Face::with_normals([quad[0], quad[1], quad[2]], [n; 3], 0),
                Face::with_normals([quad[0], quad[2], quad[3]], [n; 3], 0),
            ]
        })
        .collect();
    model.groups.push(FaceGroup::new("cube", faces));
    model
}

/// Square in the XZ plane facing +Y, with texture coordinates spanning [0, 1].
pub fn plane(name: impl Into<String>, half_extent: f32, material: MaterialDesc) -> Model {
    let s = half_extent;
    let mut model = Model::new(name);
    model.positions = vec![
        Vec3::new(-s, 0.0, -s),
        Vec3::new(s, 0.0, -s),
        Vec3::new(s, 0.0, s),
        Vec3::new(-s, 0.0, s),
    ];
    model.texcoords = vec![
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 0.0),
    ];
    model.normals = vec![Vec3::Y];
    model.materials.push(material);
    model.groups.push(FaceGroup::new(
        "plane",
        vec![
            Face::full([0, 3, 2], [0, 3, 2], [0; 3], 0),
            Face::full([0, 2, 1], [0, 2, 1], [0; 3], 0),
        ],
    ));
    model
}

/// A single position-only triangle; its normal is derived from the winding.
pub fn triangle(name: impl Into<String>, corners: [Vec3; 3], material: MaterialDesc) -> Model {
    let mut model = Model::new(name);
    model.positions = corners.to_vec();
    model.materials.push(material);
    model
        .groups
        .push(FaceGroup::new("triangle", vec![Face::positions([0, 1, 2], 0)]));
    model
}
