// CPU mirror of irradiance.wgsl and composite.wgsl, fed with the uniforms the
// renderer actually uploads.

use glam::{Mat4, Vec3, Vec4};
use umbra::renderer::uniforms::CompositeLightUniform;
use umbra::renderer::{FrameData, LightLayout};
use umbra::scene::primitives::triangle;
use umbra::scene::{Camera, DirectionalLight, MaterialDesc, Scene, SpotLight, Transform};
use umbra::RenderSettings;

const LIGHT_SUN: u32 = 0;
const LIGHT_SPOT: u32 = 1;

/// One G-buffer texel, in view space.
#[derive(Clone, Copy)]
struct Surface {
    normal: Vec3,
    ambient: Vec3,
    diffuse: Vec3,
    specular: Vec3,
    shininess: f32,
    position: Vec3,
}

fn vec3(v: [f32; 4]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

/// `to_light` from irradiance.wgsl; visibility is 1 (nothing occludes).
fn irradiance_cpu(light: &CompositeLightUniform, position: Vec3) -> Vec4 {
    let towards = if light.kind[0] == LIGHT_SUN {
        (-vec3(light.direction)).normalize()
    } else {
        (vec3(light.position) - position).normalize_or_zero()
    };
    towards.extend(1.0)
}

fn cone_factor(light: &CompositeLightUniform, from_light: Vec3) -> f32 {
    let cos_theta = from_light.dot(vec3(light.direction).normalize());
    if cos_theta < light.direction[3] {
        return 0.0;
    }
    let exponent = light.position[3];
    if exponent <= 0.0 {
        return 1.0;
    }
    cos_theta.max(0.0).powf(exponent)
}

fn attenuation_factor(light: &CompositeLightUniform, dist: f32) -> f32 {
    let [kc, kl, kq, _] = light.attenuation;
    let denom = kc + kl * dist + kq * dist * dist;
    if denom <= 0.0 {
        1.0
    } else {
        1.0 / denom
    }
}

/// `fs_main` of composite.wgsl for a covered pixel.
fn composite_cpu(surface: Surface, light: &CompositeLightUniform) -> Vec3 {
    let lighting = irradiance_cpu(light, surface.position);
    let color_rgb = vec3(light.color);
    let kind = light.kind[0];

    let mut color = Vec3::ZERO;
    if kind == LIGHT_SUN {
        let base = if surface.ambient.dot(surface.ambient) > 0.0 {
            surface.ambient
        } else {
            surface.diffuse
        };
        color += light.color[3] * base;
    }

    let n = surface.normal.normalize_or_zero();
    let l = lighting.truncate();
    let n_dot_l = n.dot(l).max(0.0);

    let mut factor = lighting.w;
    if kind != LIGHT_SUN {
        let offset = surface.position - vec3(light.position);
        let dist = offset.length();
        let reach = light.attenuation[3];
        if reach > 0.0 && dist > reach {
            factor = 0.0;
        }
        if kind == LIGHT_SPOT && dist > 0.0 {
            factor *= cone_factor(light, offset / dist);
        }
        factor *= attenuation_factor(light, dist);
    }

    let diffuse = surface.diffuse * color_rgb * n_dot_l;
    let mut specular = Vec3::ZERO;
    if n_dot_l > 0.0 && surface.position.dot(surface.position) > 0.0 {
        let v = (-surface.position).normalize();
        let h = (l + v).normalize();
        specular = surface.specular * color_rgb * n.dot(h).max(0.0).powf(surface.shininess.max(1.0));
    }

    color + (diffuse + specular) * factor
}

fn surface_at(view: Mat4, world: Vec3, world_normal: Vec3, material: &MaterialDesc) -> Surface {
    Surface {
        normal: view.transform_vector3(world_normal),
        ambient: material.ambient,
        diffuse: material.diffuse,
        specular: material.specular,
        shininess: material.shininess,
        position: view.transform_point3(world),
    }
}

fn overhead_camera() -> Camera {
    Camera::new(45.0, 640.0 / 480.0, 0.1, 100.0).looking_at(Vec3::new(0.0, 10.0, 0.1), Vec3::ZERO)
}

#[test]
fn sun_lit_triangle_gets_at_least_its_ambient_share() {
    let material = MaterialDesc {
        diffuse: Vec3::new(0.8, 0.4, 0.2),
        ..MaterialDesc::default()
    };
    let mut scene = Scene::new(DirectionalLight::new(Vec3::NEG_Y, Vec3::ONE, 0.2));
    let model = scene.intern_model(triangle(
        "tri",
        [Vec3::new(-1.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0)],
        material,
    ));
    scene.add_model(model, Transform::default());

    let camera = overhead_camera();
    let layout = LightLayout::from_scene(&scene);
    let data = FrameData::gather(&camera, &scene, &layout, &RenderSettings::default());
    let sun = data.composite[0].unwrap();

    let surface = surface_at(camera.view(), Vec3::ZERO, Vec3::Y, &material);
    let color = composite_cpu(surface, &sun);

    assert!(color.max_element() > 0.0);
    let ambient_floor = material.diffuse * 0.2;
    assert!(color.cmpge(ambient_floor - Vec3::splat(1e-5)).all(), "{color} < {ambient_floor}");
    // Facing the sun head-on: ambient plus full diffuse.
    assert!((color - material.diffuse * 1.2).length() < 1e-4);
}

#[test]
fn ambient_colour_replaces_diffuse_for_the_ambient_term() {
    let material = MaterialDesc {
        ambient: Vec3::new(0.0, 0.5, 0.0),
        diffuse: Vec3::new(0.8, 0.0, 0.0),
        ..MaterialDesc::default()
    };
    let sun = CompositeLightUniform::sun(Vec3::ONE, 0.5, Vec3::NEG_Y);
    // Facing away from the sun: only the ambient term is left.
    let surface = surface_at(Mat4::IDENTITY, Vec3::new(0.0, 0.0, -5.0), Vec3::NEG_Y, &material);
    let color = composite_cpu(surface, &sun);
    assert!((color - Vec3::new(0.0, 0.25, 0.0)).length() < 1e-6);
}

fn spot_scene() -> Scene {
    let mut scene = Scene::new(DirectionalLight::new(Vec3::NEG_Y, Vec3::ZERO, 0.0));
    scene.add_spotlight(SpotLight::new(
        Vec3::new(0.0, 5.0, 0.0),
        Vec3::NEG_Y,
        Vec3::ONE,
        45.0,
        10.0,
    ));
    scene
}

fn spot_contribution(world: Vec3) -> Vec3 {
    let scene = spot_scene();
    let camera = overhead_camera();
    let layout = LightLayout::from_scene(&scene);
    let data = FrameData::gather(&camera, &scene, &layout, &RenderSettings::default());
    let spot = data.composite[1].unwrap();

    let surface = surface_at(camera.view(), world, Vec3::Y, &MaterialDesc::default());
    composite_cpu(surface, &spot)
}

#[test]
fn spotlight_reaches_points_inside_its_cone() {
    let below = spot_contribution(Vec3::ZERO);
    assert!(below.min_element() > 0.0);

    let near_edge = spot_contribution(Vec3::new(4.5, 0.0, 0.0));
    assert!(near_edge.min_element() > 0.0);
}

#[test]
fn spotlight_ignores_points_outside_its_cone() {
    // atan(6 / 5) is about 50 degrees, past the 45 degree half-angle.
    assert_eq!(spot_contribution(Vec3::new(6.0, 0.0, 0.0)), Vec3::ZERO);
}

#[test]
fn spotlight_ignores_points_beyond_its_range() {
    assert_eq!(spot_contribution(Vec3::new(0.0, -5.5, 0.0)), Vec3::ZERO);
}

#[test]
fn point_light_attenuates_with_distance() {
    let near = CompositeLightUniform::point(
        Vec3::ONE,
        Vec3::new(0.0, 2.0, -5.0),
        umbra::scene::Attenuation::new(1.0, 0.5, 0.0),
    );
    let material = MaterialDesc::default();
    let close = composite_cpu(surface_at(Mat4::IDENTITY, Vec3::new(0.0, 0.0, -5.0), Vec3::Y, &material), &near);
    let far = composite_cpu(surface_at(Mat4::IDENTITY, Vec3::new(0.0, -4.0, -5.0), Vec3::Y, &material), &near);
    assert!(close.x > far.x);
    assert!(far.x > 0.0);
}
