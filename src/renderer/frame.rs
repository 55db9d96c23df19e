// renderer/frame.rs
//
// CPU side of a frame: every uniform value the stages consume, computed from
// the camera and scene before anything is recorded.

use glam::Mat4;

use crate::renderer::lights::{LightKind, LightLayout};
use crate::renderer::shadows;
use crate::renderer::uniforms::{
    CompositeLightUniform, FrameUniform, IrradianceLightUniform, ObjectUniform, ShadowViewUniform,
};
use crate::scene::{Camera, Scene};
use crate::settings::RenderSettings;

/// Uniform data for one frame, indexed by instance and by light slot.
///
/// A light slot whose scene light no longer exists holds `None` and is
/// skipped by every stage.
pub struct FrameData {
    pub frame: FrameUniform,
    pub objects: Vec<ObjectUniform>,
    pub shadow_views: Vec<Option<ShadowViewUniform>>,
    pub irradiance: Vec<Option<IrradianceLightUniform>>,
    pub composite: Vec<Option<CompositeLightUniform>>,
}

impl FrameData {
    pub fn gather(camera: &Camera, scene: &Scene, layout: &LightLayout, settings: &RenderSettings) -> Self {
        let view = camera.view();
        let objects = scene
            .models()
            .iter()
            .map(|instance| ObjectUniform::new(instance.transform.matrix(), view))
            .collect();

        let mut shadow_views = Vec::with_capacity(layout.shadow_casters());
        let mut irradiance = Vec::with_capacity(layout.total());
        let mut composite = Vec::with_capacity(layout.total());

        for slot in layout.slots() {
            let Some(kind) = layout.kind(slot) else {
                continue;
            };
            let light_vp = light_view_proj(kind, slot, scene, settings);
            if kind.casts_shadow() {
                shadow_views.push(light_vp.map(|view_proj| ShadowViewUniform {
                    view_proj: view_proj.to_cols_array_2d(),
                }));
            }
            let bias = settings.shadow_depth_bias;

            let (irr, comp) = match kind {
                LightKind::Sun => {
                    let sun = scene.sunlight();
                    let direction = view.transform_vector3(sun.direction);
                    let shadow = shadows::shadow_matrix(light_vp.unwrap_or(Mat4::IDENTITY));
                    (
                        Some(IrradianceLightUniform::directional(direction, shadow, bias)),
                        Some(CompositeLightUniform::sun(sun.color, sun.ambient, direction)),
                    )
                }
                LightKind::Spot => match scene.spotlights().get(slot - 1) {
                    Some(spot) => {
                        let position = view.transform_point3(spot.position);
                        let direction = view.transform_vector3(spot.direction);
                        (
                            Some(IrradianceLightUniform::positional(
                                kind,
                                position,
                                light_vp.map(shadows::shadow_matrix),
                                bias,
                            )),
                            Some(CompositeLightUniform::spot(
                                spot.color,
                                position,
                                direction,
                                spot.cos_cutoff(),
                                spot.exponent,
                                spot.attenuation,
                                spot.length,
                            )),
                        )
                    }
                    None => (None, None),
                },
                LightKind::Point => {
                    match scene.pointlights().get(slot - 1 - layout.spots) {
                        Some(point) => {
                            let position = view.transform_point3(point.position);
                            (
                                Some(IrradianceLightUniform::positional(kind, position, None, bias)),
                                Some(CompositeLightUniform::point(point.color, position, point.attenuation)),
                            )
                        }
                        None => (None, None),
                    }
                }
            };
            irradiance.push(irr);
            composite.push(comp);
        }

        Self {
            frame: FrameUniform::new(view, camera.projection()),
            objects,
            shadow_views,
            irradiance,
            composite,
        }
    }

    /// Whether the light in `slot` takes part in this frame.
    pub fn is_active(&self, slot: usize) -> bool {
        self.composite.get(slot).is_some_and(Option::is_some)
    }

    pub fn active_lights(&self) -> usize {
        self.composite.iter().flatten().count()
    }
}

fn light_view_proj(kind: LightKind, slot: usize, scene: &Scene, settings: &RenderSettings) -> Option<Mat4> {
    match kind {
        LightKind::Sun => Some(shadows::directional_view_proj(
            scene.sunlight(),
            settings.sun_shadow_extent,
            settings.sun_shadow_distance,
        )),
        LightKind::Spot => scene.spotlights().get(slot - 1).map(shadows::spot_view_proj),
        LightKind::Point => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Attenuation, DirectionalLight, PointLight, SpotLight};
    use glam::Vec3;

    fn lit_scene() -> Scene {
        let mut scene = Scene::new(DirectionalLight::new(Vec3::NEG_Y, Vec3::ONE, 0.2));
        scene.add_spotlight(SpotLight::new(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::NEG_Y,
            Vec3::ONE,
            45.0,
            10.0,
        ));
        scene.add_pointlight(PointLight::new(Vec3::new(2.0, 1.0, 0.0), Vec3::ONE, Attenuation::NONE));
        scene
    }

    #[test]
    fn every_slot_is_filled_for_a_matching_scene() {
        let scene = lit_scene();
        let layout = LightLayout::from_scene(&scene);
        let data = FrameData::gather(&Camera::default(), &scene, &layout, &RenderSettings::default());

        assert_eq!(data.shadow_views.len(), layout.shadow_casters());
        assert_eq!(data.irradiance.len(), layout.total());
        assert_eq!(data.active_lights(), 3);
        assert!(data.shadow_views.iter().all(Option::is_some));
        // Point lights are never shadowed.
        assert_eq!(data.irradiance[2].map(|light| light.params[1]), Some(0.0));
    }

    #[test]
    fn only_the_sun_slot_carries_ambient() {
        let scene = lit_scene();
        let layout = LightLayout::from_scene(&scene);
        let data = FrameData::gather(&Camera::default(), &scene, &layout, &RenderSettings::default());

        let ambient: Vec<f32> = data.composite.iter().flatten().map(|light| light.color[3]).collect();
        assert_eq!(ambient, vec![0.2, 0.0, 0.0]);
    }

    #[test]
    fn removed_lights_leave_inactive_slots() {
        let scene = lit_scene();
        let layout = LightLayout::from_scene(&scene);
        let mut smaller = Scene::new(*scene.sunlight());
        smaller.add_spotlight(scene.spotlights()[0]);

        let data = FrameData::gather(&Camera::default(), &smaller, &layout, &RenderSettings::default());
        assert!(data.is_active(0));
        assert!(data.is_active(1));
        assert!(!data.is_active(2));
        assert!(!data.is_active(7));
    }

    #[test]
    fn sun_direction_is_expressed_in_view_space() {
        let scene = lit_scene();
        let layout = LightLayout::from_scene(&scene);
        let camera = Camera::default().looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let data = FrameData::gather(&camera, &scene, &layout, &RenderSettings::default());

        let direction = data.irradiance[0].map(|light| light.vector);
        let expected = camera.view().transform_vector3(Vec3::NEG_Y);
        let direction = direction.unwrap_or_default();
        assert!((Vec3::new(direction[0], direction[1], direction[2]) - expected).length() < 1e-5);
        assert_eq!(direction[3], 0.0);
    }
}
