use glam::Vec3;
use umbra::scene::primitives::{cube, plane};
use umbra::scene::{
    Attenuation, Camera, DirectionalLight, MaterialDesc, PointLight, Scene, SpotLight, Transform,
};

#[derive(Clone, Copy, Debug)]
pub enum DemoScene {
    /// Ground plane and a row of cubes lit by the sun only.
    SunOnly,
    /// Adds a spotlight and two coloured point lights.
    ShadowTest,
}

impl DemoScene {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sun" => Some(DemoScene::SunOnly),
            "shadows" => Some(DemoScene::ShadowTest),
            _ => None,
        }
    }

    pub fn build(self, aspect: f32) -> (Camera, Scene) {
        let camera = Camera::new(45.0, aspect, 0.5, 200.0)
            .looking_at(Vec3::new(8.0, 7.0, 12.0), Vec3::new(0.0, 0.5, 0.0));

        let mut scene = Scene::new(DirectionalLight::new(
            Vec3::new(-0.4, -1.0, -0.3),
            Vec3::new(1.0, 0.95, 0.85),
            0.15,
        ));

        let ground = scene.intern_model(plane(
            "demo/ground",
            10.0,
            MaterialDesc {
                diffuse: Vec3::splat(0.7),
                ..MaterialDesc::default()
            },
        ));
        scene.add_model(ground, Transform::default());

        let block = scene.intern_model(cube(
            "demo/block",
            0.5,
            MaterialDesc {
                diffuse: Vec3::new(0.8, 0.3, 0.2),
                specular: Vec3::splat(0.5),
                shininess: 32.0,
                ..MaterialDesc::default()
            },
        ));
        for (i, x) in [-3.0f32, 0.0, 3.0].into_iter().enumerate() {
            let transform = Transform::new(
                Vec3::new(x, 0.5 + i as f32 * 0.5, 0.0),
                Vec3::new(0.0, 0.0, 30.0 * i as f32),
                Vec3::splat(1.0 + i as f32 * 0.5),
            );
            scene.add_model(block.clone(), transform);
        }

        if let DemoScene::ShadowTest = self {
            scene.add_spotlight(
                SpotLight::new(
                    Vec3::new(0.0, 6.0, 3.0),
                    Vec3::new(0.0, -1.0, -0.4),
                    Vec3::new(0.9, 0.9, 1.0),
                    30.0,
                    20.0,
                )
                .with_exponent(4.0)
                .with_attenuation(Attenuation::new(1.0, 0.05, 0.0)),
            );
            scene.add_pointlight(PointLight::new(
                Vec3::new(-4.0, 1.5, 3.0),
                Vec3::new(0.2, 0.4, 1.0),
                Attenuation::new(1.0, 0.2, 0.05),
            ));
            scene.add_pointlight(PointLight::new(
                Vec3::new(4.0, 1.5, -2.0),
                Vec3::new(1.0, 0.6, 0.1),
                Attenuation::new(1.0, 0.2, 0.05),
            ));
        }

        (camera, scene)
    }
}
