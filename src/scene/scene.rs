// scene/scene.rs
use std::collections::HashMap;
use std::sync::Arc;

use crate::scene::{DirectionalLight, Model, PointLight, SpotLight, Transform};

/// One placement of a shared model.
#[derive(Clone, Debug)]
pub struct StaticModel {
    pub model: Arc<Model>,
    pub transform: Transform,
}

impl StaticModel {
    pub fn new(model: Arc<Model>, transform: Transform) -> Self {
        Self { model, transform }
    }

    pub fn model_name(&self) -> &str {
        &self.model.name
    }
}

/// A loaded scene: instances, the sun and the spot/point light lists.
///
/// The renderer snapshots the light counts at initialization and reads the
/// scene immutably every frame.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    models: HashMap<String, Arc<Model>>,
    instances: Vec<StaticModel>,
    sunlight: DirectionalLight,
    spotlights: Vec<SpotLight>,
    pointlights: Vec<PointLight>,
}

impl Scene {
    pub fn new(sunlight: DirectionalLight) -> Self {
        Self {
            sunlight,
            ..Self::default()
        }
    }

    /// Keeps one copy of each model file; a second model with the same
    /// name resolves to the first.
    pub fn intern_model(&mut self, model: Model) -> Arc<Model> {
        if let Some(existing) = self.models.get(&model.name) {
            log::debug!("Model {} already loaded, sharing it", model.name);
            return Arc::clone(existing);
        }
        let name = model.name.clone();
        let shared = Arc::new(model);
        self.models.insert(name, Arc::clone(&shared));
        shared
    }

    pub fn add_model(&mut self, model: Arc<Model>, transform: Transform) {
        if !self.models.contains_key(&model.name) {
            self.models.insert(model.name.clone(), Arc::clone(&model));
        }
        self.instances.push(StaticModel::new(model, transform));
    }

    pub fn add_spotlight(&mut self, light: SpotLight) {
        self.spotlights.push(light);
    }

    pub fn add_pointlight(&mut self, light: PointLight) {
        self.pointlights.push(light);
    }

    pub fn set_sunlight(&mut self, light: DirectionalLight) {
        self.sunlight = light;
    }

    pub fn models(&self) -> &[StaticModel] {
        &self.instances
    }

    pub fn model(&self, name: &str) -> Option<&Arc<Model>> {
        self.models.get(name)
    }

    pub fn unique_model_count(&self) -> usize {
        self.models.len()
    }

    pub fn sunlight(&self) -> &DirectionalLight {
        &self.sunlight
    }

    pub fn spotlights(&self) -> &[SpotLight] {
        &self.spotlights
    }

    pub fn pointlights(&self) -> &[PointLight] {
        &self.pointlights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn interning_shares_models_by_name() {
        let mut scene = Scene::default();
        let a = scene.intern_model(Model::new("cube.obj"));
        let b = scene.intern_model(Model::new("cube.obj"));
        let c = scene.intern_model(Model::new("plane.obj"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(scene.unique_model_count(), 2);
    }

    #[test]
    fn instances_keep_insertion_order() {
        let mut scene = Scene::default();
        let cube = scene.intern_model(Model::new("cube.obj"));
        let plane = scene.intern_model(Model::new("plane.obj"));
        scene.add_model(Arc::clone(&plane), Transform::default());
        scene.add_model(Arc::clone(&cube), Transform::new(Vec3::X, Vec3::ZERO, Vec3::ONE));
        scene.add_model(cube, Transform::default());

        let names: Vec<&str> = scene.models().iter().map(|m| m.model_name()).collect();
        assert_eq!(names, ["plane.obj", "cube.obj", "cube.obj"]);
    }
}
