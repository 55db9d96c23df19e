// renderer/lights.rs
//
// Light slots: the sun is slot 0, spotlights follow, point lights come last.
// Shadow casters are exactly the sun and the spotlights.

use crate::scene::Scene;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Sun,
    Spot,
    Point,
}

impl LightKind {
    pub fn casts_shadow(self) -> bool {
        !matches!(self, LightKind::Point)
    }

    /// Tag consumed by the irradiance and composite shaders.
    pub fn shader_tag(self) -> u32 {
        match self {
            LightKind::Sun => 0,
            LightKind::Spot => 1,
            LightKind::Point => 2,
        }
    }
}

/// Light counts captured at initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightLayout {
    pub spots: usize,
    pub points: usize,
}

impl LightLayout {
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            spots: scene.spotlights().len(),
            points: scene.pointlights().len(),
        }
    }

    pub fn total(&self) -> usize {
        1 + self.spots + self.points
    }

    pub fn shadow_casters(&self) -> usize {
        1 + self.spots
    }

    pub fn kind(&self, slot: usize) -> Option<LightKind> {
        if slot == 0 {
            Some(LightKind::Sun)
        } else if slot <= self.spots {
            Some(LightKind::Spot)
        } else if slot < self.total() {
            Some(LightKind::Point)
        } else {
            None
        }
    }

    /// Index into the shadow map list for a light slot, if it casts shadows.
    pub fn shadow_index(&self, slot: usize) -> Option<usize> {
        (slot < self.shadow_casters()).then_some(slot)
    }

    pub fn slots(&self) -> std::ops::Range<usize> {
        0..self.total()
    }

    /// True when the scene still has the light counts this layout was built for.
    pub fn matches(&self, scene: &Scene) -> bool {
        *self == Self::from_scene(scene)
    }
}

/// Resources allocated once per light slot. The length never changes after
/// construction.
#[derive(Debug)]
pub struct PerLight<T> {
    items: Vec<T>,
}

impl<T> PerLight<T> {
    pub fn allocate(count: usize, make: impl FnMut(usize) -> T) -> Self {
        Self {
            items: (0..count).map(make).collect(),
        }
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.items.get(slot)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}
