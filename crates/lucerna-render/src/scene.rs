//! Scene database – the authoritative source for all rendered content

use crate::mesh::GpuMesh;
use lucerna_core::{DirectionalLight, PointLight};

/// A single renderable object in the scene
#[derive(Clone)]
pub struct SceneObject {
    pub mesh: GpuMesh,
}

impl SceneObject {
    pub fn new(mesh: GpuMesh) -> Self {
        Self { mesh }
    }
}

/// The scene database – defines all rendered content.
///
/// Point-light order matters: a light's index here is its identity in the
/// GPU light array and in every cluster's light index list.
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub directional_light: DirectionalLight,
    pub point_lights: Vec<PointLight>,
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    /// Background/sky clear color. Default is black.
    pub sky_color: [f32; 3],
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            directional_light: DirectionalLight::default(),
            point_lights: Vec::new(),
            ambient_color: [0.0, 0.0, 0.0],
            ambient_intensity: 0.0,
            sky_color: [0.0, 0.0, 0.0],
        }
    }

    pub fn with_sky(mut self, color: [f32; 3]) -> Self {
        self.sky_color = color;
        self
    }

    pub fn with_directional_light(mut self, light: DirectionalLight) -> Self {
        self.directional_light = light;
        self
    }

    pub fn with_ambient(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.ambient_color = color;
        self.ambient_intensity = intensity;
        self
    }

    pub fn add_object(mut self, mesh: GpuMesh) -> Self {
        self.objects.push(SceneObject::new(mesh));
        self
    }

    pub fn add_point_light(mut self, light: PointLight) -> Self {
        self.point_lights.push(light);
        self
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
