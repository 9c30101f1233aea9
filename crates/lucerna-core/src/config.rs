//! JSON scene descriptions.
//!
//! A scene file carries the camera, exactly one directional light, and an
//! array of point lights. Loading validates the result; a bad description
//! aborts startup with a message naming the problem rather than producing a
//! half-configured renderer.

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::light::{DirectionalLight, LightCommon, PointLight};
use crate::scene::SceneLights;
use glam::Vec3;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    #[serde(rename = "directionalLight")]
    pub directional_light: DirectionalLightConfig,
    #[serde(rename = "pointLights", default)]
    pub point_lights: Vec<PointLightConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub fov: f32,
    #[serde(rename = "nearPlane")]
    pub near_plane: f32,
    #[serde(rename = "farPlane")]
    pub far_plane: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionalLightConfig {
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub strength: f32,
    pub distance: f32,
    #[serde(rename = "orthoSize")]
    pub ortho_size: f32,
    #[serde(rename = "zNear")]
    pub z_near: f32,
    #[serde(rename = "zFar")]
    pub z_far: f32,
    #[serde(rename = "shadowRes")]
    pub shadow_res: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointLightConfig {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub strength: f32,
    #[serde(default = "default_range")]
    pub range: f32,
    #[serde(rename = "zNear")]
    pub z_near: f32,
    #[serde(rename = "zFar")]
    pub z_far: f32,
    #[serde(rename = "shadowRes")]
    pub shadow_res: u32,
}

fn default_range() -> f32 {
    65.0
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!("Loaded scene description from {}", path.as_ref().display());
        Self::from_json(&text)
    }

    /// Builds the validated runtime camera and light set.
    pub fn build(&self) -> Result<(Camera, SceneLights)> {
        let cam = &self.camera;
        if cam.near_plane <= 0.0 || cam.far_plane <= cam.near_plane {
            return Err(Error::InvalidConfiguration(format!(
                "camera depth range [{}, {}] is not a valid near/far pair",
                cam.near_plane, cam.far_plane
            )));
        }

        let mut camera = Camera::new_perspective(
            cam.fov.to_radians(),
            16.0 / 9.0,
            cam.near_plane,
            cam.far_plane,
        );
        camera.position = Vec3::from(cam.position);
        camera.look_at(Vec3::from(cam.target), Vec3::Y);

        let d = &self.directional_light;
        let directional = DirectionalLight {
            common: LightCommon {
                color: Vec3::from(d.color),
                strength: d.strength,
                z_near: d.z_near,
                z_far: d.z_far,
                shadow_resolution: d.shadow_res,
            },
            direction: Vec3::from(d.direction).normalize_or_zero(),
            distance: d.distance,
            ortho_box_size: d.ortho_size,
        };

        let points = self
            .point_lights
            .iter()
            .map(|p| PointLight {
                common: LightCommon {
                    color: Vec3::from(p.color),
                    strength: p.strength,
                    z_near: p.z_near,
                    z_far: p.z_far,
                    shadow_resolution: p.shadow_res,
                },
                position: Vec3::from(p.position),
                range: p.range,
            })
            .collect();

        let lights = SceneLights::new(directional, points)?;
        log::info!(
            "Scene description: {} point lights, directional shadow {}px",
            lights.points.len(),
            lights.directional.common.shadow_resolution
        );
        Ok((camera, lights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::MAX_LIGHTS;

    const SCENE: &str = r#"{
        "camera": {
            "fov": 60.0,
            "nearPlane": 0.1,
            "farPlane": 2000.0,
            "position": [0.0, 2.0, 10.0],
            "target": [0.0, 0.0, 0.0]
        },
        "directionalLight": {
            "direction": [-1.0, -1.0, 0.0],
            "color": [1.0, 0.9, 0.8],
            "strength": 5.0,
            "distance": 100.0,
            "orthoSize": 80.0,
            "zNear": 1.0,
            "zFar": 300.0,
            "shadowRes": 2048
        },
        "pointLights": [
            {
                "position": [4.0, 1.0, -2.0],
                "color": [1.0, 0.2, 0.1],
                "strength": 2.0,
                "zNear": 0.1,
                "zFar": 100.0,
                "shadowRes": 512
            }
        ]
    }"#;

    #[test]
    fn parses_and_builds_scene() {
        let config = SceneConfig::from_json(SCENE).unwrap();
        let (camera, lights) = config.build().unwrap();

        assert!((camera.fov_y - 60f32.to_radians()).abs() < 1e-6);
        assert_eq!(lights.points.len(), 1);
        assert_eq!(lights.points[0].range, 65.0);
        assert_eq!(lights.directional.common.shadow_resolution, 2048);
        assert!((lights.directional.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rejects_overfull_light_list() {
        let mut config = SceneConfig::from_json(SCENE).unwrap();
        let template = config.point_lights[0].clone();
        config.point_lights = vec![template; MAX_LIGHTS + 1];
        assert!(config.build().is_err());
    }

    #[test]
    fn rejects_inverted_depth_range() {
        let mut config = SceneConfig::from_json(SCENE).unwrap();
        config.camera.far_plane = 0.05;
        assert!(config.build().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(SceneConfig::from_json("{\"camera\": 3}").is_err());
    }
}
