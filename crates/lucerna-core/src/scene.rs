use crate::error::{Error, Result};
use crate::light::{DirectionalLight, Light, PointLight, MAX_LIGHTS};

/// The lights a scene feeds the renderer: exactly one directional light and
/// an ordered list of point lights. The list order is significant – each
/// point light's index is its identity in the GPU light array and the
/// light-index lists built by culling.
#[derive(Clone, Debug)]
pub struct SceneLights {
    pub directional: DirectionalLight,
    pub points: Vec<PointLight>,
}

impl SceneLights {
    /// Validates the light set at load time. Exceeding [`MAX_LIGHTS`] or a
    /// malformed light is a configuration error, not a per-frame condition.
    pub fn new(directional: DirectionalLight, points: Vec<PointLight>) -> Result<Self> {
        if points.len() > MAX_LIGHTS {
            return Err(Error::InvalidConfiguration(format!(
                "scene has {} point lights, capacity is {}",
                points.len(),
                MAX_LIGHTS
            )));
        }

        let lights = Self {
            directional,
            points,
        };
        for (slot, light) in lights.iter().enumerate() {
            let name = match light {
                Light::Directional(_) => "directional light".to_string(),
                Light::Point(_) => format!("point light {}", slot - 1),
            };
            let common = light.common();
            if common.z_near <= 0.0 || common.z_far <= common.z_near {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} has shadow depth range [{}, {}]",
                    common.z_near, common.z_far
                )));
            }
            if common.shadow_resolution == 0 {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} has zero shadow resolution"
                )));
            }
        }
        Ok(lights)
    }

    /// All lights, directional first, then points in index order.
    pub fn iter(&self) -> impl Iterator<Item = Light> + '_ {
        std::iter::once(Light::Directional(self.directional))
            .chain(self.points.iter().copied().map(Light::Point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn rejects_light_overflow_at_load() {
        let points = vec![PointLight::new(Vec3::ZERO); MAX_LIGHTS + 1];
        let err = SceneLights::new(DirectionalLight::default(), points).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn accepts_exact_capacity() {
        let points = vec![PointLight::new(Vec3::ZERO); MAX_LIGHTS];
        assert!(SceneLights::new(DirectionalLight::default(), points).is_ok());
    }

    #[test]
    fn rejects_malformed_light_at_load() {
        let mut inverted = PointLight::new(Vec3::ZERO);
        inverted.common.z_far = inverted.common.z_near;
        let err = SceneLights::new(DirectionalLight::default(), vec![inverted]).unwrap_err();
        assert!(err.to_string().contains("point light 0"));

        let mut unresolved = DirectionalLight::default();
        unresolved.common.shadow_resolution = 0;
        let err = SceneLights::new(unresolved, Vec::new()).unwrap_err();
        assert!(err.to_string().contains("directional light"));
    }

    #[test]
    fn iter_yields_directional_first() {
        let lights = SceneLights::new(
            DirectionalLight::default(),
            vec![PointLight::new(Vec3::X), PointLight::new(Vec3::Y)],
        )
        .unwrap();
        let collected: Vec<Light> = lights.iter().collect();
        assert_eq!(collected.len(), 3);
        assert!(matches!(collected[0], Light::Directional(_)));
        assert!(matches!(collected[1], Light::Point(p) if p.position == Vec3::X));
    }
}
