//! GPU light records.
//!
//! The scene's point lights are repacked into this array every frame; it is
//! the only light representation the culling and shading stages see. The
//! index of a light here is its canonical ID everywhere downstream.

use bytemuck::{Pod, Zeroable};
use lucerna_core::PointLight;

/// Packed point light, 48 bytes, matching the WGSL `GpuLight` struct.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// World position, w = 1.
    pub position: [f32; 4],
    /// Linear color, w = 1.
    pub color: [f32; 4],
    pub enabled: u32,
    pub intensity: f32,
    /// Attenuation range; also the culling sphere radius.
    pub range: f32,
    pub _pad: u32,
}

impl GpuLight {
    pub fn from_point_light(light: &PointLight) -> Self {
        Self {
            position: [light.position.x, light.position.y, light.position.z, 1.0],
            color: [
                light.common.color.x,
                light.common.color.y,
                light.common.color.z,
                1.0,
            ],
            enabled: 1,
            intensity: light.common.strength,
            range: light.range,
            _pad: 0,
        }
    }
}

/// Maps scene point lights to GPU lights at the same indices. The caller
/// has already validated the count at scene load; this is the per-frame
/// refresh and never fails.
pub fn pack_lights(lights: &[PointLight]) -> Vec<GpuLight> {
    lights.iter().map(GpuLight::from_point_light).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::mem::{offset_of, size_of};

    #[test]
    fn layout_matches_shader_struct() {
        assert_eq!(size_of::<GpuLight>(), 48);
        assert_eq!(offset_of!(GpuLight, position), 0);
        assert_eq!(offset_of!(GpuLight, color), 16);
        assert_eq!(offset_of!(GpuLight, enabled), 32);
        assert_eq!(offset_of!(GpuLight, intensity), 36);
        assert_eq!(offset_of!(GpuLight, range), 40);
    }

    #[test]
    fn packing_preserves_index_and_fields() {
        let mut a = PointLight::new(Vec3::new(1.0, 2.0, 3.0));
        a.common.strength = 4.0;
        a.range = 30.0;
        let b = PointLight::new(Vec3::new(-5.0, 0.0, 9.0));

        let packed = pack_lights(&[a, b]);
        assert_eq!(packed.len(), 2);
        assert_eq!(packed[0].position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(packed[0].intensity, 4.0);
        assert_eq!(packed[0].range, 30.0);
        assert_eq!(packed[1].position, [-5.0, 0.0, 9.0, 1.0]);
        // Default range policy, overridable per light.
        assert_eq!(packed[1].range, 65.0);
        assert!(packed.iter().all(|l| l.enabled == 1));
    }
}
