use glam::{Mat4, Vec3};

/// Capacity of the GPU light array. Index `i` in that array is the canonical
/// light ID; scene loading rejects configurations with more point lights.
pub const MAX_LIGHTS: usize = 1000;

/// Attributes every light kind carries: emitted color, a scalar strength
/// multiplier, the depth range of its shadow projection, and the resolution
/// of its shadow map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightCommon {
    pub color: Vec3,
    pub strength: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub shadow_resolution: u32,
}

impl Default for LightCommon {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            strength: 1.0,
            z_near: 1.0,
            z_far: 2000.0,
            shadow_resolution: 1024,
        }
    }
}

/// The single sun-style light. Its view looks from `distance` units along
/// the negated direction toward the origin, through an orthographic box of
/// half-extent `ortho_box_size`. The light-space matrix is recomputed every
/// frame so direction edits take effect immediately.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub common: LightCommon,
    pub direction: Vec3,
    pub distance: f32,
    pub ortho_box_size: f32,
}

impl DirectionalLight {
    pub fn new(direction: Vec3) -> Self {
        Self {
            common: LightCommon::default(),
            direction: direction.normalize_or_zero(),
            distance: 100.0,
            ortho_box_size: 100.0,
        }
    }

    pub fn light_view(&self) -> Mat4 {
        Mat4::look_at_rh(self.distance * -self.direction, Vec3::ZERO, Vec3::Y)
    }

    pub fn shadow_projection(&self) -> Mat4 {
        let s = self.ortho_box_size;
        Mat4::orthographic_rh(-s, s, -s, s, self.common.z_near, self.common.z_far)
    }

    pub fn light_space_matrix(&self) -> Mat4 {
        self.shadow_projection() * self.light_view()
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::splat(-1.0))
    }
}

/// An omnidirectional light with an attenuation range. Shadows render into
/// a depth cube map through six 90-degree views, one per face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub common: LightCommon,
    pub position: Vec3,
    pub range: f32,
}

impl PointLight {
    pub fn new(position: Vec3) -> Self {
        Self {
            common: LightCommon::default(),
            position,
            range: 65.0,
        }
    }

    /// Shared perspective projection for all six cube faces.
    pub fn shadow_projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_2,
            1.0,
            self.common.z_near,
            self.common.z_far,
        )
    }

    /// View matrices for the six cube faces in +X/-X/+Y/-Y/+Z/-Z order,
    /// with the cube-map up-vector convention.
    pub fn face_views(&self) -> [Mat4; 6] {
        let p = self.position;
        [
            Mat4::look_at_rh(p, p + Vec3::X, Vec3::NEG_Y),
            Mat4::look_at_rh(p, p + Vec3::NEG_X, Vec3::NEG_Y),
            Mat4::look_at_rh(p, p + Vec3::Y, Vec3::Z),
            Mat4::look_at_rh(p, p + Vec3::NEG_Y, Vec3::NEG_Z),
            Mat4::look_at_rh(p, p + Vec3::Z, Vec3::NEG_Y),
            Mat4::look_at_rh(p, p + Vec3::NEG_Z, Vec3::NEG_Y),
        ]
    }

    /// Combined projection-view matrix for one cube face.
    pub fn face_matrix(&self, face: usize) -> Mat4 {
        self.shadow_projection() * self.face_views()[face]
    }
}

/// A scene light. The two kinds are never substituted for one another;
/// every consumer matches and takes the dedicated path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
}

impl Light {
    pub fn common(&self) -> &LightCommon {
        match self {
            Light::Directional(light) => &light.common,
            Light::Point(light) => &light.common,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4Swizzles;

    #[test]
    fn directional_light_space_maps_origin_to_center() {
        let light = DirectionalLight {
            common: LightCommon {
                z_near: 1.0,
                z_far: 500.0,
                ..LightCommon::default()
            },
            direction: Vec3::new(1.0, -1.0, 0.5).normalize(),
            distance: 100.0,
            ortho_box_size: 50.0,
        };
        let clip = light.light_space_matrix() * Vec3::ZERO.extend(1.0);
        // The origin sits on the light's view axis: centered in x/y.
        assert!(clip.xy().length() < 1e-4);
        // 100 units in front of a [1, 500] ortho range lands inside [0, 1].
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn point_faces_look_along_each_axis() {
        let light = PointLight::new(Vec3::new(3.0, 4.0, 5.0));
        let axes = [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        for (view, axis) in light.face_views().iter().zip(axes) {
            // A point along the face axis must land in front of that face
            // (negative view-space z, centered in x/y).
            let probe = view.transform_point3(light.position + axis * 10.0);
            assert!(probe.z < 0.0);
            assert!(probe.x.abs() < 1e-4 && probe.y.abs() < 1e-4);
            assert!((probe.z + 10.0).abs() < 1e-3);
        }
    }

    #[test]
    fn light_variants_share_common_attributes() {
        let lights = [
            Light::Directional(DirectionalLight::default()),
            Light::Point(PointLight::new(Vec3::ONE)),
        ];
        for light in lights {
            assert_eq!(light.common().color, Vec3::ONE);
            assert!(light.common().z_far > light.common().z_near);
        }
    }

    #[test]
    fn face_matrix_keeps_projection_shared() {
        let light = PointLight::new(Vec3::ZERO);
        let proj = light.shadow_projection();
        // 90 degree FOV, aspect 1: the frustum edge slope is exactly 1.
        let edge = proj * glam::Vec4::new(1.0, 0.0, -1.0, 1.0);
        assert!((edge.x / edge.w - 1.0).abs() < 1e-4);
    }
}
