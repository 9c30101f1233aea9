use glam::{Mat4, Quat, Vec3};

/// Perspective camera. Position and rotation change freely every frame;
/// the projection parameters are tracked separately because the clustered
/// lighting state must be rebuilt whenever they change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Camera {
    pub fn new_perspective(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y,
            aspect_ratio,
            near_plane: near,
            far_plane: far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near_plane, self.far_plane)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);
        let mat3 = glam::Mat3::from_cols(right, up, -forward);
        self.rotation = Quat::from_mat3(&mat3);
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Snapshot of the parameters the projection matrix is built from.
    pub fn projection_params(&self) -> ProjectionParams {
        ProjectionParams {
            fov_y: self.fov_y,
            aspect_ratio: self.aspect_ratio,
            near_plane: self.near_plane,
            far_plane: self.far_plane,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 1000.0)
    }
}

/// The projection-defining subset of [`Camera`]. The renderer compares
/// snapshots of this to decide when the cluster grid and screen-to-view
/// constants are stale; translation and rotation never invalidate them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionParams {
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_points_forward_at_target() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera.look_at(Vec3::ZERO, Vec3::Y);
        let forward = camera.forward();
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn projection_params_ignore_pose() {
        let mut a = Camera::default();
        let b = a.projection_params();
        a.position = Vec3::new(10.0, -3.0, 2.0);
        a.look_at(Vec3::ZERO, Vec3::Y);
        assert_eq!(a.projection_params(), b);

        a.fov_y += 0.1;
        assert_ne!(a.projection_params(), b);
    }
}
