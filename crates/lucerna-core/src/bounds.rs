use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);

        for &point in points {
            min = min.min(point);
            max = max.max(point);
        }

        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Squared distance from `point` to the closest point on the box
    /// (zero when the point is inside).
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        let closest = point.clamp(self.min, self.max);
        closest.distance_squared(point)
    }

    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.distance_squared_to_point(sphere.center) <= sphere.radius * sphere.radius
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_aabb_overlap() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));

        // Center inside
        assert!(aabb.intersects_sphere(&Sphere::new(Vec3::ZERO, 0.1)));
        // Touching a face
        assert!(aabb.intersects_sphere(&Sphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0)));
        // Clearly apart
        assert!(!aabb.intersects_sphere(&Sphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0)));
        // Near a corner: center at (2,2,2), corner at (1,1,1), distance sqrt(3)
        assert!(aabb.intersects_sphere(&Sphere::new(Vec3::splat(2.0), 1.8)));
        assert!(!aabb.intersects_sphere(&Sphere::new(Vec3::splat(2.0), 1.7)));
    }

    #[test]
    fn distance_to_point_is_zero_inside() {
        let aabb = Aabb::new(Vec3::splat(-2.0), Vec3::splat(2.0));
        assert_eq!(aabb.distance_squared_to_point(Vec3::new(1.0, -1.0, 0.5)), 0.0);
        assert_eq!(aabb.distance_squared_to_point(Vec3::new(3.0, 0.0, 0.0)), 1.0);
    }
}
