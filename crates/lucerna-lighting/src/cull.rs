//! Reference light culler.
//!
//! Sequential implementation of the cluster/light assignment the GPU
//! compute pass performs: every enabled light's influence sphere, taken
//! into view space, is tested against every cluster's view-space AABB, and
//! each cluster receives a compacted index list capped at the per-cluster
//! budget. The GPU pass allocates list ranges with an atomic counter and
//! may order indices differently within a cluster; shading treats them as
//! an unordered set, so the two implementations are interchangeable.

use crate::grid::ClusterAabb;
use crate::store::GpuLight;
use glam::{Mat4, Vec3, Vec4};
use lucerna_core::Sphere;

/// Per-cluster view into the light index list.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LightGridCell {
    pub offset: u32,
    pub count: u32,
}

/// Output of one culling pass.
#[derive(Clone, Debug)]
pub struct CullResults {
    /// One (offset, count) cell per cluster, in linear-index order.
    pub grid: Vec<LightGridCell>,
    /// Compacted light indices; cell ranges never overlap.
    pub indices: Vec<u32>,
}

impl CullResults {
    /// The light indices assigned to one cluster.
    pub fn lights_for_cluster(&self, cluster: u32) -> &[u32] {
        let cell = &self.grid[cluster as usize];
        &self.indices[cell.offset as usize..(cell.offset + cell.count) as usize]
    }
}

/// Assigns lights to clusters for one view matrix.
///
/// Light positions are transformed into view space once, up front, and
/// shared across all cluster tests. A cluster intersecting more than
/// `max_per_cluster` lights keeps the first ones found and silently drops
/// the rest; that loss is the documented degradation mode, not an error.
/// Zero enabled lights produces all-zero cells.
pub fn cull_lights(
    aabbs: &[ClusterAabb],
    lights: &[GpuLight],
    view: Mat4,
    max_per_cluster: usize,
) -> CullResults {
    // One view-space transform per light, not per cluster-light pair.
    let spheres: Vec<Option<Sphere>> = lights
        .iter()
        .map(|light| {
            (light.enabled != 0).then(|| {
                let [x, y, z, _] = light.position;
                let view_pos = view * Vec4::new(x, y, z, 1.0);
                Sphere::new(Vec3::new(view_pos.x, view_pos.y, view_pos.z), light.range)
            })
        })
        .collect();

    let mut grid = Vec::with_capacity(aabbs.len());
    let mut indices = Vec::new();

    for cluster in aabbs {
        let bounds = cluster.to_aabb();
        let offset = indices.len() as u32;
        let mut count = 0u32;

        for (index, sphere) in spheres.iter().enumerate() {
            let Some(sphere) = sphere else { continue };
            if count as usize >= max_per_cluster {
                break;
            }
            if bounds.intersects_sphere(sphere) {
                indices.push(index as u32);
                count += 1;
            }
        }

        grid.push(LightGridCell { offset, count });
    }

    CullResults { grid, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ClusterGrid;
    use crate::screen_to_view::ScreenToView;
    use crate::store::pack_lights;
    use crate::{GRID_SIZE, MAX_LIGHTS_PER_CLUSTER};
    use lucerna_core::PointLight;

    const WIDTH: u32 = 1280;
    const HEIGHT: u32 = 720;

    struct Fixture {
        grid: ClusterGrid,
        constants: ScreenToView,
        aabbs: Vec<ClusterAabb>,
    }

    /// Default grid over a 1280x720 screen with a [0.1, 2000] depth range.
    fn fixture() -> Fixture {
        let grid = ClusterGrid::new(GRID_SIZE, WIDTH, HEIGHT, 0.1, 2000.0);
        let projection = Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_3,
            WIDTH as f32 / HEIGHT as f32,
            grid.z_near,
            grid.z_far,
        );
        let aabbs = grid.build_aabbs(projection.inverse());
        let constants = ScreenToView::new(&grid, projection);
        Fixture {
            grid,
            constants,
            aabbs,
        }
    }

    fn clusters_containing(results: &CullResults, light: u32) -> Vec<u32> {
        (0..results.grid.len() as u32)
            .filter(|&c| results.lights_for_cluster(c).contains(&light))
            .collect()
    }

    #[test]
    fn light_on_the_forward_axis_lands_in_its_cluster() {
        let f = fixture();
        // Camera at the origin looking down -z; light 20 units ahead with
        // range 65, i.e. at the camera's look-at target.
        let light = PointLight::new(Vec3::new(0.0, 0.0, -20.0));
        let lights = pack_lights(&[light]);
        let results = cull_lights(&f.aabbs, &lights, Mat4::IDENTITY, usize::MAX);

        // The cluster holding the forward axis at that depth: center pixel,
        // slice from the log formula.
        let slice = f.constants.slice_for_depth(20.0);
        let center = f
            .grid
            .linear_index(GRID_SIZE.x / 2, GRID_SIZE.y / 2, slice);
        assert!(results.lights_for_cluster(center).contains(&0));
    }

    #[test]
    fn no_false_negatives_against_brute_force() {
        let f = fixture();
        let lights = pack_lights(&[
            PointLight::new(Vec3::new(0.0, 0.0, -20.0)),
            {
                let mut l = PointLight::new(Vec3::new(-40.0, 10.0, -300.0));
                l.range = 25.0;
                l
            },
            {
                let mut l = PointLight::new(Vec3::new(200.0, -50.0, -900.0));
                l.range = 120.0;
                l
            },
        ]);
        let results = cull_lights(&f.aabbs, &lights, Mat4::IDENTITY, usize::MAX);

        for (cluster, aabb) in f.aabbs.iter().enumerate() {
            let bounds = aabb.to_aabb();
            for (index, light) in lights.iter().enumerate() {
                let sphere = Sphere::new(
                    Vec3::new(light.position[0], light.position[1], light.position[2]),
                    light.range,
                );
                if bounds.intersects_sphere(&sphere) {
                    assert!(
                        results.lights_for_cluster(cluster as u32).contains(&(index as u32)),
                        "light {index} missing from cluster {cluster}"
                    );
                }
            }
        }
    }

    #[test]
    fn zero_lights_yields_zero_counts() {
        let f = fixture();
        let results = cull_lights(&f.aabbs, &[], Mat4::IDENTITY, usize::MAX);
        assert!(results.grid.iter().all(|cell| cell.count == 0));
        assert!(results.indices.is_empty());
    }

    #[test]
    fn culling_is_idempotent() {
        let f = fixture();
        let lights = pack_lights(&[
            PointLight::new(Vec3::new(5.0, 1.0, -50.0)),
            PointLight::new(Vec3::new(-30.0, -4.0, -400.0)),
        ]);
        let view = Mat4::look_at_rh(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y);

        let a = cull_lights(&f.aabbs, &lights, view, MAX_LIGHTS_PER_CLUSTER as usize);
        let b = cull_lights(&f.aabbs, &lights, view, MAX_LIGHTS_PER_CLUSTER as usize);
        let counts_a: Vec<u32> = a.grid.iter().map(|c| c.count).collect();
        let counts_b: Vec<u32> = b.grid.iter().map(|c| c.count).collect();
        assert_eq!(counts_a, counts_b);
    }

    #[test]
    fn moving_one_light_does_not_disturb_another() {
        let f = fixture();
        let moving = PointLight::new(Vec3::new(0.0, 0.0, -30.0));
        let stationary = {
            let mut l = PointLight::new(Vec3::new(300.0, 0.0, -1200.0));
            l.range = 80.0;
            l
        };

        let before = cull_lights(
            &f.aabbs,
            &pack_lights(&[moving, stationary]),
            Mat4::IDENTITY,
            usize::MAX,
        );
        let mut moved = moving;
        moved.position = Vec3::new(-60.0, 20.0, -500.0);
        let after = cull_lights(
            &f.aabbs,
            &pack_lights(&[moved, stationary]),
            Mat4::IDENTITY,
            usize::MAX,
        );

        assert_ne!(clusters_containing(&before, 0), clusters_containing(&after, 0));
        assert_eq!(clusters_containing(&before, 1), clusters_containing(&after, 1));
    }

    #[test]
    fn overflowing_clusters_truncate_silently() {
        let f = fixture();
        // Pile more lights onto one spot than a cluster may hold.
        let crowd: Vec<PointLight> = (0..60)
            .map(|i| {
                let mut l = PointLight::new(Vec3::new(0.0, 0.0, -20.0 - i as f32 * 0.01));
                l.range = 10.0;
                l
            })
            .collect();
        let results = cull_lights(
            &f.aabbs,
            &pack_lights(&crowd),
            Mat4::IDENTITY,
            MAX_LIGHTS_PER_CLUSTER as usize,
        );
        let max_count = results.grid.iter().map(|c| c.count).max().unwrap();
        assert_eq!(max_count, MAX_LIGHTS_PER_CLUSTER);
    }

    #[test]
    fn disabled_lights_are_ignored() {
        let f = fixture();
        let mut lights = pack_lights(&[PointLight::new(Vec3::new(0.0, 0.0, -20.0))]);
        lights[0].enabled = 0;
        let results = cull_lights(&f.aabbs, &lights, Mat4::IDENTITY, usize::MAX);
        assert!(results.grid.iter().all(|cell| cell.count == 0));
    }
}
