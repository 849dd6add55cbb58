use bevy_math::{Quat, Vec3};

use crate::constants::PHYSICS_EPSILON;

/// Result of a ray test: distance along the (unit) ray and the surface normal at entry.
#[derive(Debug, Clone, Copy)]
pub struct Collision {
    pub normal: Vec3,
    pub t: f32,
}

// Compute the intersection interval of a ray with a slab (used in ray-AABB tests)
#[must_use]
pub fn sweep_slab_interval(
    local_coord: f32,
    ray_dir: f32,
    half_extent: f32,
    t_min: f32,
    t_max: f32,
) -> Option<(f32, f32)> {
    if ray_dir.abs() > PHYSICS_EPSILON {
        let t1 = (-half_extent - local_coord) / ray_dir;
        let t2 = (half_extent - local_coord) / ray_dir;
        let new_min = t_min.max(t1.min(t2));
        let new_max = t_max.min(t1.max(t2));
        if new_min <= new_max {
            Some((new_min, new_max))
        } else {
            None
        }
    } else if local_coord.abs() > half_extent {
        None
    } else {
        Some((t_min, t_max))
    }
}

// Whether a point lies inside (or on) an axis-aligned box
#[must_use]
pub fn point_inside_cuboid(point: Vec3, center: Vec3, half: Vec3) -> bool {
    let local = (point - center).abs();
    local.x <= half.x && local.y <= half.y && local.z <= half.z
}

/// Ray vs axis-aligned cuboid within `[0, max_distance]`. `dir` must be normalized.
/// A ray that starts inside the cuboid never reports it.
#[must_use]
pub fn ray_vs_cuboid(origin: Vec3, dir: Vec3, max_distance: f32, center: Vec3, half: Vec3) -> Option<Collision> {
    if point_inside_cuboid(origin, center, half) {
        return None;
    }

    let local = origin - center;
    let mut t_min = 0.0_f32;
    let mut t_max = max_distance;

    for axis in 0..3 {
        let (new_min, new_max) = sweep_slab_interval(local[axis], dir[axis], half[axis], t_min, t_max)?;
        t_min = new_min;
        t_max = new_max;
    }

    // Entry face is the axis whose slab was entered last
    let mut normal = Vec3::ZERO;
    let mut best = f32::NEG_INFINITY;
    for axis in 0..3 {
        if dir[axis].abs() > PHYSICS_EPSILON {
            let entry = (-half[axis].copysign(dir[axis]) - local[axis]) / dir[axis];
            if entry > best {
                best = entry;
                normal = Vec3::ZERO;
                normal[axis] = -dir[axis].signum();
            }
        }
    }

    Some(Collision { normal, t: t_min })
}

/// Ray vs sphere within `[0, max_distance]`. `dir` must be normalized.
/// A ray that starts inside the sphere never reports it.
#[must_use]
pub fn ray_vs_sphere(origin: Vec3, dir: Vec3, max_distance: f32, center: Vec3, radius: f32) -> Option<Collision> {
    let to_origin = origin - center;
    let c = radius.mul_add(-radius, to_origin.length_squared());
    if c <= 0.0 {
        return None;
    }

    let b = to_origin.dot(dir);
    if b > 0.0 {
        return None; // Pointing away
    }

    let discriminant = b.mul_add(b, -c);
    if discriminant < 0.0 {
        return None;
    }

    let t = -b - discriminant.sqrt();
    if t < 0.0 || t > max_distance {
        return None;
    }

    let normal = (dir.mul_add(Vec3::splat(t), origin) - center).normalize_or_zero();
    Some(Collision { normal, t })
}

// Sphere vs axis-aligned cuboid overlap using the closest point on the box
#[must_use]
pub fn overlap_sphere_vs_cuboid(sphere_center: Vec3, radius: f32, center: Vec3, half: Vec3) -> bool {
    let closest = sphere_center.clamp(center - half, center + half);
    closest.distance_squared(sphere_center) <= radius * radius
}

#[must_use]
pub fn overlap_sphere_vs_sphere(a: Vec3, radius_a: f32, b: Vec3, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) <= reach * reach
}

// ============================================================================
// Direction Helpers
// ============================================================================

// Rotate a vector about the world up axis by `degrees` (positive turns +Z toward +X)
#[must_use]
pub fn rotate_about_up(v: Vec3, degrees: f32) -> Vec3 {
    Quat::from_rotation_y(degrees.to_radians()) * v
}

// Rotate a vector about an arbitrary axis by `degrees`
#[must_use]
pub fn rotate_about_axis(v: Vec3, axis: Vec3, degrees: f32) -> Vec3 {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return v;
    }
    Quat::from_axis_angle(axis, degrees.to_radians()) * v
}

// Unsigned angle in degrees between two vectors; zero-length input gives 0
#[must_use]
pub fn angle_between_degrees(a: Vec3, b: Vec3) -> f32 {
    let a = a.normalize_or_zero();
    let b = b.normalize_or_zero();
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return 0.0;
    }
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

// Project onto the floor plane and normalize
#[must_use]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z).normalize_or_zero()
}

// Yaw in radians such that `Quat::from_rotation_y(yaw) * Vec3::Z` points along `forward`
#[must_use]
pub fn yaw_of(forward: Vec3) -> f32 {
    forward.x.atan2(forward.z)
}

#[must_use]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn ray_hits_cuboid_front_face() {
        let hit = ray_vs_cuboid(Vec3::ZERO, Vec3::Z, 10.0, Vec3::new(0.0, 0.0, 5.0), Vec3::splat(1.0))
            .expect("should hit");
        assert!(approx(hit.t, 4.0));
        assert_eq!(hit.normal, Vec3::NEG_Z);
    }

    #[test]
    fn ray_misses_cuboid_beyond_range_or_aside() {
        let center = Vec3::new(0.0, 0.0, 5.0);
        assert!(ray_vs_cuboid(Vec3::ZERO, Vec3::Z, 3.0, center, Vec3::splat(1.0)).is_none());
        assert!(ray_vs_cuboid(Vec3::ZERO, Vec3::X, 10.0, center, Vec3::splat(1.0)).is_none());
        assert!(ray_vs_cuboid(Vec3::ZERO, Vec3::NEG_Z, 10.0, center, Vec3::splat(1.0)).is_none());
    }

    #[test]
    fn ray_starting_inside_cuboid_is_ignored() {
        assert!(ray_vs_cuboid(Vec3::ZERO, Vec3::Z, 10.0, Vec3::ZERO, Vec3::splat(1.0)).is_none());
    }

    #[test]
    fn ray_hits_sphere_surface() {
        let hit = ray_vs_sphere(Vec3::ZERO, Vec3::Z, 10.0, Vec3::new(0.0, 0.0, 5.0), 0.5).expect("should hit");
        assert!(approx(hit.t, 4.5));
        assert!(approx(hit.normal.z, -1.0));
        assert!(ray_vs_sphere(Vec3::ZERO, Vec3::X, 10.0, Vec3::new(0.0, 0.0, 5.0), 0.5).is_none());
        assert!(ray_vs_sphere(Vec3::ZERO, Vec3::Z, 1.0, Vec3::ZERO, 0.5).is_none());
    }

    #[test]
    fn sphere_overlaps() {
        assert!(overlap_sphere_vs_cuboid(Vec3::new(1.4, 0.0, 0.0), 0.5, Vec3::ZERO, Vec3::splat(1.0)));
        assert!(!overlap_sphere_vs_cuboid(Vec3::new(1.6, 0.0, 0.0), 0.5, Vec3::ZERO, Vec3::splat(1.0)));
        assert!(overlap_sphere_vs_sphere(Vec3::ZERO, 1.0, Vec3::new(1.5, 0.0, 0.0), 0.5));
        assert!(!overlap_sphere_vs_sphere(Vec3::ZERO, 1.0, Vec3::new(1.6, 0.0, 0.0), 0.5));
    }

    #[test]
    fn positive_yaw_turns_forward_toward_x() {
        let turned = rotate_about_up(Vec3::Z, 90.0);
        assert!(approx(turned.x, 1.0));
        assert!(approx(turned.z, 0.0));
        assert!(approx(yaw_of(turned), std::f32::consts::FRAC_PI_2));
        assert!(approx(forward_from_yaw(yaw_of(turned)).x, 1.0));
    }

    #[test]
    fn angle_between_handles_degenerate_vectors() {
        assert!(approx(angle_between_degrees(Vec3::Z, Vec3::X), 90.0));
        assert!(approx(angle_between_degrees(Vec3::Z, Vec3::ZERO), 0.0));
    }
}
