use crate::geometry::{FloatType, Ray, WorldBox, WorldVector};

/// Result of a successful slab test.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SlabHit {
    /// Distance along the ray where it enters the box (negative if the origin is inside)
    pub entry: FloatType,
    /// Distance along the ray where it leaves the box
    pub exit: FloatType,
    /// Per axis distance to the nearer of the two slab planes
    pub t_min: WorldVector,
    /// Per axis distance to the farther of the two slab planes
    pub t_max: WorldVector,
}

pub trait RayIntersectionExt {
    type Output;
    /// Calculate first and last ray intersection with the box
    fn intersect(&self, ray: &Ray) -> Self::Output;
}

impl RayIntersectionExt for WorldBox {
    type Output = Option<SlabHit>;

    /// Slab test. Returns None if the ray misses the box or the box is entirely behind
    /// the ray origin.
    fn intersect(&self, ray: &Ray) -> Option<SlabHit> {
        let mut entry = FloatType::NEG_INFINITY;
        let mut exit = FloatType::INFINITY;
        let mut t_min = WorldVector::zeros();
        let mut t_max = WorldVector::zeros();

        for i in 0..3 {
            let origin = ray.origin[i];
            let direction = ray.direction[i];
            let (slab_min, slab_max) = (self.min[i], self.max[i]);

            let (near, far) = if direction == 0.0 {
                // Parallel to both planes of this slab, either always inside or never
                if origin < slab_min || origin > slab_max {
                    return None;
                }
                (FloatType::NEG_INFINITY, FloatType::INFINITY)
            } else {
                let a = (slab_min - origin) / direction;
                let b = (slab_max - origin) / direction;
                if a > b { (b, a) } else { (a, b) }
            };

            entry = entry.max(near);
            exit = exit.min(far);

            if entry > exit || exit < 0.0 {
                return None;
            }

            t_min[i] = near;
            t_max[i] = far;
        }

        Some(SlabHit {
            entry,
            exit,
            t_min,
            t_max,
        })
    }
}
