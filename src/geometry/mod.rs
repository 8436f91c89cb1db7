mod aabb;
mod ray_box_intersection;
mod ray_triangle_intersection;
mod triangle;

pub use aabb::AABB;
pub use ray_box_intersection::{RayIntersectionExt, SlabHit};
pub use ray_triangle_intersection::FacePlane;
pub use triangle::{BarycentricCoordinates, Triangle};

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::scene::ObjectIdx;

pub type FloatType = f32;

/// Default distance used to push ray origins off surfaces and to reject
/// intersections that are too close to the origin.
pub const EPSILON: FloatType = 1e-4;

pub type ScreenPoint = Point2<u32>;
pub type ScreenSize = Vector2<u32>;
pub type ScreenBlock = AABB<ScreenPoint>;

pub type WorldPoint = Point3<FloatType>;
pub type WorldVector = Vector3<FloatType>;
pub type WorldBox = AABB<WorldPoint>;

#[derive(Copy, Clone, Debug)]
pub struct Ray {
    /// Origin, already moved by `epsilon` along the direction
    pub origin: WorldPoint,
    /// Normalized direction of the ray
    pub direction: WorldVector,
    /// Distance of the most recently accepted hit, starts at infinity
    pub t: FloatType,
    /// Self-intersection threshold this ray was built with
    pub epsilon: FloatType,
}

impl Ray {
    pub fn new(origin: WorldPoint, direction: WorldVector) -> Ray {
        Ray::with_epsilon(origin, direction, EPSILON)
    }

    pub fn with_epsilon(origin: WorldPoint, direction: WorldVector, epsilon: FloatType) -> Ray {
        let direction = direction.normalize();

        Ray {
            origin: origin + direction * epsilon,
            direction,
            t: FloatType::INFINITY,
            epsilon,
        }
    }

    pub fn point_at(&self, distance: FloatType) -> WorldPoint {
        self.origin + self.direction * distance
    }

    /// Records an accepted hit at distance `t`. The stored distance never grows.
    pub fn accept(&mut self, t: FloatType) {
        self.t = self.t.min(t);
    }
}

/// Best intersection found so far along a ray.
#[derive(Clone, Debug)]
pub struct HitRecord {
    pub t: FloatType,
    pub point: WorldPoint,
    pub normal: WorldVector,
    pub object: Option<ObjectIdx>,
}

impl HitRecord {
    /// Record that accepts hits up to `max_distance`.
    pub fn within(max_distance: FloatType) -> HitRecord {
        HitRecord {
            t: max_distance,
            ..HitRecord::default()
        }
    }

    pub fn is_hit(&self) -> bool {
        self.object.is_some()
    }

    /// Overwrite the record with a closer hit and mirror the distance into the ray.
    /// The object handle is filled in by the accelerator, which knows the index.
    pub fn update(&mut self, ray: &mut Ray, t: FloatType, normal: WorldVector) {
        ray.accept(t);
        self.t = t;
        self.point = ray.point_at(t);
        self.normal = normal;
    }
}

impl Default for HitRecord {
    fn default() -> Self {
        HitRecord {
            t: FloatType::INFINITY,
            point: WorldPoint::origin(),
            normal: WorldVector::zeros(),
            object: None,
        }
    }
}
