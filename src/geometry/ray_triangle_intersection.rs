use crate::geometry::{
    BarycentricCoordinates, FloatType, Ray, Triangle, WorldPoint, WorldVector,
};

/// Supporting plane of a flat face, with the two axes the face is projected onto
/// when solving for barycentric coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FacePlane {
    /// Unit normal, oriented by the winding of the defining triangle
    pub normal: WorldVector,
    /// `-dot(normal, p)` for any point `p` on the plane
    pub constant: FloatType,
    /// Axes orthogonal to the dominant component of the normal
    pub axes: (usize, usize),
}

impl FacePlane {
    /// Plane through the three triangle vertices, None if they are collinear.
    pub fn from_triangle(triangle: &Triangle<WorldPoint>) -> Option<FacePlane> {
        let normal = triangle.normal();
        let length = normal.norm();
        if !(length > 0.0 && length.is_finite()) {
            return None;
        }
        let normal = normal / length;
        let constant = -normal.dot(&triangle[0].coords);

        let abs = normal.abs();
        let axes = if abs.x >= abs.y && abs.x >= abs.z {
            (1, 2)
        } else if abs.y >= abs.z {
            (2, 0)
        } else {
            (0, 1)
        };

        Some(FacePlane {
            normal,
            constant,
            axes,
        })
    }

    /// Distance along the ray to the plane, None if the ray is parallel with it.
    /// The distance may be negative.
    pub fn distance_along(&self, ray: &Ray) -> Option<FloatType> {
        let denominator = ray.direction.dot(&self.normal);
        if denominator == 0.0 {
            return None;
        }
        Some(-(self.constant + ray.origin.coords.dot(&self.normal)) / denominator)
    }
}

impl Triangle<WorldPoint> {
    /// Intersects the ray with a triangle lying in `plane`.
    /// Only hits in `[ray.epsilon, max_distance]` are reported.
    pub fn intersect(
        &self,
        plane: &FacePlane,
        ray: &Ray,
        max_distance: FloatType,
    ) -> Option<(FloatType, BarycentricCoordinates<FloatType>)> {
        let t = plane.distance_along(ray)?;
        if !(t >= ray.epsilon && t <= max_distance) {
            return None;
        }

        let point = ray.point_at(t);
        let (i1, i2) = plane.axes;

        let u0 = point[i1] - self[0][i1];
        let v0 = point[i2] - self[0][i2];
        let u1 = self[1][i1] - self[0][i1];
        let u2 = self[2][i1] - self[0][i1];
        let v1 = self[1][i2] - self[0][i2];
        let v2 = self[2][i2] - self[0][i2];

        let (a, b) = if u1 == 0.0 {
            let b = u0 / u2;
            (((v0 - b * v2) / v1), b)
        } else {
            let b = (v0 * u1 - u0 * v1) / (v2 * u1 - u2 * v1);
            (((u0 - b * u2) / u1), b)
        };

        if !(a.is_finite() && b.is_finite()) {
            return None;
        }
        if a < 0.0 || b < 0.0 || a + b > 1.0 {
            return None;
        }

        Some((t, BarycentricCoordinates { u: a, v: b }))
    }
}
