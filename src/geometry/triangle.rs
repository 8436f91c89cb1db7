use std::ops::{Index, Sub};

use nalgebra::{
    ClosedAddAssign, ClosedMulAssign, ClosedSubAssign, DefaultAllocator, DimName, OPoint, OVector,
    Scalar, allocator::Allocator,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Triangle<Point>([Point; 3]);

impl<Point> Triangle<Point> {
    pub fn new(a: Point, b: Point, c: Point) -> Triangle<Point> {
        Triangle([a, b, c])
    }
}

impl<Point> Index<usize> for Triangle<Point> {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T: Scalar, D: DimName> Triangle<OPoint<T, D>>
where
    DefaultAllocator: Allocator<D>,
    for<'a> &'a OPoint<T, D>: Sub<Output = OVector<T, D>>,
{
    /// Returns edge vectors, coming from self[0]
    pub fn edges(&self) -> [OVector<T, D>; 2] {
        [&self.0[1] - &self.0[0], &self.0[2] - &self.0[0]]
    }
}

impl<T: Scalar, D: DimName> Triangle<OPoint<T, D>>
where
    DefaultAllocator: Allocator<D>,
    for<'a> &'a OPoint<T, D>: Sub<Output = OVector<T, D>>,
    T: ClosedAddAssign + ClosedSubAssign + ClosedMulAssign,
{
    /// Returns a normal vector of the triangle, not normalized.
    pub fn normal(&self) -> OVector<T, D> {
        let [e1, e2] = self.edges();
        e1.cross(&e2)
    }
}

/// Position inside a triangle relative to its first vertex, along the two edges.
/// The point is `v0 + u * (v1 - v0) + v * (v2 - v0)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BarycentricCoordinates<T> {
    pub u: T,
    pub v: T,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::{WorldPoint, WorldVector};
    use assert2::assert;

    fn triangle() -> Triangle<WorldPoint> {
        Triangle::new(
            WorldPoint::new(1.0, 1.0, 0.0),
            WorldPoint::new(3.0, 1.0, 0.0),
            WorldPoint::new(1.0, 4.0, 0.0),
        )
    }

    #[test]
    fn edges_start_at_first_vertex() {
        let [e1, e2] = triangle().edges();
        assert!(e1 == WorldVector::new(2.0, 0.0, 0.0));
        assert!(e2 == WorldVector::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn normal_follows_winding() {
        assert!(triangle().normal() == WorldVector::new(0.0, 0.0, 6.0));

        let t = triangle();
        let flipped = Triangle::new(t[0], t[2], t[1]);
        assert!(flipped.normal() == WorldVector::new(0.0, 0.0, -6.0));
    }
}
