use std::ops::{Add, Sub};

use nalgebra::{Point2, Scalar};

use super::{FloatType, WorldBox, WorldPoint, WorldVector};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AABB<Point> {
    pub min: Point,
    pub max: Point,
}

impl<Point> AABB<Point> {
    pub fn new(min: Point, max: Point) -> AABB<Point> {
        AABB { min, max }
    }

    pub fn with_size<S>(min: Point, size: &S) -> AABB<Point>
    where
        for<'a> &'a Point: Add<&'a S, Output = Point>,
    {
        let max = &min + size;
        AABB { min, max }
    }
}

impl<Point: Sub + Copy> AABB<Point> {
    pub fn size(&self) -> Point::Output {
        self.max - self.min
    }
}

impl<T: Scalar + Copy + Sub> AABB<Point2<T>> {
    pub fn width(&self) -> T::Output {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> T::Output {
        self.max[1] - self.min[1]
    }
}

impl WorldBox {
    /// Smallest box containing all the points, None if there are no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a WorldPoint>) -> Option<WorldBox> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => WorldBox::new(*p, *p),
                Some(b) => WorldBox::new(b.min.inf(p), b.max.sup(p)),
            })
        })
    }

    pub fn union(&self, other: &WorldBox) -> WorldBox {
        WorldBox::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Grows the box by `amount` on every side.
    pub fn padded(&self, amount: FloatType) -> WorldBox {
        let pad = WorldVector::repeat(amount);
        WorldBox::new(self.min - pad, self.max + pad)
    }

    pub fn volume(&self) -> FloatType {
        self.size().product()
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: &WorldPoint) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}
