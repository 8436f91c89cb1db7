use itertools::Itertools as _;

use crate::geometry::{
    FacePlane, FloatType, HitRecord, Ray, Triangle, WorldBox, WorldPoint, WorldVector,
};

use super::Object;

#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub center: WorldPoint,
    pub radius: FloatType,
}

impl Sphere {
    pub fn new(center: WorldPoint, radius: FloatType) -> Sphere {
        Sphere { center, radius }
    }
}

impl Object for Sphere {
    fn intersect(&self, ray: &mut Ray, hit: &mut HitRecord) -> bool {
        let l = self.center - ray.origin;
        let b = ray.direction.dot(&l);
        let c = l.dot(&l) - self.radius * self.radius;
        if c == 0.0 {
            // Origin exactly on the surface
            return false;
        }

        let discriminant = b * b - c;
        if discriminant <= ray.epsilon {
            return false;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = b - sqrt_disc;
        let t2 = b + sqrt_disc;
        let t = if t1 > 0.0 {
            t1
        } else if t2 > 0.0 {
            t2
        } else {
            return false;
        };

        if t >= hit.t {
            return false;
        }

        let normal = (ray.point_at(t) - self.center) / self.radius;
        hit.update(ray, t, normal);
        true
    }

    fn get_bounding_box(&self) -> Option<WorldBox> {
        let r_vec = WorldVector::repeat(self.radius);
        Some(WorldBox::new(self.center - r_vec, self.center + r_vec))
    }
}

/// Infinite plane, oriented by the winding of the three points it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    plane: FacePlane,
}

impl Plane {
    /// None if the points are collinear.
    pub fn from_points(a: WorldPoint, b: WorldPoint, c: WorldPoint) -> Option<Plane> {
        FacePlane::from_triangle(&Triangle::new(a, b, c)).map(|plane| Plane { plane })
    }

    pub fn normal(&self) -> WorldVector {
        self.plane.normal
    }

    pub fn constant(&self) -> FloatType {
        self.plane.constant
    }
}

impl Object for Plane {
    fn intersect(&self, ray: &mut Ray, hit: &mut HitRecord) -> bool {
        let Some(t) = self.plane.distance_along(ray) else {
            return false;
        };
        if t < ray.epsilon || t >= hit.t {
            return false;
        }
        hit.update(ray, t, self.plane.normal);
        true
    }

    fn get_bounding_box(&self) -> Option<WorldBox> {
        None
    }
}

/// Flat polygon, intersected as the strip of triangles formed by consecutive vertex triples.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<WorldPoint>,
    /// Plane of the first three vertices, None when there are fewer or they are collinear
    plane: Option<FacePlane>,
}

impl Polygon {
    pub fn new(vertices: Vec<WorldPoint>) -> Polygon {
        let plane = match vertices.as_slice() {
            [a, b, c, ..] => FacePlane::from_triangle(&Triangle::new(*a, *b, *c)),
            _ => None,
        };
        Polygon { vertices, plane }
    }

    pub fn vertices(&self) -> &[WorldPoint] {
        &self.vertices
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle<WorldPoint>> + '_ {
        self.vertices
            .iter()
            .tuple_windows()
            .map(|(a, b, c)| Triangle::new(*a, *b, *c))
    }
}

impl Object for Polygon {
    fn intersect(&self, ray: &mut Ray, hit: &mut HitRecord) -> bool {
        let Some(plane) = &self.plane else {
            return false;
        };

        let mut best = hit.t;
        for triangle in self.triangles() {
            if let Some((t, _)) = triangle.intersect(plane, ray, best) {
                if t < best {
                    best = t;
                }
            }
        }

        if best < hit.t {
            hit.update(ray, best, plane.normal);
            true
        } else {
            false
        }
    }

    fn get_bounding_box(&self) -> Option<WorldBox> {
        WorldBox::from_points(&self.vertices)
    }
}

/// Polygon with per vertex normals.
/// Ray intersection is not supported, patches are never hit.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonPatch {
    pub vertices: Vec<WorldPoint>,
    pub normals: Vec<WorldVector>,
}

impl Object for PolygonPatch {
    fn intersect(&self, _ray: &mut Ray, _hit: &mut HitRecord) -> bool {
        false
    }

    fn get_bounding_box(&self) -> Option<WorldBox> {
        WorldBox::from_points(&self.vertices)
    }
}

/// Cone frustum between two end caps.
/// Ray intersection is not supported, cylinders are never hit.
#[derive(Clone, Debug, PartialEq)]
pub struct Cylinder {
    pub base: WorldPoint,
    pub base_radius: FloatType,
    pub apex: WorldPoint,
    pub apex_radius: FloatType,
}

impl Object for Cylinder {
    fn intersect(&self, _ray: &mut Ray, _hit: &mut HitRecord) -> bool {
        false
    }

    fn get_bounding_box(&self) -> Option<WorldBox> {
        let cap = |center: WorldPoint, radius: FloatType| {
            let r_vec = WorldVector::repeat(radius);
            WorldBox::new(center - r_vec, center + r_vec)
        };
        Some(cap(self.base, self.base_radius).union(&cap(self.apex, self.apex_radius)))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    Plane(Plane),
    Polygon(Polygon),
    PolygonPatch(PolygonPatch),
    Cylinder(Cylinder),
}

impl Object for Shape {
    fn intersect(&self, ray: &mut Ray, hit: &mut HitRecord) -> bool {
        match self {
            Shape::Sphere(s) => s.intersect(ray, hit),
            Shape::Plane(p) => p.intersect(ray, hit),
            Shape::Polygon(p) => p.intersect(ray, hit),
            Shape::PolygonPatch(p) => p.intersect(ray, hit),
            Shape::Cylinder(c) => c.intersect(ray, hit),
        }
    }

    fn get_bounding_box(&self) -> Option<WorldBox> {
        match self {
            Shape::Sphere(s) => s.get_bounding_box(),
            Shape::Plane(p) => p.get_bounding_box(),
            Shape::Polygon(p) => p.get_bounding_box(),
            Shape::PolygonPatch(p) => p.get_bounding_box(),
            Shape::Cylinder(c) => c.get_bounding_box(),
        }
    }
}

macro_rules! shape_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Shape {
                fn from(value: $variant) -> Shape {
                    Shape::$variant(value)
                }
            }
        )*
    };
}

shape_from!(Sphere, Plane, Polygon, PolygonPatch, Cylinder);
