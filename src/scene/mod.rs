pub mod primitives;

use index_vec::IndexVec;
use rand::Rng;

use crate::{
    camera::Camera,
    geometry::{FloatType, HitRecord, Ray, ScreenSize, WorldBox, WorldPoint, WorldVector},
    util::Rgba,
};

pub use primitives::{Cylinder, Plane, Polygon, PolygonPatch, Shape, Sphere};

index_vec::define_index_type! {
    /// Handle of an object in the scene's object list.
    pub struct ObjectIdx = u32;
}

/// Renderable object
pub trait Object {
    /// Intersects the ray with the object. If the hit is closer than `hit.t`,
    /// updates the hit record and the ray distance and returns true.
    fn intersect(&self, ray: &mut Ray, hit: &mut HitRecord) -> bool;

    /// None for objects without finite extent.
    fn get_bounding_box(&self) -> Option<WorldBox>;
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Rgba,
    /// Diffuse coefficient
    pub kd: f32,
    /// Specular coefficient, also scales the reflected ray
    pub ks: f32,
    pub shininess: f32,
    /// Transmission coefficient, scales the refracted ray
    pub transmission: f32,
    pub refractive_index: f32,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            color: Rgba::new(1.0, 1.0, 1.0, 1.0),
            kd: 1.0,
            ks: 0.0,
            shininess: 100000.0,
            transmission: 0.0,
            refractive_index: 1.0,
        }
    }
}

/// Spherical light source. Acts as a point light unless soft shadows are enabled.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Light {
    pub position: WorldPoint,
    pub color: Rgba,
    pub radius: FloatType,
}

impl Light {
    pub fn new(position: WorldPoint) -> Light {
        Light {
            position,
            color: Rgba::new(1.0, 1.0, 1.0, 1.0),
            radius: 0.5,
        }
    }

    /// Random point on the disk of the light that faces `towards`.
    ///
    /// The point is a uniform point of the light sphere projected onto that disk, so the
    /// samples are denser toward the rim than a uniform disk sample. This matches a
    /// spherical light seen from `towards`, and the distribution stays symmetric around
    /// the light center.
    pub fn sample_point(&self, towards: &WorldPoint, rng: &mut impl Rng) -> WorldPoint {
        let on_sphere = random_unit_vector(rng);
        let Some(facing) = (*towards - self.position).try_normalize(0.0) else {
            return self.position + on_sphere * self.radius;
        };
        let flattened = on_sphere - facing * on_sphere.dot(&facing);
        self.position + flattened * self.radius
    }
}

/// Uniformly distributed point on the unit sphere, from a point rejection sampled
/// inside the unit 4D ball.
fn random_unit_vector(rng: &mut impl Rng) -> WorldVector {
    loop {
        let [x0, x1, x2, x3]: [FloatType; 4] =
            std::array::from_fn(|_| rng.random_range(-1.0..=1.0));
        let d = x0 * x0 + x1 * x1 + x2 * x2 + x3 * x3;
        if d >= 1.0 || d == 0.0 {
            continue;
        }
        return WorldVector::new(
            2.0 * (x1 * x3 + x0 * x2) / d,
            2.0 * (x2 * x3 - x0 * x1) / d,
            (x0 * x0 + x3 * x3 - x1 * x1 - x2 * x2) / d,
        );
    }
}

#[derive(Clone, Debug)]
pub struct SceneObject {
    pub shape: Shape,
    pub material: Material,
}

impl Object for SceneObject {
    fn intersect(&self, ray: &mut Ray, hit: &mut HitRecord) -> bool {
        self.shape.intersect(ray, hit)
    }

    fn get_bounding_box(&self) -> Option<WorldBox> {
        self.shape.get_bounding_box()
    }
}

/// Everything a render pass needs to know about the world.
/// Read only while rendering.
#[derive(Clone, Debug)]
pub struct Scene {
    pub objects: IndexVec<ObjectIdx, SceneObject>,
    pub lights: Vec<Light>,
    pub camera: Camera,
    pub background: Rgba,
    pub resolution: ScreenSize,
}

impl Scene {
    pub fn new(camera: Camera, resolution: ScreenSize) -> Scene {
        Scene {
            objects: IndexVec::new(),
            lights: Vec::new(),
            camera,
            background: Rgba::new(0.0, 0.0, 0.0, 1.0),
            resolution,
        }
    }

    pub fn add_object(&mut self, shape: impl Into<Shape>, material: Material) -> ObjectIdx {
        self.objects.push(SceneObject {
            shape: shape.into(),
            material,
        })
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;
    use rand::{SeedableRng, rngs::SmallRng};

    #[test]
    fn unit_vectors_are_unit_and_centered() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut sum = WorldVector::zeros();
        let n = 20000;
        for _ in 0..n {
            let v = random_unit_vector(&mut rng);
            assert!((v.norm() - 1.0).abs() < 1e-3);
            sum += v;
        }
        assert!((sum / n as FloatType).norm() < 0.05);
    }

    #[test]
    fn light_samples_lie_on_facing_disk() {
        let mut rng = SmallRng::seed_from_u64(3);
        let light = Light {
            radius: 2.0,
            ..Light::new(WorldPoint::new(0.0, 10.0, 0.0))
        };
        let shading_point = WorldPoint::origin();
        for _ in 0..1000 {
            let p = light.sample_point(&shading_point, &mut rng);
            assert!((p.y - 10.0).abs() < 1e-4);
            assert!((p - light.position).norm() <= 2.0 + 1e-4);
        }
    }

    #[test]
    fn light_sample_at_own_position() {
        let mut rng = SmallRng::seed_from_u64(3);
        let light = Light::new(WorldPoint::new(1.0, 2.0, 3.0));
        let p = light.sample_point(&light.position, &mut rng);
        assert!(((p - light.position).norm() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn default_material() {
        let m = Material::default();
        assert!(m.color == Rgba::new(1.0, 1.0, 1.0, 1.0));
        assert!(m.kd == 1.0);
        assert!(m.ks == 0.0);
        assert!(m.transmission == 0.0);
        assert!(m.refractive_index == 1.0);
    }

    #[test]
    fn add_objects() {
        let camera = Camera::builder()
            .eye(WorldPoint::new(0.0, 0.0, 5.0))
            .at(WorldPoint::origin())
            .build()
            .unwrap();
        let mut scene = Scene::new(camera, ScreenSize::new(4, 4));
        let a = scene.add_object(Sphere::new(WorldPoint::origin(), 1.0), Material::default());
        let b = scene.add_object(
            Sphere::new(WorldPoint::new(3.0, 0.0, 0.0), 1.0),
            Material::default(),
        );
        assert!(a == ObjectIdx::from_usize(0));
        assert!(b == ObjectIdx::from_usize(1));
        assert!(scene.objects.len() == 2);
    }
}
