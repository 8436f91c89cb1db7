use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rand::Rng;

use crate::{
    accelerator::Accelerator,
    geometry::{FloatType, HitRecord, Ray, WorldPoint, WorldVector},
    renderer::{RenderSettings, Shadows},
    scene::{Material, Scene},
    util::{Rgba, TRANSPARENT, modulate},
};

/// Refractive index of the medium the camera sits in
pub const AIR_INDEX: f32 = 1.0;

/// Recursive Whitted ray tracer over a scene and its accelerator.
pub struct Integrator<'a> {
    pub scene: &'a Scene,
    pub accelerator: &'a Accelerator,
    pub settings: &'a RenderSettings,
    pub cancelled: &'a AtomicBool,
    pub ray_count: &'a AtomicU64,
}

impl Integrator<'_> {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Color seen along the primary ray.
    pub fn trace_primary(&self, ray: Ray, rng: &mut impl Rng) -> Rgba {
        self.trace(ray, 0, AIR_INDEX, 1.0, rng)
    }

    /// Color seen along the ray.
    /// `incident_index` is the refractive index of the medium the ray travels through,
    /// `normal_sign` is -1 while travelling inside an object.
    pub fn trace(
        &self,
        mut ray: Ray,
        depth: u32,
        incident_index: f32,
        normal_sign: FloatType,
        rng: &mut impl Rng,
    ) -> Rgba {
        if self.is_cancelled() {
            return TRANSPARENT;
        }

        let mut hit = HitRecord::default();
        if !self.cast(&mut ray, &mut hit) {
            return self.scene.background;
        }
        let Some(index) = hit.object else {
            return self.scene.background;
        };
        let material = &self.scene.objects[index].material;

        if !self.settings.lighting {
            return opaque(material.color * material.kd);
        }

        let mut color = self.direct_lighting(&ray, &hit, material, rng);

        if depth < self.settings.max_depth {
            if material.ks > 0.0 {
                let direction = reflect(&ray.direction, &hit.normal);
                let reflected = Ray::with_epsilon(hit.point, direction, self.settings.epsilon);
                color += self.trace(reflected, depth + 1, incident_index, normal_sign, rng)
                    * material.ks;
            }

            if material.transmission > 0.0 {
                let new_index = if normal_sign > 0.0 {
                    material.refractive_index
                } else {
                    AIR_INDEX
                };
                let eta = incident_index / new_index;

                if let Some(direction) = refract(&ray.direction, &hit.normal, normal_sign, eta) {
                    let refracted = Ray::with_epsilon(hit.point, direction, self.settings.epsilon);
                    color += self.trace(refracted, depth + 1, new_index, -normal_sign, rng)
                        * material.transmission;
                }
            }
        }

        opaque(color)
    }

    /// Diffuse and specular contribution of all lights visible from the hit point.
    fn direct_lighting(
        &self,
        ray: &Ray,
        hit: &HitRecord,
        material: &Material,
        rng: &mut impl Rng,
    ) -> Rgba {
        let samples = self.settings.shadows.sample_count();
        let weight = 1.0 / samples as f32;
        let mut color = TRANSPARENT;

        for light in &self.scene.lights {
            for _ in 0..samples {
                let target = match self.settings.shadows {
                    Shadows::Hard => light.position,
                    Shadows::Soft { .. } => light.sample_point(&hit.point, rng),
                };

                let to_light = target - hit.point;
                let distance = to_light.norm();
                if !(distance > 0.0) {
                    continue;
                }
                let direction = to_light / distance;

                let cosine = hit.normal.dot(&direction);
                if cosine <= 0.0 || !self.is_visible(hit.point, direction, distance) {
                    continue;
                }

                color += modulate(material.color, light.color) * (cosine * material.kd * weight);

                let reflected = hit.normal * (2.0 * direction.dot(&hit.normal)) - direction;
                let cosine2 = -reflected.dot(&ray.direction);
                if cosine2 > 0.0 {
                    color += light.color * (material.ks * cosine2.powf(material.shininess) * weight);
                }
            }
        }

        color
    }

    /// Whether nothing blocks the segment from `from` to the point `distance` away along
    /// `direction`. Hits past the end of the segment don't count.
    fn is_visible(&self, from: WorldPoint, direction: WorldVector, distance: FloatType) -> bool {
        let mut shadow_ray = Ray::with_epsilon(from, direction, self.settings.epsilon);
        let mut hit = HitRecord::within(distance - self.settings.epsilon);
        !self.cast(&mut shadow_ray, &mut hit)
    }

    /// Single counted accelerator query.
    fn cast(&self, ray: &mut Ray, hit: &mut HitRecord) -> bool {
        self.ray_count.fetch_add(1, Ordering::Relaxed);
        self.accelerator.hit(&self.scene.objects, ray, hit)
    }
}

fn opaque(color: Rgba) -> Rgba {
    Rgba { a: 1.0, ..color }
}

/// Mirror direction of `direction` around `normal`.
fn reflect(direction: &WorldVector, normal: &WorldVector) -> WorldVector {
    direction - normal * (2.0 * direction.dot(normal))
}

/// Refracted direction, None on total internal reflection.
/// `eta` is the ratio of the incident and the new refractive index.
fn refract(
    direction: &WorldVector,
    normal: &WorldVector,
    normal_sign: FloatType,
    eta: FloatType,
) -> Option<WorldVector> {
    let n = normal * normal_sign;
    let cos_i = -n.dot(direction);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k <= 0.0 {
        return None;
    }
    Some(direction * eta + n * (eta * cos_i - k.sqrt()))
}
