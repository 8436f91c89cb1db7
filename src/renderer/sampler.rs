use nalgebra::{Point2, Vector2};
use rand::Rng;

use crate::{
    geometry::{FloatType, Ray, ScreenPoint, ScreenSize},
    renderer::{AntiAliasing, DepthOfField, integrator::Integrator},
    util::{Rgba, average, color_difference},
};

/// Turns logical pixels into one or more primary rays and combines their colors.
pub struct Sampler<'a> {
    integrator: &'a Integrator<'a>,
    film_size: Vector2<FloatType>,
}

impl<'a> Sampler<'a> {
    /// `film_size` is the logical resolution, pixel (x, y) covers [x, x + 1) × [y, y + 1).
    pub fn new(integrator: &'a Integrator<'a>, film_size: ScreenSize) -> Sampler<'a> {
        Sampler {
            integrator,
            film_size: film_size.cast(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.integrator.is_cancelled()
    }

    pub fn sample_pixel(&self, pixel: ScreenPoint, rng: &mut impl Rng) -> Rgba {
        let x = pixel.x as FloatType;
        let y = pixel.y as FloatType;

        match self.integrator.settings.anti_aliasing {
            AntiAliasing::None => self.sample(x + 0.5, y + 0.5, rng),
            AntiAliasing::Regular { n } => {
                let n = n.get();
                let colors = sub_cells(n)
                    .map(|(i, j)| {
                        self.sample(
                            x + (i as FloatType + 0.5) / n as FloatType,
                            y + (j as FloatType + 0.5) / n as FloatType,
                            rng,
                        )
                    })
                    .collect::<Vec<_>>();
                average(&colors)
            }
            AntiAliasing::Stochastic { n } => {
                let n = n.get();
                let colors = sub_cells(n)
                    .map(|(i, j)| {
                        let jitter_x: FloatType = rng.random();
                        let jitter_y: FloatType = rng.random();
                        self.sample(
                            x + (i as FloatType + jitter_x) / n as FloatType,
                            y + (j as FloatType + jitter_y) / n as FloatType,
                            rng,
                        )
                    })
                    .collect::<Vec<_>>();
                average(&colors)
            }
            AntiAliasing::Adaptive { n, threshold } => {
                self.sample_adaptive(x, y, 1.0, 1.0 / n.get() as FloatType, threshold, rng)
            }
        }
    }

    /// Samples the corners of a square, subdividing it while the corners disagree and
    /// the subdivided squares are larger than `min_step`.
    fn sample_adaptive(
        &self,
        x: FloatType,
        y: FloatType,
        step: FloatType,
        min_step: FloatType,
        threshold: f32,
        rng: &mut impl Rng,
    ) -> Rgba {
        let corners = [(x, y), (x + step, y), (x, y + step), (x + step, y + step)];

        let mut colors = Vec::with_capacity(4);
        for (cx, cy) in corners {
            let color = self.sample(cx, cy, rng);
            let agrees = colors
                .iter()
                .all(|other| color_difference(*other, color) <= threshold);
            colors.push(color);
            if !agrees {
                break;
            }
        }

        let all_agree = colors.len() == 4
            && colors
                .iter()
                .enumerate()
                .all(|(i, a)| colors[i + 1..].iter().all(|b| color_difference(*a, *b) <= threshold));
        if all_agree {
            return average(&colors);
        }

        let half = step / 2.0;
        if half <= min_step {
            return colors[0];
        }

        let quadrants = [(x, y), (x + half, y), (x, y + half), (x + half, y + half)];
        let colors = quadrants
            .map(|(qx, qy)| self.sample_adaptive(qx, qy, half, min_step, threshold, rng));
        average(&colors)
    }

    /// Color at a single film position, averaged over the lens when depth of field is on.
    fn sample(&self, x: FloatType, y: FloatType, rng: &mut impl Rng) -> Rgba {
        let settings = self.integrator.settings;
        let camera = &self.integrator.scene.camera;
        let ray = camera.primary_ray(Point2::new(x, y), self.film_size, settings.epsilon);

        match &settings.depth_of_field {
            None => self.integrator.trace_primary(ray, rng),
            Some(dof) => self.sample_lens(&ray, dof, rng),
        }
    }

    /// Thin lens: rays from random points of the lens disk, all aimed at the point where
    /// the pinhole ray crosses the focal distance.
    fn sample_lens(&self, ray: &Ray, dof: &DepthOfField, rng: &mut impl Rng) -> Rgba {
        let settings = self.integrator.settings;
        let camera = &self.integrator.scene.camera;

        let eye = camera.eye();
        let focal_point = eye + ray.direction * dof.focal_distance;
        let lens_radius = 0.5 / dof.aperture;

        let colors = (0..dof.samples.get())
            .map(|_| {
                let origin = eye + camera.sample_lens(lens_radius, rng);
                let lens_ray = Ray::with_epsilon(origin, focal_point - origin, settings.epsilon);
                self.integrator.trace_primary(lens_ray, rng)
            })
            .collect::<Vec<_>>();
        average(&colors)
    }
}

/// Row major sub-pixel cell coordinates of an `n`×`n` pattern.
fn sub_cells(n: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..n).flat_map(move |j| (0..n).map(move |i| (i, j)))
}

#[cfg(test)]
mod test {
    use std::{
        num::NonZeroU32,
        sync::atomic::{AtomicBool, AtomicU64, Ordering},
    };

    use super::*;
    use crate::{
        accelerator::Accelerator,
        camera::Camera,
        geometry::WorldPoint,
        renderer::RenderSettings,
        scene::{Material, Polygon, Scene, Sphere},
    };
    use assert2::{assert, check, let_assert};
    use rand::{SeedableRng, rngs::SmallRng};
    use test_case::test_case;

    const BACKGROUND: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    fn scene() -> Scene {
        let_assert!(
            Ok(camera) = Camera::builder()
                .eye(WorldPoint::new(0.0, 0.0, 10.0))
                .at(WorldPoint::origin())
                .build()
        );
        let mut scene = Scene::new(camera, ScreenSize::new(8, 8));
        scene.background = BACKGROUND;
        scene
    }

    /// White wall covering everything right of `edge` at the look-at distance.
    /// The film position `fx` maps to `x = 11.547 * (fx / 8 - 0.5)` there.
    fn wall_right_of(edge: FloatType) -> Scene {
        let mut scene = scene();
        scene.add_object(
            Polygon::new(vec![
                WorldPoint::new(edge, -100.0, 0.0),
                WorldPoint::new(100.0, -100.0, 0.0),
                WorldPoint::new(edge, 100.0, 0.0),
                WorldPoint::new(100.0, 100.0, 0.0),
            ]),
            Material::default(),
        );
        scene
    }

    /// Samples one pixel, returns the color and the number of rays cast.
    fn sample_pixel(scene: &Scene, settings: RenderSettings, pixel: ScreenPoint) -> (Rgba, u64) {
        let accelerator = Accelerator::build(settings.accelerator, &scene.objects, settings.epsilon);
        let cancelled = AtomicBool::new(false);
        let ray_count = AtomicU64::new(0);
        let integrator = Integrator {
            scene,
            accelerator: &accelerator,
            settings: &settings,
            cancelled: &cancelled,
            ray_count: &ray_count,
        };
        let sampler = Sampler::new(&integrator, scene.resolution);
        let mut rng = SmallRng::seed_from_u64(11);
        let color = sampler.sample_pixel(pixel, &mut rng);
        (color, ray_count.load(Ordering::Relaxed))
    }

    fn unlit(anti_aliasing: AntiAliasing) -> RenderSettings {
        RenderSettings {
            anti_aliasing,
            lighting: false,
            ..Default::default()
        }
    }

    fn n(value: u32) -> NonZeroU32 {
        NonZeroU32::new(value).unwrap()
    }

    #[test_case(AntiAliasing::None => 1 ; "none")]
    #[test_case(AntiAliasing::Regular { n: n(3) } => 9 ; "regular")]
    #[test_case(AntiAliasing::Stochastic { n: n(2) } => 4 ; "stochastic")]
    #[test_case(AntiAliasing::Adaptive { n: n(4), threshold: 0.3 } => 4 ; "adaptive")]
    fn rays_per_pixel_on_empty_background(anti_aliasing: AntiAliasing) -> u64 {
        let (color, rays) = sample_pixel(&scene(), unlit(anti_aliasing), ScreenPoint::new(3, 3));
        assert!(color == BACKGROUND);
        rays
    }

    #[test]
    fn adaptive_subdivides_on_edges() {
        // Edge at film x = 4.6
        let scene = wall_right_of(0.866);

        let (inside, inside_rays) = sample_pixel(
            &scene,
            unlit(AntiAliasing::Adaptive {
                n: n(8),
                threshold: 0.3,
            }),
            ScreenPoint::new(6, 3),
        );
        assert!(inside == WHITE);
        assert!(inside_rays == 4);

        let (edge, edge_rays) = sample_pixel(
            &scene,
            unlit(AntiAliasing::Adaptive {
                n: n(8),
                threshold: 0.3,
            }),
            ScreenPoint::new(4, 3),
        );
        check!(edge_rays > 4);
        check!(edge.r > 0.0);
        check!(edge.r < 1.0);
    }

    #[test]
    fn adaptive_stops_at_base_resolution() {
        // With n = 2 the pixel is never subdivided, the first corner is returned
        let scene = wall_right_of(0.866);
        let (edge, edge_rays) = sample_pixel(
            &scene,
            unlit(AntiAliasing::Adaptive {
                n: n(2),
                threshold: 0.3,
            }),
            ScreenPoint::new(4, 3),
        );
        assert!(edge == BACKGROUND);
        assert!(edge_rays == 2);
    }

    #[test]
    fn regular_averages_sub_samples() {
        let settings = unlit(AntiAliasing::Regular { n: n(2) });

        let scene = wall_right_of(0.0);
        let (left, rays) = sample_pixel(&scene, settings.clone(), ScreenPoint::new(3, 3));
        assert!(rays == 4);
        assert!(left == BACKGROUND);
        let (right, _) = sample_pixel(&scene, settings.clone(), ScreenPoint::new(4, 3));
        assert!(right == WHITE);

        // Edge at film x = 4.6, between the two sub-sample columns of pixel 4
        let scene = wall_right_of(0.866);
        let (split, _) = sample_pixel(&scene, settings, ScreenPoint::new(4, 3));
        assert!(split == Rgba::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn depth_of_field_casts_lens_rays() {
        let mut scene = scene();
        scene.add_object(Sphere::new(WorldPoint::origin(), 3.0), Material::default());
        let settings = RenderSettings {
            depth_of_field: Some(DepthOfField {
                aperture: 2.0,
                focal_distance: 7.0,
                samples: n(5),
            }),
            lighting: false,
            ..Default::default()
        };
        let (color, rays) = sample_pixel(&scene, settings, ScreenPoint::new(4, 4));
        assert!(rays == 5);
        // Every lens ray converges on the in-focus sphere surface
        assert!(color == WHITE);
    }

    #[test]
    fn sub_cell_order() {
        let cells: Vec<_> = sub_cells(2).collect();
        assert!(cells == vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }
}
