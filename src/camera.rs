use bon::bon;
use nalgebra::{Point2, Unit, Vector2};
use rand_distr::Distribution as _;

use crate::geometry::{FloatType, Ray, WorldPoint, WorldVector};

#[derive(Copy, Clone, Debug, thiserror::Error, PartialEq)]
pub enum CameraError {
    #[error("eye and look-at point coincide")]
    ZeroViewDirection,
    #[error("up vector is zero or parallel with the view direction")]
    DegenerateUp,
    #[error("field of view must be in (0, 180) degrees, got {0}")]
    InvalidFov(FloatType),
}

/// Pinhole camera looking from `eye` at `at`, with vertical field of view in degrees.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    eye: WorldPoint,
    at: WorldPoint,
    fov: FloatType,

    /// Unit vector pointing from the look-at point back to the eye
    backward: Unit<WorldVector>,
    right: Unit<WorldVector>,
    up: Unit<WorldVector>,
    /// Distance between the eye and the look-at point
    focus: FloatType,
    /// Height of the film at the look-at distance
    film_height: FloatType,
}

#[bon]
impl Camera {
    #[builder]
    pub fn new(
        eye: WorldPoint,
        at: WorldPoint,
        #[builder(default = WorldVector::y())] up: WorldVector,
        #[builder(default = 60.0)] fov: FloatType,
    ) -> Result<Self, CameraError> {
        if !(fov > 0.0 && fov < 180.0) {
            return Err(CameraError::InvalidFov(fov));
        }

        let z = eye - at;
        let focus = z.norm();
        let backward = Unit::try_new(z, 0.0).ok_or(CameraError::ZeroViewDirection)?;
        let right = Unit::try_new(up.cross(backward.as_ref()), FloatType::EPSILON)
            .ok_or(CameraError::DegenerateUp)?;
        let up = Unit::new_normalize(backward.cross(right.as_ref()));

        Ok(Camera {
            eye,
            at,
            fov,
            backward,
            right,
            up,
            focus,
            film_height: 2.0 * focus * (fov.to_radians() / 2.0).tan(),
        })
    }
}

impl Camera {
    pub fn eye(&self) -> WorldPoint {
        self.eye
    }

    pub fn at(&self) -> WorldPoint {
        self.at
    }

    pub fn fov(&self) -> FloatType {
        self.fov
    }

    /// Direction of the ray through a film position.
    /// Film coordinates go from (0, 0) in the top left corner to `film_size`.
    pub fn film_direction(
        &self,
        film: Point2<FloatType>,
        film_size: Vector2<FloatType>,
    ) -> WorldVector {
        let aspect = film_size.x / film_size.y;
        let film_width = aspect * self.film_height;

        let direction = -self.backward.as_ref() * self.focus
            + self.up.as_ref() * (self.film_height * (0.5 - film.y / film_size.y))
            + self.right.as_ref() * (film_width * (film.x / film_size.x - 0.5));
        direction.normalize()
    }

    pub fn primary_ray(
        &self,
        film: Point2<FloatType>,
        film_size: Vector2<FloatType>,
        epsilon: FloatType,
    ) -> Ray {
        Ray::with_epsilon(self.eye, self.film_direction(film, film_size), epsilon)
    }

    /// Uniformly sampled offset from the eye on a lens disk of the given radius,
    /// lying in the plane of the film.
    pub fn sample_lens(&self, radius: FloatType, rng: &mut impl rand::Rng) -> WorldVector {
        let lens_uv: [FloatType; 2] = rand_distr::UnitDisc.sample(rng);
        self.right.as_ref() * (radius * lens_uv[0]) + self.up.as_ref() * (radius * lens_uv[1])
    }
}
