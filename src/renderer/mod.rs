mod integrator;
mod machinery;
mod sampler;
mod worker;

use std::num::{NonZeroU32, NonZeroUsize};

use crate::{
    accelerator::AcceleratorKind,
    geometry::{EPSILON, FloatType, ScreenBlock, ScreenSize},
};

pub use crate::renderer::machinery::{RenderProgress, RenderStatistics, render};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AntiAliasing {
    /// One ray through the pixel center
    None,
    /// `n`×`n` samples at sub-pixel centers
    Regular { n: NonZeroU32 },
    /// Corner samples, subdividing while they differ by more than `threshold`,
    /// down to 1/`n` of a pixel
    Adaptive { n: NonZeroU32, threshold: f32 },
    /// `n`×`n` sub-pixel cells with one jittered sample each
    Stochastic { n: NonZeroU32 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shadows {
    /// Single shadow ray toward the light center
    Hard,
    /// Shadow rays toward `samples` random points of the light
    Soft { samples: NonZeroU32 },
}

impl Shadows {
    pub fn sample_count(&self) -> u32 {
        match self {
            Shadows::Hard => 1,
            Shadows::Soft { samples } => samples.get(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DepthOfField {
    /// Lens radius is `0.5 / aperture`
    pub aperture: FloatType,
    /// Distance along the primary ray that stays in focus
    pub focal_distance: FloatType,
    pub samples: NonZeroU32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// Output resolution, overrides the scene's resolution when set
    pub resolution: Option<ScreenSize>,
    /// Side of the square of output pixels covered by one traced pixel
    pub block_size: NonZeroU32,
    pub max_depth: u32,
    pub anti_aliasing: AntiAliasing,
    pub shadows: Shadows,
    pub accelerator: AcceleratorKind,
    pub depth_of_field: Option<DepthOfField>,
    /// Defaults to the number of CPUs
    pub thread_count: Option<NonZeroUsize>,
    /// Part of the output image to render, in output pixels. Everything else keeps
    /// the background color.
    pub region: Option<ScreenBlock>,
    /// When false, hits are shaded with their diffuse color only
    pub lighting: bool,
    pub epsilon: FloatType,
    /// Seed for the per worker random generators, random when not set
    pub seed: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            resolution: None,
            block_size: NonZeroU32::MIN,
            max_depth: 2,
            anti_aliasing: AntiAliasing::None,
            shadows: Shadows::Hard,
            accelerator: AcceleratorKind::default(),
            depth_of_field: None,
            thread_count: None,
            region: None,
            lighting: true,
            epsilon: EPSILON,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum SettingsError {
    #[error("epsilon must be a positive finite number, got {0}")]
    Epsilon(FloatType),
    #[error("grid density must be a positive finite number, got {0}")]
    GridDensity(FloatType),
    #[error("aperture must be a positive finite number, got {0}")]
    Aperture(FloatType),
    #[error("focal distance must be a positive finite number, got {0}")]
    FocalDistance(FloatType),
    #[error("adaptive threshold must be a non-negative finite number, got {0}")]
    Threshold(f32),
    #[error("render region {0:?} is empty")]
    EmptyRegion(ScreenBlock),
}

fn positive_finite(value: FloatType) -> bool {
    value.is_finite() && value > 0.0
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !positive_finite(self.epsilon) {
            return Err(SettingsError::Epsilon(self.epsilon));
        }
        if let AcceleratorKind::UniformGrid { density } = self.accelerator {
            if !positive_finite(density) {
                return Err(SettingsError::GridDensity(density));
            }
        }
        if let Some(dof) = &self.depth_of_field {
            if !positive_finite(dof.aperture) {
                return Err(SettingsError::Aperture(dof.aperture));
            }
            if !positive_finite(dof.focal_distance) {
                return Err(SettingsError::FocalDistance(dof.focal_distance));
            }
        }
        if let AntiAliasing::Adaptive { threshold, .. } = self.anti_aliasing {
            if !(threshold.is_finite() && threshold >= 0.0) {
                return Err(SettingsError::Threshold(threshold));
            }
        }
        if let Some(region) = &self.region {
            if region.min.x >= region.max.x || region.min.y >= region.max.y {
                return Err(SettingsError::EmptyRegion(region.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::ScreenPoint;
    use assert2::assert;
    use test_case::test_case;

    fn with_dof(aperture: FloatType, focal_distance: FloatType) -> RenderSettings {
        RenderSettings {
            depth_of_field: Some(DepthOfField {
                aperture,
                focal_distance,
                samples: NonZeroU32::MIN,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let settings = RenderSettings::default();
        assert!(settings.block_size.get() == 1);
        assert!(settings.max_depth == 2);
        assert!(settings.anti_aliasing == AntiAliasing::None);
        assert!(settings.shadows == Shadows::Hard);
        assert!(settings.accelerator == AcceleratorKind::UniformGrid { density: 2.0 });
        assert!(settings.depth_of_field.is_none());
        assert!(settings.lighting);
        assert!(settings.epsilon == 1e-4);
        assert!(settings.validate() == Ok(()));
    }

    #[test_case(
        RenderSettings { epsilon: 0.0, ..Default::default() }
        => Err(SettingsError::Epsilon(0.0)) ; "zero_epsilon")]
    #[test_case(
        RenderSettings { accelerator: AcceleratorKind::UniformGrid { density: -1.0 }, ..Default::default() }
        => Err(SettingsError::GridDensity(-1.0)) ; "negative_density")]
    #[test_case(
        RenderSettings { accelerator: AcceleratorKind::BruteForce, ..Default::default() }
        => Ok(()) ; "brute_force")]
    #[test_case(with_dof(0.0, 1.0) => Err(SettingsError::Aperture(0.0)) ; "zero_aperture")]
    #[test_case(
        with_dof(1.0, FloatType::INFINITY)
        => Err(SettingsError::FocalDistance(FloatType::INFINITY)) ; "infinite_focus")]
    #[test_case(with_dof(2.0, 5.0) => Ok(()) ; "valid_dof")]
    #[test_case(
        RenderSettings {
            anti_aliasing: AntiAliasing::Adaptive { n: NonZeroU32::MIN, threshold: -0.5 },
            ..Default::default()
        }
        => Err(SettingsError::Threshold(-0.5)) ; "negative_threshold")]
    #[test_case(
        RenderSettings {
            region: Some(ScreenBlock::new(ScreenPoint::new(5, 5), ScreenPoint::new(5, 10))),
            ..Default::default()
        }
        => Err(SettingsError::EmptyRegion(ScreenBlock::new(ScreenPoint::new(5, 5), ScreenPoint::new(5, 10))))
        ; "empty_region")]
    fn validation(settings: RenderSettings) -> Result<(), SettingsError> {
        settings.validate()
    }

    #[test]
    fn shadow_sample_count() {
        assert!(Shadows::Hard.sample_count() == 1);
        assert!(
            Shadows::Soft {
                samples: NonZeroU32::new(16).unwrap()
            }
            .sample_count()
                == 16
        );
    }
}
