mod accelerator;
mod camera;
pub mod geometry;
mod renderer;
pub mod scene;
mod util;

pub use crate::accelerator::{Accelerator, AcceleratorKind, GridStatistics, UniformGrid};
pub use crate::renderer::{
    AntiAliasing, DepthOfField, RenderProgress, RenderSettings, RenderStatistics, SettingsError,
    Shadows, render,
};
pub use camera::{Camera, CameraError};
pub use scene::{Light, Material, Scene};
pub use util::{Rgba, Stats};
