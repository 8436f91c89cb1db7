use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use whitted::{
    AcceleratorKind, AntiAliasing, Camera, DepthOfField, Light, Material, RenderSettings, Rgba,
    Scene, Shadows,
    geometry::{EPSILON, ScreenBlock, ScreenPoint, ScreenSize, WorldPoint},
    render,
    scene::{Plane, Polygon, Sphere},
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AntiAliasingMode {
    None,
    Regular,
    Adaptive,
    Stochastic,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AcceleratorMode {
    Grid,
    BruteForce,
}

/// Renders a built-in demo scene into a PNG file.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Width of the rendered image
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Height of the rendered image
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Side of the square of image pixels sharing one traced sample
    #[arg(long, default_value_t = NonZeroU32::MIN)]
    block_size: NonZeroU32,

    /// Maximum number of reflection and refraction bounces
    #[arg(short = 'd', long, default_value_t = 3)]
    max_depth: u32,

    #[arg(long, value_enum, default_value_t = AntiAliasingMode::None)]
    anti_aliasing: AntiAliasingMode,

    /// Sub-samples per pixel side for anti aliasing
    #[arg(short = 'n', long, default_value = "2")]
    aa_samples: NonZeroU32,

    /// Color difference that triggers adaptive subdivision
    #[arg(long, default_value_t = 0.3)]
    threshold: f32,

    /// Shadow rays per light, hard shadows when not set
    #[arg(long)]
    soft_shadows: Option<NonZeroU32>,

    #[arg(long, value_enum, default_value_t = AcceleratorMode::Grid)]
    accelerator: AcceleratorMode,

    /// Grid cells per axis per object
    #[arg(long, default_value_t = 2.0)]
    grid_density: f32,

    /// Enables depth of field with this aperture
    #[arg(long)]
    aperture: Option<f32>,

    #[arg(long, default_value_t = 12.0)]
    focal_distance: f32,

    #[arg(long, default_value = "8")]
    lens_samples: NonZeroU32,

    /// Number of worker threads, all CPUs when not set
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Seed for repeatable renders
    #[arg(long)]
    seed: Option<u64>,

    /// Shade with the diffuse color only
    #[arg(long)]
    no_lighting: bool,

    /// Only render the pixels in `x0,y0,x1,y1`, x1 and y1 exclusive.
    /// The rest of the image keeps the background color.
    #[arg(long, value_parser = parse_region)]
    region: Option<ScreenBlock>,

    /// Offset of secondary ray origins from surfaces
    #[arg(long, default_value_t = EPSILON)]
    epsilon: f32,

    #[arg(short = 'o', long, default_value = "render.png")]
    output: PathBuf,
}

impl Args {
    fn settings(&self) -> RenderSettings {
        let n = self.aa_samples;
        RenderSettings {
            block_size: self.block_size,
            max_depth: self.max_depth,
            anti_aliasing: match self.anti_aliasing {
                AntiAliasingMode::None => AntiAliasing::None,
                AntiAliasingMode::Regular => AntiAliasing::Regular { n },
                AntiAliasingMode::Adaptive => AntiAliasing::Adaptive {
                    n,
                    threshold: self.threshold,
                },
                AntiAliasingMode::Stochastic => AntiAliasing::Stochastic { n },
            },
            shadows: match self.soft_shadows {
                Some(samples) => Shadows::Soft { samples },
                None => Shadows::Hard,
            },
            accelerator: match self.accelerator {
                AcceleratorMode::Grid => AcceleratorKind::UniformGrid {
                    density: self.grid_density,
                },
                AcceleratorMode::BruteForce => AcceleratorKind::BruteForce,
            },
            depth_of_field: self.aperture.map(|aperture| DepthOfField {
                aperture,
                focal_distance: self.focal_distance,
                samples: self.lens_samples,
            }),
            thread_count: self.threads,
            lighting: !self.no_lighting,
            seed: self.seed,
            region: self.region.clone(),
            epsilon: self.epsilon,
            ..Default::default()
        }
    }
}

fn parse_region(value: &str) -> Result<ScreenBlock, String> {
    let coordinates = value
        .split(',')
        .map(|part| part.trim().parse::<u32>().map_err(|e| format!("{part:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    let [x0, y0, x1, y1] = coordinates[..] else {
        return Err(format!("expected x0,y0,x1,y1, got {} values", coordinates.len()));
    };
    if x0 >= x1 || y0 >= y1 {
        return Err(format!("region {value} is empty"));
    }
    Ok(ScreenBlock::new(ScreenPoint::new(x0, y0), ScreenPoint::new(x1, y1)))
}

/// Spheres on a floor in front of a mirror wall.
fn demo_scene(resolution: ScreenSize) -> anyhow::Result<Scene> {
    let camera = Camera::builder()
        .eye(WorldPoint::new(0.0, 3.0, 12.0))
        .at(WorldPoint::new(0.0, 1.0, 0.0))
        .fov(45.0)
        .build()?;

    let mut scene = Scene::new(camera, resolution);
    scene.background = Rgba::new(0.05, 0.07, 0.12, 1.0);

    let floor = Plane::from_points(
        WorldPoint::new(0.0, 0.0, 0.0),
        WorldPoint::new(0.0, 0.0, 1.0),
        WorldPoint::new(1.0, 0.0, 0.0),
    )
    .context("Degenerate floor plane")?;
    scene.add_object(
        floor,
        Material {
            color: Rgba::new(0.8, 0.8, 0.7, 1.0),
            ks: 0.1,
            shininess: 50.0,
            ..Default::default()
        },
    );

    scene.add_object(
        Polygon::new(vec![
            WorldPoint::new(-6.0, 0.0, -5.0),
            WorldPoint::new(6.0, 0.0, -5.0),
            WorldPoint::new(-6.0, 6.0, -5.0),
            WorldPoint::new(6.0, 6.0, -5.0),
        ]),
        Material {
            color: Rgba::new(0.2, 0.2, 0.25, 1.0),
            kd: 0.3,
            ks: 0.7,
            shininess: 200.0,
            ..Default::default()
        },
    );

    scene.add_object(
        Sphere::new(WorldPoint::new(-2.5, 1.0, 0.0), 1.0),
        Material {
            color: Rgba::new(0.9, 0.2, 0.2, 1.0),
            kd: 0.8,
            ks: 0.3,
            shininess: 30.0,
            ..Default::default()
        },
    );
    scene.add_object(
        Sphere::new(WorldPoint::new(0.0, 1.2, 1.5), 1.2),
        Material {
            color: Rgba::new(1.0, 1.0, 1.0, 1.0),
            kd: 0.05,
            ks: 0.2,
            shininess: 300.0,
            transmission: 0.8,
            refractive_index: 1.5,
        },
    );
    scene.add_object(
        Sphere::new(WorldPoint::new(2.5, 1.0, -1.0), 1.0),
        Material {
            color: Rgba::new(0.2, 0.4, 0.9, 1.0),
            kd: 0.6,
            ks: 0.5,
            shininess: 80.0,
            ..Default::default()
        },
    );
    for i in 0..8 {
        let angle = i as f32 * std::f32::consts::TAU / 8.0;
        scene.add_object(
            Sphere::new(WorldPoint::new(4.0 * angle.cos(), 0.3, 4.0 * angle.sin()), 0.3),
            Material {
                color: Rgba::new(0.3, 0.8, 0.3, 1.0),
                ..Default::default()
            },
        );
    }

    scene.add_light(Light::new(WorldPoint::new(-5.0, 8.0, 8.0)));
    scene.add_light(Light {
        color: Rgba::new(0.4, 0.4, 0.5, 1.0),
        radius: 1.0,
        ..Light::new(WorldPoint::new(6.0, 5.0, 4.0))
    });

    Ok(scene)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let scene = demo_scene(ScreenSize::new(args.width, args.height))?;
    let settings = args.settings();

    let bar = ProgressBar::no_length();
    bar.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} pixels {eta_precise}",
        )?,
    );
    let mut render_progress = render(scene, settings, |_| {}, {
        let bar = bar.clone();
        move |_, statistics| {
            bar.update(|state| {
                state.set_len(statistics.total_pixels as u64);
                state.set_pos(statistics.traced_pixels as u64)
            })
        }
    })?;
    bar.set_length(render_progress.progress().1 as u64);

    render_progress.wait()?;
    bar.finish();

    let statistics = render_progress.statistics();
    println!(
        "{} pixels, {} rays in {:.2?} ({:.0} rays/s)",
        statistics.traced_pixels,
        statistics.rays,
        statistics.elapsed,
        statistics.rays as f64 / statistics.elapsed.as_secs_f64().max(1e-9)
    );

    render_progress
        .to_image()
        .save(&args.output)
        .with_context(|| format!("Saving the image to {}", args.output.display()))?;

    Ok(())
}
