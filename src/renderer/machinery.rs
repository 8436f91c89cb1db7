use std::{
    ops::Range,
    sync::{
        Arc, Mutex, OnceLock, PoisonError,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::anyhow;
use image::RgbaImage;

use crate::{
    accelerator::Accelerator,
    geometry::{ScreenBlock, ScreenPoint, ScreenSize},
    renderer::{
        RenderSettings,
        integrator::Integrator,
        sampler::Sampler,
        worker::{Worker, color_to_image},
    },
    scene::Scene,
    util::Rgba,
};

/// Snapshot of the counters of a running or finished render.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderStatistics {
    pub traced_pixels: usize,
    pub total_pixels: usize,
    /// Primary, shadow, reflected and refracted rays cast so far
    pub rays: u64,
    /// Stops growing once the last worker exits
    pub elapsed: Duration,
}

/// Starts rendering the scene on a pool of worker threads and returns immediately.
///
/// The callbacks are called from the worker threads with the range of framebuffer
/// indices of each chunk, before it is started and after it is finished.
pub fn render<
    F1: Fn(Range<usize>) + Send + Sync + 'static,
    F2: Fn(Range<usize>, RenderStatistics) + Send + Sync + 'static,
>(
    scene: Scene,
    settings: RenderSettings,
    started_chunk_callback: F1,
    finished_chunk_callback: F2,
) -> anyhow::Result<RenderProgress> {
    settings.validate()?;

    let output_resolution = settings.resolution.unwrap_or(scene.resolution);
    let block_size = settings.block_size.get();
    let resolution = output_resolution.map(|x| x.div_ceil(block_size));
    let region = logical_region(&settings, output_resolution, resolution);

    let pixel_count = resolution.x as usize * resolution.y as usize;
    if pixel_count == 0 {
        log::warn!("Rendering an empty {}x{} framebuffer", resolution.x, resolution.y);
    }
    if settings.lighting && scene.lights.is_empty() {
        log::warn!("Lighting is enabled but the scene has no lights");
    }

    let thread_count = settings
        .thread_count
        .map_or_else(num_cpus::get, |count| count.get())
        .max(1);
    let chunk_size = (pixel_count / (thread_count * thread_count)).max(1);
    let chunks = (0..pixel_count)
        .step_by(chunk_size)
        .map(|start| Mutex::new(vec![scene.background; chunk_size.min(pixel_count - start)]))
        .collect::<Vec<_>>();

    log::info!(
        "Rendering {}x{} pixels ({}x{} blocks of {}) with {:?} on {} threads",
        output_resolution.x,
        output_resolution.y,
        resolution.x,
        resolution.y,
        block_size,
        settings.accelerator,
        thread_count
    );

    let accelerator = Accelerator::build(settings.accelerator, &scene.objects, settings.epsilon);

    let state = Arc::new(RenderState {
        pixels_to_trace: region.width() as usize * region.height() as usize,
        scene,
        settings,
        accelerator,

        output_resolution,
        resolution,
        region,

        chunk_size,
        chunks,
        next_chunk_index: AtomicUsize::new(0),

        cancelled: AtomicBool::new(false),
        ray_count: AtomicU64::new(0),
        traced_pixels: AtomicUsize::new(0),
        running_workers: AtomicUsize::new(thread_count),
        started: Instant::now(),
        elapsed: OnceLock::new(),
    });
    let started_chunk_callback = Arc::new(started_chunk_callback);
    let finished_chunk_callback = Arc::new(finished_chunk_callback);

    let cores = core_affinity::get_core_ids().unwrap_or_default();

    let threads = (0..thread_count)
        .map(|worker_id| {
            let state = Arc::clone(&state);
            let started_chunk_callback = Arc::clone(&started_chunk_callback);
            let finished_chunk_callback = Arc::clone(&finished_chunk_callback);
            let core = (!cores.is_empty()).then(|| cores[worker_id % cores.len()]);

            thread::Builder::new()
                .name(format!("worker{worker_id}"))
                .spawn(move || {
                    if let Some(core) = core {
                        core_affinity::set_for_current(core);
                    }

                    let _exit = WorkerExit(state.as_ref());
                    let mut worker = Worker::new(worker_id, state.settings.seed);
                    log::debug!("Worker {} started", worker.id());

                    let integrator = Integrator {
                        scene: &state.scene,
                        accelerator: &state.accelerator,
                        settings: &state.settings,
                        cancelled: &state.cancelled,
                        ray_count: &state.ray_count,
                    };
                    let sampler = Sampler::new(&integrator, state.resolution);

                    while let Some((chunk_index, pixels)) = state.get_next_chunk() {
                        (started_chunk_callback)(pixels.clone());

                        let rendered = worker.render_chunk(
                            &sampler,
                            state.resolution,
                            &state.region,
                            pixels.clone(),
                            state.scene.background,
                            &state.traced_pixels,
                        );
                        state.chunks[chunk_index]
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .copy_from_slice(rendered);

                        (finished_chunk_callback)(pixels, state.statistics());
                    }

                    log::debug!("Worker {} finished", worker.id());
                })
        })
        .collect::<Result<Vec<_>, _>>();

    let threads = match threads {
        Ok(threads) => threads,
        Err(error) => {
            // Let the already running workers wind down before reporting
            state.cancelled.store(true, Ordering::Relaxed);
            return Err(error.into());
        }
    };

    Ok(RenderProgress {
        render_state: state,
        threads,
    })
}

/// Output pixel region mapped to the logical pixels whose blocks it touches.
fn logical_region(
    settings: &RenderSettings,
    output_resolution: ScreenSize,
    resolution: ScreenSize,
) -> ScreenBlock {
    let block_size = settings.block_size.get();
    let Some(region) = &settings.region else {
        return ScreenBlock::with_size(ScreenPoint::origin(), &resolution);
    };

    let min = region
        .min
        .coords
        .zip_map(&output_resolution, |x, limit| x.min(limit) / block_size);
    let max = region
        .max
        .coords
        .zip_map(&output_resolution, |x, limit| x.min(limit).div_ceil(block_size));
    ScreenBlock::new(min.into(), max.sup(&min).into())
}

/// Handle to a render running in the background.
pub struct RenderProgress {
    render_state: Arc<RenderState>,
    threads: Vec<JoinHandle<()>>,
}

impl RenderProgress {
    /// Return number of traced and total pixels.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.render_state.pixels_to_trace;
        let traced = self
            .render_state
            .traced_pixels
            .load(Ordering::Relaxed)
            .min(total);
        (traced, total)
    }

    /// Finished fraction in 0-1, 1 for an empty render.
    pub fn progress_fraction(&self) -> f32 {
        let (traced, total) = self.progress();
        if total == 0 {
            1.0
        } else {
            traced as f32 / total as f32
        }
    }

    pub fn statistics(&self) -> RenderStatistics {
        self.render_state.statistics()
    }

    pub fn is_finished(&self) -> bool {
        self.threads.iter().all(|handle| handle.is_finished())
    }

    /// Signal the workers to abort.
    /// Traces in flight return right away, pixels that were not finished keep the
    /// background color.
    pub fn abort(&self) {
        self.render_state.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.render_state.cancelled.load(Ordering::Relaxed)
    }

    /// Wait for the workers to finish.
    pub fn wait(&mut self) -> anyhow::Result<()> {
        let panicked = self
            .threads
            .drain(..)
            .map(|handle| handle.join())
            .filter(Result::is_err)
            .count();
        if panicked > 0 {
            return Err(anyhow!("{panicked} worker thread(s) panicked"));
        }

        let statistics = self.statistics();
        log::info!(
            "Rendered {} of {} pixels with {} rays in {:.2?}",
            statistics.traced_pixels,
            statistics.total_pixels,
            statistics.rays,
            statistics.elapsed
        );
        Ok(())
    }

    /// Size of the framebuffer in logical pixels.
    pub fn resolution(&self) -> ScreenSize {
        self.render_state.resolution
    }

    pub fn output_resolution(&self) -> ScreenSize {
        self.render_state.output_resolution
    }

    /// Copy of the current row major framebuffer of logical pixels.
    pub fn framebuffer(&self) -> Vec<Rgba> {
        let mut framebuffer =
            Vec::with_capacity(self.render_state.chunks.len() * self.render_state.chunk_size);
        for chunk in &self.render_state.chunks {
            framebuffer.extend_from_slice(&chunk.lock().unwrap_or_else(PoisonError::into_inner));
        }
        framebuffer
    }

    /// Current framebuffer at the output resolution, every logical pixel expanded
    /// into its block.
    pub fn to_image(&self) -> RgbaImage {
        let framebuffer = self.framebuffer();
        let width = self.render_state.resolution.x;
        let block_size = self.render_state.settings.block_size.get();
        let output = self.render_state.output_resolution;

        RgbaImage::from_fn(output.x, output.y, |x, y| {
            let index = (y / block_size) as usize * width as usize + (x / block_size) as usize;
            color_to_image(framebuffer[index])
        })
    }
}

struct RenderState {
    scene: Scene,
    settings: RenderSettings,
    accelerator: Accelerator,

    output_resolution: ScreenSize,
    /// Logical resolution
    resolution: ScreenSize,
    /// In logical pixels
    region: ScreenBlock,
    pixels_to_trace: usize,

    chunk_size: usize,
    chunks: Vec<Mutex<Vec<Rgba>>>,
    next_chunk_index: AtomicUsize,

    cancelled: AtomicBool,
    ray_count: AtomicU64,
    traced_pixels: AtomicUsize,
    running_workers: AtomicUsize,
    started: Instant,
    elapsed: OnceLock<Duration>,
}

impl RenderState {
    /// Claims the next chunk, returns its index and the framebuffer range it covers.
    fn get_next_chunk(&self) -> Option<(usize, Range<usize>)> {
        if self.cancelled.load(Ordering::Relaxed) {
            return None;
        }
        let id = self.next_chunk_index.fetch_add(1, Ordering::AcqRel);
        if id >= self.chunks.len() {
            return None;
        }
        let pixel_count = self.resolution.x as usize * self.resolution.y as usize;
        let start = id * self.chunk_size;
        Some((id, start..pixel_count.min(start + self.chunk_size)))
    }

    fn statistics(&self) -> RenderStatistics {
        RenderStatistics {
            traced_pixels: self.traced_pixels.load(Ordering::Relaxed),
            total_pixels: self.pixels_to_trace,
            rays: self.ray_count.load(Ordering::Relaxed),
            elapsed: self
                .elapsed
                .get()
                .copied()
                .unwrap_or_else(|| self.started.elapsed()),
        }
    }
}

/// Freezes the elapsed time when the last worker leaves, even by panicking.
struct WorkerExit<'a>(&'a RenderState);

impl Drop for WorkerExit<'_> {
    fn drop(&mut self) {
        if self.0.running_workers.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _ = self.0.elapsed.set(self.0.started.elapsed());
        }
    }
}
