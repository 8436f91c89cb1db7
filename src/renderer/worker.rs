use std::{
    ops::Range,
    sync::atomic::{AtomicUsize, Ordering},
};

use rand::{SeedableRng, rngs::SmallRng};

use crate::{
    geometry::{ScreenBlock, ScreenPoint, ScreenSize},
    renderer::sampler::Sampler,
    util::Rgba,
};

pub struct Worker {
    id: usize,
    rng: SmallRng,
    buffer: Vec<Rgba>,
}

impl Worker {
    /// Workers sharing a seed still draw different sequences, the seed is mixed with the id.
    pub fn new(worker_id: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed ^ worker_id as u64),
            None => SmallRng::from_os_rng(),
        };
        Self {
            id: worker_id,
            rng,
            buffer: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Renders a chunk of the row major framebuffer of size `resolution`.
    /// Only pixels inside `region` are traced, the rest of the returned buffer keeps
    /// `background`. Pixels whose trace was interrupted by cancellation are also left
    /// at `background` and are not counted in `traced`.
    pub fn render_chunk(
        &mut self,
        sampler: &Sampler,
        resolution: ScreenSize,
        region: &ScreenBlock,
        chunk: Range<usize>,
        background: Rgba,
        traced: &AtomicUsize,
    ) -> &[Rgba] {
        self.buffer.clear();
        self.buffer.resize(chunk.len(), background);

        let width = resolution.x as usize;
        for (slot, index) in self.buffer.iter_mut().zip(chunk) {
            if sampler.is_cancelled() {
                break;
            }

            let pixel = ScreenPoint::new((index % width) as u32, (index / width) as u32);
            if !contains(region, &pixel) {
                continue;
            }

            let color = sampler.sample_pixel(pixel, &mut self.rng);
            if sampler.is_cancelled() {
                break;
            }
            *slot = color;
            traced.fetch_add(1, Ordering::Relaxed);
        }

        &self.buffer
    }
}

fn contains(block: &ScreenBlock, point: &ScreenPoint) -> bool {
    (block.min.x..block.max.x).contains(&point.x) && (block.min.y..block.max.y).contains(&point.y)
}

/// Maps a 0-1 f32 rgba pixel to pixel type compatible with module image.
pub fn color_to_image(color: Rgba) -> image::Rgba<u8> {
    let channel = |value: f32| (value * 255.0).round().clamp(0.0, 255.0) as u8;
    image::Rgba([
        channel(color.r),
        channel(color.g),
        channel(color.b),
        channel(color.a),
    ])
}
