mod uniform_grid;

use index_vec::IndexSlice;

use crate::{
    geometry::{FloatType, HitRecord, Ray},
    scene::{Object, ObjectIdx},
};

pub use uniform_grid::{GridStatistics, UniformGrid};

/// Which spatial index to build over the scene objects.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AcceleratorKind {
    /// Test every object for every ray
    BruteForce,
    /// Uniform grid with roughly `density` cells per axis per object
    UniformGrid { density: FloatType },
}

impl Default for AcceleratorKind {
    fn default() -> Self {
        AcceleratorKind::UniformGrid { density: 2.0 }
    }
}

/// Spatial index over scene objects. Refers to objects by their index only,
/// the object list itself is passed to every query.
#[derive(Clone, Debug)]
pub enum Accelerator {
    BruteForce,
    UniformGrid(UniformGrid),
}

impl Accelerator {
    pub fn build<O: Object>(
        kind: AcceleratorKind,
        objects: &IndexSlice<ObjectIdx, [O]>,
        epsilon: FloatType,
    ) -> Accelerator {
        match kind {
            AcceleratorKind::BruteForce => Accelerator::BruteForce,
            AcceleratorKind::UniformGrid { density } => {
                let grid = UniformGrid::build(objects, density, epsilon);
                log::debug!("Uniform grid: {}", grid.statistics());
                Accelerator::UniformGrid(grid)
            }
        }
    }

    /// Finds the nearest hit closer than `hit.t`.
    /// Updates the hit record (including the object index) and returns true if there is one.
    pub fn hit<O: Object>(
        &self,
        objects: &IndexSlice<ObjectIdx, [O]>,
        ray: &mut Ray,
        hit: &mut HitRecord,
    ) -> bool {
        match self {
            Accelerator::BruteForce => hit_each(objects, objects.indices(), ray, hit),
            Accelerator::UniformGrid(grid) => grid.hit(objects, ray, hit),
        }
    }
}

/// Intersects all listed objects, keeping the closest hit.
fn hit_each<O: Object>(
    objects: &IndexSlice<ObjectIdx, [O]>,
    indices: impl IntoIterator<Item = ObjectIdx>,
    ray: &mut Ray,
    hit: &mut HitRecord,
) -> bool {
    let mut found = false;
    for index in indices {
        if objects[index].intersect(ray, hit) {
            hit.object = Some(index);
            found = true;
        }
    }
    found
}
