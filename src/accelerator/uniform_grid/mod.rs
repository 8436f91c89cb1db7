mod building;
mod ray_grid_traversal;
mod statistics;

use nalgebra::Vector3;

use crate::{
    geometry::{WorldBox, WorldPoint},
    scene::ObjectIdx,
};

pub use statistics::GridStatistics;

/// Upper limit of cells along a single axis
const MAX_CELLS_PER_AXIS: usize = 256;

/// Regular subdivision of the scene bounding box into cells, each listing the objects
/// whose bounding box overlaps it. Objects without a bounding box are kept aside and
/// tested against every ray.
#[derive(Clone, Debug)]
pub struct UniformGrid {
    /// None if there are no bounded objects, in that case there are no cells either
    bounds: Option<WorldBox>,
    cell_counts: Vector3<usize>,
    /// Cells in x-major order, x changes fastest
    cells: Vec<Vec<ObjectIdx>>,
    boundless: Vec<ObjectIdx>,
}

impl UniformGrid {
    pub fn bounds(&self) -> Option<&WorldBox> {
        self.bounds.as_ref()
    }

    pub fn cell_counts(&self) -> Vector3<usize> {
        self.cell_counts
    }

    fn cell_index(&self, cell: &Vector3<usize>) -> usize {
        cell.x + self.cell_counts.x * (cell.y + self.cell_counts.y * cell.z)
    }

    /// Coordinates of the cell containing the point, clamped to the grid.
    fn cell_of(&self, bounds: &WorldBox, point: &WorldPoint) -> Vector3<usize> {
        let size = bounds.size();
        Vector3::from_fn(|i, _| {
            let count = self.cell_counts[i];
            let relative = (point[i] - bounds.min[i]) / size[i];
            let cell = (relative * count as f32).floor();
            if cell.is_nan() || cell < 0.0 {
                0
            } else {
                (cell as usize).min(count - 1)
            }
        })
    }
}
