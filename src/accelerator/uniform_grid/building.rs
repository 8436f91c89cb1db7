use index_vec::IndexSlice;
use nalgebra::Vector3;

use crate::{
    geometry::{FloatType, WorldBox},
    scene::{Object, ObjectIdx},
};

use super::{MAX_CELLS_PER_AXIS, UniformGrid};

impl UniformGrid {
    /// Builds the grid over all objects.
    /// `density` scales the number of cells along each axis, boxes of the objects
    /// are padded by `epsilon` before insertion.
    pub fn build<O: Object>(
        objects: &IndexSlice<ObjectIdx, [O]>,
        density: FloatType,
        epsilon: FloatType,
    ) -> UniformGrid {
        let mut bounded = Vec::new();
        let mut boundless = Vec::new();

        for (index, object) in objects.iter_enumerated() {
            match object.get_bounding_box() {
                Some(b) if is_finite(&b) => bounded.push((index, b.padded(epsilon))),
                _ => boundless.push(index),
            }
        }

        let Some(bounds) = bounded
            .iter()
            .map(|(_, b)| b.clone())
            .reduce(|a, b| a.union(&b))
        else {
            return UniformGrid {
                bounds: None,
                cell_counts: Vector3::zeros(),
                cells: Vec::new(),
                boundless,
            };
        };

        let cell_counts = cell_counts(&bounds, bounded.len(), density);

        let mut grid = UniformGrid {
            bounds: None,
            cell_counts,
            cells: vec![Vec::new(); cell_counts.product()],
            boundless,
        };

        for (index, object_box) in &bounded {
            let lo = grid.cell_of(&bounds, &object_box.min);
            let hi = grid.cell_of(&bounds, &object_box.max);
            for z in lo.z..=hi.z {
                for y in lo.y..=hi.y {
                    for x in lo.x..=hi.x {
                        let cell = grid.cell_index(&Vector3::new(x, y, z));
                        grid.cells[cell].push(*index);
                    }
                }
            }
        }

        grid.bounds = Some(bounds);
        grid
    }
}

fn is_finite(b: &WorldBox) -> bool {
    b.min.iter().chain(b.max.iter()).all(|x| x.is_finite())
}

/// Number of cells along each axis, proportional to the extent of the box
/// along that axis, so that cells are roughly cubical.
fn cell_counts(bounds: &WorldBox, object_count: usize, density: FloatType) -> Vector3<usize> {
    let size = bounds.size();
    let cell_size = (bounds.volume() / object_count as FloatType).cbrt();

    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Vector3::repeat(1);
    }

    size.map(|extent| {
        let count = (density * extent / cell_size).floor() + 1.0;
        if count.is_finite() {
            (count as usize).clamp(1, MAX_CELLS_PER_AXIS)
        } else {
            1
        }
    })
}
