use std::fmt::Display;

use nalgebra::Vector3;

use crate::util::Stats;

use super::UniformGrid;

/// Occupancy summary of a built grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GridStatistics {
    pub cell_counts: Vector3<usize>,
    pub total_cells: usize,
    pub empty_cells: usize,
    pub objects_per_cell: Stats,
    pub boundless_objects: usize,
}

impl UniformGrid {
    pub fn statistics(&self) -> GridStatistics {
        GridStatistics {
            cell_counts: self.cell_counts,
            total_cells: self.cells.len(),
            empty_cells: self.cells.iter().filter(|cell| cell.is_empty()).count(),
            objects_per_cell: self.cells.iter().map(|cell| cell.len()).collect(),
            boundless_objects: self.boundless.len(),
        }
    }
}

impl Display for GridStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}x{} cells ({} empty); objects per cell: {}; {} boundless",
            self.cell_counts.x,
            self.cell_counts.y,
            self.cell_counts.z,
            self.empty_cells,
            self.objects_per_cell,
            self.boundless_objects
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::WorldPoint,
        scene::{ObjectIdx, Plane, Shape, Sphere},
    };
    use assert2::{assert, let_assert};
    use index_vec::IndexVec;

    #[test]
    fn two_spheres_and_a_plane() {
        let_assert!(
            Some(plane) = Plane::from_points(
                WorldPoint::new(0.0, -5.0, 0.0),
                WorldPoint::new(0.0, -5.0, 1.0),
                WorldPoint::new(1.0, -5.0, 0.0),
            )
        );
        let objects: IndexVec<ObjectIdx, Shape> = IndexVec::from_vec(vec![
            Sphere::new(WorldPoint::new(0.0, 0.0, 0.0), 1.0).into(),
            Sphere::new(WorldPoint::new(10.0, 0.0, 0.0), 1.0).into(),
            plane.into(),
        ]);
        let stats = UniformGrid::build(&objects, 2.0, 1e-4).statistics();

        assert!(stats.cell_counts == Vector3::new(9, 2, 2));
        assert!(stats.total_cells == 36);
        // Each sphere covers two columns of four cells
        assert!(stats.empty_cells == 36 - 16);
        assert!(stats.objects_per_cell.max == 1);
        assert!(stats.objects_per_cell.min == 0);
        assert!(stats.boundless_objects == 1);

        let text = stats.to_string();
        assert!(text.starts_with("9x2x2 cells (20 empty)"));
        assert!(text.ends_with("1 boundless"));
    }

    #[test]
    fn empty_grid() {
        let objects: IndexVec<ObjectIdx, Shape> = IndexVec::new();
        let stats = UniformGrid::build(&objects, 2.0, 1e-4).statistics();

        assert!(stats.total_cells == 0);
        assert!(stats.objects_per_cell.is_empty());
        assert!(stats.to_string() == "0x0x0 cells (0 empty); objects per cell: no samples; 0 boundless");
    }
}
