use index_vec::IndexSlice;
use nalgebra::Vector3;

use crate::{
    accelerator::hit_each,
    geometry::{FloatType, HitRecord, Ray, RayIntersectionExt as _, WorldBox},
    scene::{Object, ObjectIdx},
};

use super::UniformGrid;

impl UniformGrid {
    /// Finds the nearest hit closer than `hit.t`, walking the cells along the ray
    /// and then testing all boundless objects.
    pub fn hit<O: Object>(
        &self,
        objects: &IndexSlice<ObjectIdx, [O]>,
        ray: &mut Ray,
        hit: &mut HitRecord,
    ) -> bool {
        let mut found = false;
        if let Some(bounds) = &self.bounds {
            found |= self.traverse(bounds, objects, ray, hit);
        }
        found |= hit_each(objects, self.boundless.iter().copied(), ray, hit);
        found
    }

    /// 3D-DDA walk through the cells pierced by the ray.
    fn traverse<O: Object>(
        &self,
        bounds: &WorldBox,
        objects: &IndexSlice<ObjectIdx, [O]>,
        ray: &mut Ray,
        hit: &mut HitRecord,
    ) -> bool {
        let Some(slab) = bounds.intersect(ray) else {
            return false;
        };

        let start = if bounds.contains(&ray.origin) {
            ray.origin
        } else {
            ray.point_at(slab.entry)
        };
        let start_cell = self.cell_of(bounds, &start);

        let mut cell = start_cell.map(|x| x as isize);
        let mut next = Vector3::<FloatType>::repeat(FloatType::INFINITY);
        let mut delta = Vector3::<FloatType>::zeros();
        let mut step = Vector3::<isize>::zeros();
        let mut stop = Vector3::<isize>::repeat(-1);

        for axis in 0..3 {
            let count = self.cell_counts[axis];
            let direction = ray.direction[axis];
            if direction == 0.0 {
                continue;
            }

            delta[axis] = (slab.t_max[axis] - slab.t_min[axis]) / count as FloatType;
            if direction > 0.0 {
                next[axis] = slab.t_min[axis] + (start_cell[axis] + 1) as FloatType * delta[axis];
                step[axis] = 1;
                stop[axis] = count as isize;
            } else {
                next[axis] =
                    slab.t_min[axis] + (count - start_cell[axis]) as FloatType * delta[axis];
                step[axis] = -1;
            }
        }

        let mut found = false;
        loop {
            let current = cell.map(|x| x as usize);
            let cell_objects = &self.cells[self.cell_index(&current)];
            found |= hit_each(objects, cell_objects.iter().copied(), ray, hit);

            // Ties go to the later axis
            let axis = if next.x < next.y && next.x < next.z {
                0
            } else if next.y < next.z {
                1
            } else {
                2
            };

            if hit.t < next[axis] {
                break;
            }

            cell[axis] += step[axis];
            if step[axis] == 0 || cell[axis] == stop[axis] {
                break;
            }
            next[axis] += delta[axis];
        }

        found
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::{WorldPoint, WorldVector},
        scene::{Plane, Shape, Sphere},
    };
    use assert2::{assert, let_assert};
    use index_vec::IndexVec;
    use test_case::test_case;

    /// Row of unit spheres along the x axis, 4 units apart.
    fn row_of_spheres() -> IndexVec<ObjectIdx, Shape> {
        (0..8)
            .map(|i| Sphere::new(WorldPoint::new(4.0 * i as FloatType, 0.0, 0.0), 1.0).into())
            .collect()
    }

    #[test_case(-5.0, 1.0, 0 ; "from_left")]
    #[test_case(40.0, -1.0, 7 ; "from_right")]
    #[test_case(10.0, 1.0, 3 ; "from_inside_grid")]
    #[test_case(10.0, -1.0, 2 ; "from_inside_grid_backwards")]
    fn nearest_along_axis(origin_x: FloatType, direction_x: FloatType, expected: usize) {
        let objects = row_of_spheres();
        let grid = UniformGrid::build(&objects, 2.0, 1e-4);

        let mut ray = Ray::new(
            WorldPoint::new(origin_x, 0.0, 0.0),
            WorldVector::new(direction_x, 0.0, 0.0),
        );
        let mut hit = HitRecord::default();
        assert!(grid.hit(&objects, &mut ray, &mut hit));
        assert!(hit.object == Some(ObjectIdx::from_usize(expected)));

        let expected_x = 4.0 * expected as FloatType - direction_x;
        assert!((hit.point.x - expected_x).abs() < 1e-3);
    }

    #[test]
    fn ray_missing_grid_still_hits_boundless() {
        let mut objects = row_of_spheres();
        let_assert!(
            Some(floor) = Plane::from_points(
                WorldPoint::new(0.0, -5.0, 0.0),
                WorldPoint::new(0.0, -5.0, 1.0),
                WorldPoint::new(1.0, -5.0, 0.0),
            )
        );
        let floor_index = objects.push(floor.into());
        let grid = UniformGrid::build(&objects, 2.0, 1e-4);

        let mut ray = Ray::new(WorldPoint::new(0.0, 10.0, 10.0), -WorldVector::y());
        let mut hit = HitRecord::default();
        assert!(grid.hit(&objects, &mut ray, &mut hit));
        assert!(hit.object == Some(floor_index));
        assert!((hit.t - 15.0).abs() < 1e-3);
    }

    #[test]
    fn boundless_object_in_front_of_grid() {
        let mut objects = row_of_spheres();
        let_assert!(
            Some(wall) = Plane::from_points(
                WorldPoint::new(-3.0, 0.0, 0.0),
                WorldPoint::new(-3.0, 1.0, 0.0),
                WorldPoint::new(-3.0, 0.0, 1.0),
            )
        );
        let wall_index = objects.push(wall.into());
        let grid = UniformGrid::build(&objects, 2.0, 1e-4);

        let mut ray = Ray::new(WorldPoint::new(-5.0, 0.0, 0.0), WorldVector::x());
        let mut hit = HitRecord::default();
        assert!(grid.hit(&objects, &mut ray, &mut hit));
        assert!(hit.object == Some(wall_index));
    }

    #[test]
    fn diagonal_ray_through_cell_corners() {
        // Equal x and y extents, so the ray crosses x and y boundaries at the same t
        let objects: IndexVec<ObjectIdx, Shape> = (0..6)
            .map(|i| {
                let c = 4.0 * i as FloatType;
                Sphere::new(WorldPoint::new(c, c, 0.0), 1.0).into()
            })
            .collect();
        let grid = UniformGrid::build(&objects, 2.0, 1e-4);
        assert!(grid.cell_counts().x == grid.cell_counts().y);

        for (origin, expected) in [(-5.0, 0), (10.0, 3)] {
            let mut ray = Ray::new(
                WorldPoint::new(origin, origin, 0.0),
                WorldVector::new(1.0, 1.0, 0.0),
            );
            let mut hit = HitRecord::default();
            assert!(grid.hit(&objects, &mut ray, &mut hit));
            assert!(hit.object == Some(ObjectIdx::from_usize(expected)));

            let mut brute_ray = Ray::new(
                WorldPoint::new(origin, origin, 0.0),
                WorldVector::new(1.0, 1.0, 0.0),
            );
            let mut brute_hit = HitRecord::default();
            assert!(hit_each(&objects, objects.indices(), &mut brute_ray, &mut brute_hit));
            assert!(brute_hit.object == hit.object);
            assert!(brute_hit.t == hit.t);
        }
    }

    #[test]
    fn passing_between_objects() {
        let objects = row_of_spheres();
        let grid = UniformGrid::build(&objects, 2.0, 1e-4);

        let mut ray = Ray::new(WorldPoint::new(2.0, 10.0, 0.0), -WorldVector::y());
        let mut hit = HitRecord::default();
        assert!(!grid.hit(&objects, &mut ray, &mut hit));
        assert!(hit.object.is_none());
        assert!(ray.t == FloatType::INFINITY);
    }
}
